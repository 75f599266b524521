//! Imaging table adapter.
//!
//! The vendor's imaging-table tool writes a CSV with `#` comment lines and a header
//! in which column groups are compressed as `Name<c1;c2;c3>`. This module expands the
//! header, picks out the columns needed for per-tile occupancy, and averages the rows
//! of each tile into a [`TileSummary`].

use std::{collections::BTreeMap, io::Read, path::Path, str::FromStr};

use crate::{io::open_path, InteropError, Result, RunningAverage};

const LANE: &str = "Lane";
const TILE: &str = "Tile";
const CYCLE: &str = "Cycle";
const READ: &str = "Read";
const PERCENT_OCCUPIED: &str = "% Occupied";
const PERCENT_PF: &str = "% Pass Filter";

/// Expands `Name<c1;c2;c3>` groups into `Name c1`, `Name c2`, `Name c3`.
///
/// # Examples
///
/// ```rust
/// use interop::expand_header;
///
/// let columns = expand_header(["Lane", "column1<c1;c2;c3>"]);
/// assert_eq!(columns, vec!["Lane", "column1 c1", "column1 c2", "column1 c3"]);
/// ```
pub fn expand_header<'a, I>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut columns = Vec::new();
    for field in fields {
        let field = field.trim();
        match field
            .strip_suffix('>')
            .and_then(|group| group.split_once('<'))
        {
            Some((name, subs)) => {
                let name = name.trim();
                columns.extend(subs.split(';').map(|sub| format!("{} {}", name, sub.trim())));
            }
            None => columns.push(field.to_string()),
        }
    }
    columns
}

/// One imaging table row, reduced to the columns this crate uses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagingRow {
    pub lane: u16,
    pub tile: u32,
    pub cycle: u16,
    pub read: u16,
    /// `0` when the table has no occupancy column, `NaN` for an empty cell
    pub percent_occupied: f64,
    /// `0` when the table has no pass-filter column, `NaN` for an empty cell
    pub percent_pf: f64,
}

/// Occupancy and pass-filter percentages averaged over a tile's rows.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileSummary {
    pub lane: u16,
    pub tile: u32,
    pub percent_occupied: f64,
    pub percent_pf: f64,
}

/// Column positions resolved from the expanded header.
struct Columns {
    lane: usize,
    tile: usize,
    cycle: usize,
    read: usize,
    percent_occupied: Option<usize>,
    percent_pf: Option<usize>,
}
impl Columns {
    fn resolve(columns: &[String]) -> Result<Self> {
        let find = |name: &str| columns.iter().position(|c| c == name);
        let require =
            |name: &str| find(name).ok_or_else(|| InteropError::MissingRequiredColumn(name.to_string()));
        Ok(Self {
            lane: require(LANE)?,
            tile: require(TILE)?,
            cycle: require(CYCLE)?,
            read: require(READ)?,
            percent_occupied: find(PERCENT_OCCUPIED),
            percent_pf: find(PERCENT_PF),
        })
    }

    fn row(&self, record: &csv::StringRecord) -> Result<ImagingRow> {
        Ok(ImagingRow {
            lane: required(record, self.lane, LANE)?,
            tile: required(record, self.tile, TILE)?,
            cycle: required(record, self.cycle, CYCLE)?,
            read: required(record, self.read, READ)?,
            percent_occupied: optional(record, self.percent_occupied, PERCENT_OCCUPIED)?,
            percent_pf: optional(record, self.percent_pf, PERCENT_PF)?,
        })
    }
}

fn required<T: FromStr>(record: &csv::StringRecord, idx: usize, column: &str) -> Result<T> {
    let value = record
        .get(idx)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| InteropError::MissingRequiredColumn(column.to_string()))?;
    value.parse().map_err(|_| InteropError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn optional(record: &csv::StringRecord, idx: Option<usize>, column: &str) -> Result<f64> {
    let Some(value) = idx.and_then(|idx| record.get(idx)) else {
        return Ok(0.0);
    };
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse().map_err(|_| InteropError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Parsed imaging table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagingTable {
    /// Expanded header
    pub columns: Vec<String>,
    pub rows: Vec<ImagingRow>,
}
impl ImagingTable {
    /// Parses an imaging table from CSV text.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The text has no header line
    /// - The header or a row lacks `Lane`, `Tile`, `Cycle` or `Read`
    /// - A cell cannot be parsed as a number
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = rdr.records();
        let header = records.next().ok_or(InteropError::MissingHeaderLine)??;
        let columns = expand_header(header.iter());
        let layout = Columns::resolve(&columns)?;

        let mut rows = Vec::new();
        for record in records {
            rows.push(layout.row(&record?)?);
        }
        Ok(Self { columns, rows })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(open_path(path)?)
    }

    pub fn tile_summaries(&self) -> Vec<TileSummary> {
        summarize_tiles(&self.rows)
    }
}

/// Averages all rows sharing a `(lane, tile)` key, ordered by key.
///
/// Empty cells are left out of the average.
pub fn summarize_tiles(rows: &[ImagingRow]) -> Vec<TileSummary> {
    let mut tiles: BTreeMap<(u16, u32), (RunningAverage, RunningAverage)> = BTreeMap::new();
    for row in rows {
        let (occupied, pf) = tiles.entry((row.lane, row.tile)).or_default();
        if !row.percent_occupied.is_nan() {
            occupied.push(row.percent_occupied);
        }
        if !row.percent_pf.is_nan() {
            pf.push(row.percent_pf);
        }
    }
    tiles
        .into_iter()
        .map(|((lane, tile), (occupied, pf))| TileSummary {
            lane,
            tile,
            percent_occupied: occupied.average(),
            percent_pf: pf.average(),
        })
        .collect()
}
