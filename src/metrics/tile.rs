//! Tile metrics (`TileMetricsOut.bin`): per-tile cluster counts, density and
//! per-read alignment.
//!
//! Version 2 stores one value per record, tagged with a numeric code; a tile's state
//! is assembled by merging every record sharing its `(lane, tile)` key. Version 3
//! stores a file-level density followed by records tagged `'t'` (tile totals) or
//! `'r'` (per-read alignment).

use std::{collections::BTreeMap, io::BufRead};

use crate::{
    constructs::in_header, io::ByteCursor, Header, InteropError, LaneTile, MetricFamily,
    MetricSet, Result,
};

use super::read_records;

const V2_RECORD_SIZE: usize = LaneTile::<u16>::SIZE + 2 + 4;
const V3_RECORD_SIZE: usize = LaneTile::<u32>::SIZE + 1 + 8;

const TAG_TILE: u8 = b't';
const TAG_READ: u8 = b'r';

/// Meaning of a version 2 record's code. Reads are numbered from 1; a read of 0 maps
/// to the same code as read 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileCode {
    Density,
    DensityPf,
    ClusterCount,
    ClusterCountPf,
    Phasing { read: u16 },
    Prephasing { read: u16 },
    PercentAligned { read: u16 },
    ControlLane,
}
impl TileCode {
    /// Maps a raw code, returning `None` for codes outside the published table.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(Self::Density),
            101 => Some(Self::DensityPf),
            102 => Some(Self::ClusterCount),
            103 => Some(Self::ClusterCountPf),
            200..=299 if code % 2 == 0 => Some(Self::Phasing {
                read: (code - 200) / 2 + 1,
            }),
            200..=299 => Some(Self::Prephasing {
                read: (code - 201) / 2 + 1,
            }),
            300..=399 => Some(Self::PercentAligned {
                read: code - 300 + 1,
            }),
            400 => Some(Self::ControlLane),
            _ => None,
        }
    }

    pub fn code(&self) -> u16 {
        match *self {
            Self::Density => 100,
            Self::DensityPf => 101,
            Self::ClusterCount => 102,
            Self::ClusterCountPf => 103,
            Self::Phasing { read } => read_code(200, read, 2),
            Self::Prephasing { read } => read_code(201, read, 2),
            Self::PercentAligned { read } => read_code(300, read, 1),
            Self::ControlLane => 400,
        }
    }
}

fn read_code(base: u16, read: u16, stride: u16) -> u16 {
    base.saturating_add(read.saturating_sub(1).saturating_mul(stride))
}

/// Version 2 tile totals. Codes the file did not provide are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileRecordV2 {
    pub id: LaneTile<u16>,
    pub density: f32,
    pub density_pf: f32,
    pub cluster_count: f32,
    pub cluster_count_pf: f32,
    pub control_lane: f32,
}
impl TileRecordV2 {
    pub fn new(id: LaneTile<u16>, density: f32, cluster_count: f32, cluster_count_pf: f32) -> Self {
        Self {
            id,
            density,
            density_pf: f32::NAN,
            cluster_count,
            cluster_count_pf,
            control_lane: f32::NAN,
        }
    }

    pub fn view(&self) -> TileRef {
        TileRef {
            lane: self.id.lane,
            tile: self.id.tile_number(),
            density: self.density,
            cluster_count: self.cluster_count,
            cluster_count_pf: self.cluster_count_pf,
        }
    }
}

/// Version 2 alignment and phasing for one read of one tile. Codes the file did not
/// provide are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileReadRecordV2 {
    pub id: LaneTile<u16>,
    pub read: u16,
    pub percent_aligned: f32,
    pub phasing: f32,
    pub prephasing: f32,
}
impl TileReadRecordV2 {
    pub fn view(&self) -> TileReadRef {
        TileReadRef {
            lane: self.id.lane,
            tile: self.id.tile_number(),
            read: self.read as u32,
            percent_aligned: self.percent_aligned,
        }
    }
}

/// Version 3 `'t'` record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileRecordV3 {
    pub id: LaneTile<u32>,
    pub cluster_count: f32,
    pub cluster_count_pf: f32,
}
impl TileRecordV3 {
    pub fn new(id: LaneTile<u32>, cluster_count: f32, cluster_count_pf: f32) -> Self {
        Self {
            id,
            cluster_count,
            cluster_count_pf,
        }
    }

    /// Per-tile density is not stored in version 3; see [`TileMetrics::file_density`].
    pub fn view(&self) -> TileRef {
        TileRef {
            lane: self.id.lane,
            tile: self.id.tile,
            density: f32::NAN,
            cluster_count: self.cluster_count,
            cluster_count_pf: self.cluster_count_pf,
        }
    }
}

/// Version 3 `'r'` record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileReadRecordV3 {
    pub id: LaneTile<u32>,
    pub read: u32,
    pub percent_aligned: f32,
}
impl TileReadRecordV3 {
    pub fn new(id: LaneTile<u32>, read: u32, percent_aligned: f32) -> Self {
        Self {
            id,
            read,
            percent_aligned,
        }
    }

    pub fn view(&self) -> TileReadRef {
        TileReadRef {
            lane: self.id.lane,
            tile: self.id.tile,
            read: self.read,
            percent_aligned: self.percent_aligned,
        }
    }
}

/// Width-independent view of a tile record. `density` is `NaN` when the version
/// stores no per-tile density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRef {
    pub lane: u16,
    pub tile: u32,
    pub density: f32,
    pub cluster_count: f32,
    pub cluster_count_pf: f32,
}

/// Width-independent view of a per-read record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileReadRef {
    pub lane: u16,
    pub tile: u32,
    pub read: u32,
    pub percent_aligned: f32,
}

/// Decoded tile metrics file, one variant per supported version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileMetrics {
    V2 {
        tiles: Vec<TileRecordV2>,
        reads: Vec<TileReadRecordV2>,
    },
    V3 {
        /// File-level density (patterned flow cells)
        density: f32,
        tiles: Vec<TileRecordV3>,
        reads: Vec<TileReadRecordV3>,
    },
}
impl TileMetrics {
    pub fn version(&self) -> u8 {
        match self {
            Self::V2 { .. } => 2,
            Self::V3 { .. } => 3,
        }
    }

    /// File-level density, present only in version 3.
    pub fn file_density(&self) -> Option<f32> {
        match self {
            Self::V2 { .. } => None,
            Self::V3 { density, .. } => Some(*density),
        }
    }

    pub fn tile_count(&self) -> usize {
        match self {
            Self::V2 { tiles, .. } => tiles.len(),
            Self::V3 { tiles, .. } => tiles.len(),
        }
    }

    pub fn read_count(&self) -> usize {
        match self {
            Self::V2 { reads, .. } => reads.len(),
            Self::V3 { reads, .. } => reads.len(),
        }
    }

    /// Tile and read records together.
    pub fn len(&self) -> usize {
        self.tile_count() + self.read_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile records, independent of the version's tile width.
    pub fn tiles(&self) -> impl Iterator<Item = TileRef> + '_ {
        let (narrow, wide): (&[TileRecordV2], &[TileRecordV3]) = match self {
            Self::V2 { tiles, .. } => (tiles.as_slice(), &[][..]),
            Self::V3 { tiles, .. } => (&[][..], tiles.as_slice()),
        };
        narrow
            .iter()
            .map(TileRecordV2::view)
            .chain(wide.iter().map(TileRecordV3::view))
    }

    /// Per-read records, independent of the version's tile width.
    pub fn reads(&self) -> impl Iterator<Item = TileReadRef> + '_ {
        let (narrow, wide): (&[TileReadRecordV2], &[TileReadRecordV3]) = match self {
            Self::V2 { reads, .. } => (reads.as_slice(), &[][..]),
            Self::V3 { reads, .. } => (&[][..], reads.as_slice()),
        };
        narrow
            .iter()
            .map(TileReadRecordV2::view)
            .chain(wide.iter().map(TileReadRecordV3::view))
    }

    /// Number of distinct lanes observed.
    pub fn lane_count(&self) -> usize {
        self.lanes().len()
    }

    /// Distinct lanes, ascending.
    pub fn lanes(&self) -> Vec<u16> {
        let mut lanes: Vec<u16> = self
            .tiles()
            .map(|t| t.lane)
            .chain(self.reads().map(|r| r.lane))
            .collect();
        lanes.sort_unstable();
        lanes.dedup();
        lanes
    }

    /// Tiles belonging to `lane`.
    pub fn lane_tiles(&self, lane: u16) -> impl Iterator<Item = TileRef> + '_ {
        self.tiles().filter(move |t| t.lane == lane)
    }
}

impl MetricSet for TileMetrics {
    const FAMILY: MetricFamily = MetricFamily::Tile;

    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = Header::read(cursor, Self::FAMILY)?;
        match header.version {
            2 => {
                header.check_record_size(Self::FAMILY, V2_RECORD_SIZE);
                decode_v2(cursor)
            }
            3 => {
                header.check_record_size(Self::FAMILY, V3_RECORD_SIZE);
                decode_v3(cursor)
            }
            _ => Err(header.unsupported(Self::FAMILY)),
        }
    }
}

#[derive(Default)]
struct ReadState {
    percent_aligned: Option<f32>,
    phasing: Option<f32>,
    prephasing: Option<f32>,
}

#[derive(Default)]
struct TileState {
    density: Option<f32>,
    density_pf: Option<f32>,
    cluster_count: Option<f32>,
    cluster_count_pf: Option<f32>,
    control_lane: Option<f32>,
    reads: BTreeMap<u16, ReadState>,
}
impl TileState {
    fn slot(&mut self, code: TileCode) -> &mut Option<f32> {
        match code {
            TileCode::Density => &mut self.density,
            TileCode::DensityPf => &mut self.density_pf,
            TileCode::ClusterCount => &mut self.cluster_count,
            TileCode::ClusterCountPf => &mut self.cluster_count_pf,
            TileCode::ControlLane => &mut self.control_lane,
            TileCode::Phasing { read } => &mut self.reads.entry(read).or_default().phasing,
            TileCode::Prephasing { read } => &mut self.reads.entry(read).or_default().prephasing,
            TileCode::PercentAligned { read } => {
                &mut self.reads.entry(read).or_default().percent_aligned
            }
        }
    }
}

fn decode_v2<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<TileMetrics> {
    let mut states: BTreeMap<LaneTile<u16>, TileState> = BTreeMap::new();
    while cursor.next_record()? {
        let id = LaneTile::<u16>::read(cursor)?;
        let raw = cursor.read_u16()?;
        let value = cursor.read_f32()?;
        let code = TileCode::from_code(raw).ok_or(InteropError::InvalidDiscriminator {
            family: MetricFamily::Tile,
            code: raw,
            pos: cursor.record_start(),
        })?;

        let slot = states.entry(id).or_default().slot(code);
        if slot.is_some() {
            return Err(InteropError::DuplicateField {
                lane: id.lane,
                tile: id.tile_number(),
                code: raw,
            });
        }
        *slot = Some(value);
    }

    let mut tiles = Vec::with_capacity(states.len());
    let mut reads = Vec::new();
    for (id, state) in states {
        tiles.push(TileRecordV2 {
            id,
            density: state.density.unwrap_or(f32::NAN),
            density_pf: state.density_pf.unwrap_or(f32::NAN),
            cluster_count: state.cluster_count.unwrap_or(f32::NAN),
            cluster_count_pf: state.cluster_count_pf.unwrap_or(f32::NAN),
            control_lane: state.control_lane.unwrap_or(f32::NAN),
        });
        for (read, rs) in state.reads {
            reads.push(TileReadRecordV2 {
                id,
                read,
                percent_aligned: rs.percent_aligned.unwrap_or(f32::NAN),
                phasing: rs.phasing.unwrap_or(f32::NAN),
                prephasing: rs.prephasing.unwrap_or(f32::NAN),
            });
        }
    }

    Ok(TileMetrics::V2 { tiles, reads })
}

/// Version 3 record payload, selected by the tag byte after the identity.
enum TaggedV3 {
    Tile(TileRecordV3),
    Read(TileReadRecordV3),
}

fn read_v3_record<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<TaggedV3> {
    let id = LaneTile::<u32>::read(cursor)?;
    let tag = cursor.read_u8()?;
    match tag {
        TAG_TILE => {
            let cluster_count = cursor.read_f32()?;
            let cluster_count_pf = cursor.read_f32()?;
            Ok(TaggedV3::Tile(TileRecordV3::new(
                id,
                cluster_count,
                cluster_count_pf,
            )))
        }
        TAG_READ => {
            let read = cursor.read_u32()?;
            let percent_aligned = cursor.read_f32()?;
            Ok(TaggedV3::Read(TileReadRecordV3::new(id, read, percent_aligned)))
        }
        other => Err(InteropError::InvalidDiscriminator {
            family: MetricFamily::Tile,
            code: other as u16,
            pos: cursor.record_start(),
        }),
    }
}

fn decode_v3<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<TileMetrics> {
    let density = in_header(MetricFamily::Tile, cursor.read_f32())?;

    let mut tiles = Vec::new();
    let mut reads = Vec::new();
    for record in read_records(cursor, read_v3_record)? {
        match record {
            TaggedV3::Tile(tile) => tiles.push(tile),
            TaggedV3::Read(read) => reads.push(read),
        }
    }

    Ok(TileMetrics::V3 {
        density,
        tiles,
        reads,
    })
}
