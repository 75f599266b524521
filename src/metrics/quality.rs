//! Quality metrics (`QMetricsOut.bin`): per-cycle histograms of quality scores.
//!
//! Version 4 always uses 50 bins, one per Q-score. Versions 6 and 7 may store a bin
//! table before the records; when they do, every record's histogram has exactly as
//! many entries as the table has bins.

use std::io::BufRead;

use crate::{
    constructs::in_header, io::ByteCursor, Header, LaneTileCycle, MetricFamily, MetricSet,
    Result, TileId,
};

use super::read_records;

/// Histogram width when no bin table is stored.
pub const DEFAULT_BIN_COUNT: usize = 50;

/// One quality bin: scores in `low..=high` are reported as `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QBin {
    pub low: u8,
    pub high: u8,
    pub value: u8,
}
impl QBin {
    pub fn new(low: u8, high: u8, value: u8) -> Self {
        Self { low, high, value }
    }
}

/// Mapping from histogram index to quality range.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinTable {
    pub bins: Vec<QBin>,
    /// False when the file stored no table and the 50 unit bins are implied.
    pub stored: bool,
}
impl BinTable {
    /// The implied table of bins `Q1..=Q50`.
    pub fn implicit() -> Self {
        let bins = (1..=DEFAULT_BIN_COUNT as u8)
            .map(|q| QBin::new(q, q, q))
            .collect();
        Self {
            bins,
            stored: false,
        }
    }
    pub fn stored(bins: Vec<QBin>) -> Self {
        Self { bins, stored: true }
    }
    pub fn len(&self) -> usize {
        self.bins.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Version 6 layout: presence flag, count, then three parallel arrays.
    ///
    /// The arrays are consumed even when the flag is clear; such a file still uses the
    /// implied table.
    fn read_v6<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let has_bins = cursor.read_bool()?;
        let count = cursor.read_u8()? as usize;
        let lows = cursor.read_bytes(count)?;
        let highs = cursor.read_bytes(count)?;
        let values = cursor.read_bytes(count)?;
        if !has_bins {
            return Ok(Self::implicit());
        }
        let bins = lows
            .into_iter()
            .zip(highs)
            .zip(values)
            .map(|((low, high), value)| QBin::new(low, high, value))
            .collect();
        Ok(Self::stored(bins))
    }

    /// Version 7 layout: presence flag, then (only when set) count and `{low, high,
    /// value}` triples.
    fn read_v7<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        if !cursor.read_bool()? {
            return Ok(Self::implicit());
        }
        let count = cursor.read_u8()? as usize;
        let mut bins = Vec::with_capacity(count);
        for _ in 0..count {
            let low = cursor.read_u8()?;
            let high = cursor.read_u8()?;
            let value = cursor.read_u8()?;
            bins.push(QBin::new(low, high, value));
        }
        Ok(Self::stored(bins))
    }
}

/// Quality histogram for one tile and cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QRecord<T: TileId> {
    pub id: LaneTileCycle<T>,
    pub histogram: Vec<i64>,
}
impl<T: TileId> QRecord<T> {
    pub fn new(id: LaneTileCycle<T>, histogram: Vec<i64>) -> Self {
        Self { id, histogram }
    }

    /// Total number of bases counted in the histogram.
    pub fn total(&self) -> i64 {
        self.histogram.iter().sum()
    }

    fn read<R: BufRead>(cursor: &mut ByteCursor<R>, bin_count: usize) -> Result<Self> {
        let id = LaneTileCycle::<T>::read(cursor)?;
        let mut raw = vec![0u32; bin_count];
        cursor.read_u32_into(&mut raw)?;
        let histogram = raw.into_iter().map(i64::from).collect();
        Ok(Self { id, histogram })
    }

    pub fn view(&self) -> QRecordRef<'_> {
        QRecordRef {
            lane: self.id.lane,
            tile: self.id.tile_number(),
            cycle: self.id.cycle,
            histogram: &self.histogram,
        }
    }
}

/// Width-independent view of a [`QRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QRecordRef<'a> {
    pub lane: u16,
    pub tile: u32,
    pub cycle: u16,
    pub histogram: &'a [i64],
}
impl QRecordRef<'_> {
    pub fn total(&self) -> i64 {
        self.histogram.iter().sum()
    }

    /// Bases in bins whose lower bound is at least `threshold`.
    pub fn count_at_or_above(&self, table: &BinTable, threshold: u8) -> i64 {
        self.histogram
            .iter()
            .zip(&table.bins)
            .filter(|(_, bin)| bin.low >= threshold)
            .map(|(count, _)| count)
            .sum()
    }

    /// Mean reported quality value, `NaN` for an empty histogram.
    pub fn mean_quality(&self, table: &BinTable) -> f64 {
        let total = self.total();
        if total == 0 {
            return f64::NAN;
        }
        let weighted: f64 = self
            .histogram
            .iter()
            .zip(&table.bins)
            .map(|(count, bin)| *count as f64 * bin.value as f64)
            .sum();
        weighted / total as f64
    }
}

/// Decoded quality metrics file, one variant per supported version.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QMetrics {
    V4 {
        table: BinTable,
        records: Vec<QRecord<u16>>,
    },
    V6 {
        table: BinTable,
        records: Vec<QRecord<u16>>,
    },
    V7 {
        table: BinTable,
        records: Vec<QRecord<u32>>,
    },
}
impl QMetrics {
    pub fn version(&self) -> u8 {
        match self {
            Self::V4 { .. } => 4,
            Self::V6 { .. } => 6,
            Self::V7 { .. } => 7,
        }
    }

    /// Active bin table (implied for version 4).
    pub fn table(&self) -> &BinTable {
        match self {
            Self::V4 { table, .. } | Self::V6 { table, .. } | Self::V7 { table, .. } => table,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.table().len()
    }

    pub fn len(&self) -> usize {
        match self {
            Self::V4 { records, .. } | Self::V6 { records, .. } => records.len(),
            Self::V7 { records, .. } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, independent of the version's tile width.
    pub fn iter(&self) -> impl Iterator<Item = QRecordRef<'_>> + '_ {
        let (narrow, wide): (&[QRecord<u16>], &[QRecord<u32>]) = match self {
            Self::V4 { records, .. } | Self::V6 { records, .. } => (records.as_slice(), &[][..]),
            Self::V7 { records, .. } => (&[][..], records.as_slice()),
        };
        narrow
            .iter()
            .map(QRecord::view)
            .chain(wide.iter().map(QRecord::view))
    }

    /// Total bases over every record.
    pub fn total_bases(&self) -> i64 {
        self.iter().map(|r| r.total()).sum()
    }
}

impl MetricSet for QMetrics {
    const FAMILY: MetricFamily = MetricFamily::Quality;

    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = Header::read(cursor, Self::FAMILY)?;
        match header.version {
            4 => {
                let table = BinTable::implicit();
                let records = read_histograms::<R, u16>(cursor, &header, &table)?;
                Ok(Self::V4 { table, records })
            }
            6 => {
                let table = in_header(Self::FAMILY, BinTable::read_v6(cursor))?;
                let records = read_histograms::<R, u16>(cursor, &header, &table)?;
                Ok(Self::V6 { table, records })
            }
            7 => {
                let table = in_header(Self::FAMILY, BinTable::read_v7(cursor))?;
                let records = read_histograms::<R, u32>(cursor, &header, &table)?;
                Ok(Self::V7 { table, records })
            }
            _ => Err(header.unsupported(Self::FAMILY)),
        }
    }
}

fn read_histograms<R: BufRead, T: TileId>(
    cursor: &mut ByteCursor<R>,
    header: &Header,
    table: &BinTable,
) -> Result<Vec<QRecord<T>>> {
    let bin_count = table.len();
    header.check_record_size(MetricFamily::Quality, LaneTileCycle::<T>::SIZE + 4 * bin_count);
    read_records(cursor, |c| QRecord::<T>::read(c, bin_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::encode::Encoder, InteropError};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn record<T: TileId>(enc: Encoder, id: LaneTileCycle<T>, histogram: &[u32]) -> Encoder {
        let mut enc = enc.u16(id.lane);
        enc = if T::WIDTH == 2 {
            enc.u16(id.tile_number() as u16)
        } else {
            enc.u32(id.tile_number())
        };
        enc = enc.u16(id.cycle);
        for count in histogram {
            enc = enc.u32(*count);
        }
        enc
    }

    fn v7_with_bins(bins: &[QBin]) -> Encoder {
        let mut enc = Encoder::header(7, (8 + 4 * bins.len()) as u8)
            .u8(1)
            .u8(bins.len() as u8);
        for bin in bins {
            enc = enc.u8(bin.low).u8(bin.high).u8(bin.value);
        }
        enc
    }

    #[test]
    fn test_implicit_table() {
        let table = BinTable::implicit();
        assert_eq!(table.len(), DEFAULT_BIN_COUNT);
        assert!(!table.stored);
        assert_eq!(table.bins[0], QBin::new(1, 1, 1));
        assert_eq!(table.bins[49], QBin::new(50, 50, 50));
    }

    #[test]
    fn test_v4_fixed_bins() {
        let mut histogram = [0u32; 50];
        histogram[29] = 70;
        histogram[9] = 30;
        let enc = record(
            Encoder::header(4, 206),
            LaneTileCycle::new(1, 1101u16, 1),
            &histogram,
        );
        let metrics = QMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 4);
        assert_eq!(metrics.bin_count(), 50);
        assert_eq!(metrics.len(), 1);
        let rec = metrics.iter().next().unwrap();
        assert_eq!((rec.lane, rec.tile, rec.cycle), (1, 1101, 1));
        assert_eq!(rec.histogram.len(), 50);
        assert_eq!(rec.total(), 100);
        assert_eq!(rec.count_at_or_above(metrics.table(), 30), 70);
        assert!((rec.mean_quality(metrics.table()) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_v6_parallel_arrays() {
        let enc = Encoder::header(6, 18)
            .u8(1)
            .u8(3)
            .bytes(&[2, 15, 30])
            .bytes(&[14, 29, 41])
            .bytes(&[12, 23, 37]);
        let enc = record(enc, LaneTileCycle::new(2, 2101u16, 5), &[5, 10, 85]);
        let metrics = QMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 6);
        assert!(metrics.table().stored);
        assert_eq!(
            metrics.table().bins,
            vec![QBin::new(2, 14, 12), QBin::new(15, 29, 23), QBin::new(30, 41, 37)]
        );
        let rec = metrics.iter().next().unwrap();
        assert_eq!(rec.histogram, &[5, 10, 85]);
        assert_eq!(rec.count_at_or_above(metrics.table(), 30), 85);
    }

    #[test]
    fn test_v6_without_bins_consumes_table_bytes() {
        let enc = Encoder::header(6, 206)
            .u8(0)
            .u8(2)
            .bytes(&[1, 2])
            .bytes(&[3, 4])
            .bytes(&[5, 6]);
        let enc = record(enc, LaneTileCycle::new(1, 1u16, 1), &[1u32; 50]);
        let metrics = QMetrics::from_bytes(&enc.finish()).unwrap();
        assert!(!metrics.table().stored);
        assert_eq!(metrics.bin_count(), 50);
        assert_eq!(metrics.total_bases(), 50);
    }

    #[test]
    fn test_v7_interleaved_triples() {
        let bins = [QBin::new(2, 19, 14), QBin::new(20, 29, 21), QBin::new(30, 41, 38)];
        let mut enc = v7_with_bins(&bins);
        enc = record(enc, LaneTileCycle::new(1, 1_101_101u32, 1), &[1, 2, 3]);
        enc = record(enc, LaneTileCycle::new(1, 1_101_101u32, 2), &[4, 5, 6]);
        let metrics = QMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 7);
        assert_eq!(metrics.table().bins, bins.to_vec());
        assert_eq!(metrics.len(), 2);
        let cycles: Vec<u16> = metrics.iter().map(|r| r.cycle).collect();
        assert_eq!(cycles, vec![1, 2]);
        assert_eq!(metrics.iter().nth(1).unwrap().tile, 1_101_101);
        assert_eq!(metrics.total_bases(), 21);
    }

    #[test]
    fn test_v7_without_bins() {
        let enc = record(
            Encoder::header(7, 208).u8(0),
            LaneTileCycle::new(3, 7u32, 9),
            &[2u32; 50],
        );
        let metrics = QMetrics::from_bytes(&enc.finish()).unwrap();
        assert_eq!(metrics.bin_count(), 50);
        assert_eq!(metrics.iter().next().unwrap().total(), 100);
    }

    #[test]
    fn test_histogram_length_matches_bin_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for bin_count in [0usize, 1, 7, 50, 128, 255] {
            let bins: Vec<QBin> = (0..bin_count)
                .map(|i| QBin::new(i as u8, i as u8, i as u8))
                .collect();
            let histogram: Vec<u32> = (0..bin_count).map(|_| rng.random_range(0..1000)).collect();
            let mut enc = v7_with_bins(&bins);
            enc = record(enc, LaneTileCycle::new(1, 1u32, 1), &histogram);
            enc = record(enc, LaneTileCycle::new(1, 1u32, 2), &histogram);
            let metrics = QMetrics::from_bytes(&enc.finish()).unwrap();

            assert_eq!(metrics.bin_count(), bin_count);
            for rec in metrics.iter() {
                assert_eq!(rec.histogram.len(), bin_count);
                let expected: Vec<i64> = histogram.iter().map(|&c| c as i64).collect();
                assert_eq!(rec.histogram, expected.as_slice());
            }
        }
    }

    #[test]
    fn test_truncated_histogram() {
        let bins = [QBin::new(1, 10, 5), QBin::new(11, 40, 30)];
        let enc = v7_with_bins(&bins);
        let start = enc.len();
        let enc = enc.u16(1).u32(1).u16(1).u32(10);
        let result = QMetrics::from_bytes(&enc.finish());
        assert!(matches!(result, Err(InteropError::TruncatedRecord { pos }) if pos == start));
    }

    #[test]
    fn test_truncated_bin_table() {
        let enc = Encoder::header(7, 20).u8(1).u8(4).u8(1).u8(2);
        let result = QMetrics::from_bytes(&enc.finish());
        assert!(matches!(
            result,
            Err(InteropError::TruncatedHeader {
                family: MetricFamily::Quality,
                ..
            })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let result = QMetrics::from_bytes(&Encoder::header(5, 206).finish());
        assert!(matches!(
            result,
            Err(InteropError::UnsupportedVersion { version: 5, .. })
        ));
    }
}
