//! Corrected intensity metrics (`CorrectedIntMetricsOut.bin`): per-cycle base call
//! counts and channel intensities.
//!
//! Newer instruments dropped the raw channel intensities, so the version 4 layout
//! carries only the call counts.

use std::io::BufRead;

use crate::{io::ByteCursor, Header, LaneTileCycle, MetricFamily, MetricSet, Result};

use super::read_records;

const CALLED_COUNTS_SIZE: usize = 5 * 4;
const V2_RECORD_SIZE: usize = LaneTileCycle::<u16>::SIZE + 2 + 8 + 8 + CALLED_COUNTS_SIZE + 4;
const V3_RECORD_SIZE: usize = LaneTileCycle::<u16>::SIZE + 8 + CALLED_COUNTS_SIZE;
const V4_RECORD_SIZE: usize = LaneTileCycle::<u32>::SIZE + CALLED_COUNTS_SIZE;

/// Number of clusters called as each base in one cycle (`n` = no-call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalledCounts {
    pub n: u32,
    pub a: u32,
    pub c: u32,
    pub g: u32,
    pub t: u32,
}
impl CalledCounts {
    pub fn new(n: u32, a: u32, c: u32, g: u32, t: u32) -> Self {
        Self { n, a, c, g, t }
    }
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let mut raw = [0u32; 5];
        cursor.read_u32_into(&mut raw)?;
        let [n, a, c, g, t] = raw;
        Ok(Self { n, a, c, g, t })
    }
    /// Calls of every kind, no-calls included.
    pub fn total(&self) -> u64 {
        [self.n, self.a, self.c, self.g, self.t]
            .iter()
            .map(|&count| count as u64)
            .sum()
    }
}

/// Accessors shared by every corrected intensity record layout.
pub trait CorrectedIntensityRecord {
    fn lane(&self) -> u16;
    fn tile(&self) -> u32;
    fn cycle(&self) -> u16;
    fn called_counts(&self) -> CalledCounts;

    /// No-calls in this cycle.
    fn n_count(&self) -> u32 {
        self.called_counts().n
    }

    /// Bases called in this cycle, no-calls included.
    fn base_count(&self) -> u64 {
        self.called_counts().total()
    }
}

macro_rules! impl_record_accessors {
    ($record:ty) => {
        impl CorrectedIntensityRecord for $record {
            fn lane(&self) -> u16 {
                self.id.lane
            }
            fn tile(&self) -> u32 {
                self.id.tile_number()
            }
            fn cycle(&self) -> u16 {
                self.id.cycle
            }
            fn called_counts(&self) -> CalledCounts {
                self.called
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrectedIntensityV2 {
    pub id: LaneTileCycle<u16>,
    pub average_intensity: u16,
    /// Corrected intensity of all clusters, by channel A, C, G, T
    pub corrected_all: [u16; 4],
    /// Corrected intensity of clusters called as each base
    pub corrected_called: [u16; 4],
    pub called: CalledCounts,
    pub signal_to_noise: f32,
}
impl CorrectedIntensityV2 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let id = LaneTileCycle::read(cursor)?;
        let average_intensity = cursor.read_u16()?;
        let mut corrected_all = [0u16; 4];
        cursor.read_u16_into(&mut corrected_all)?;
        let mut corrected_called = [0u16; 4];
        cursor.read_u16_into(&mut corrected_called)?;
        let called = CalledCounts::read(cursor)?;
        let signal_to_noise = cursor.read_f32()?;
        Ok(Self {
            id,
            average_intensity,
            corrected_all,
            corrected_called,
            called,
            signal_to_noise,
        })
    }
}
impl_record_accessors!(CorrectedIntensityV2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrectedIntensityV3 {
    pub id: LaneTileCycle<u16>,
    pub corrected_called: [u16; 4],
    pub called: CalledCounts,
}
impl CorrectedIntensityV3 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let id = LaneTileCycle::read(cursor)?;
        let mut corrected_called = [0u16; 4];
        cursor.read_u16_into(&mut corrected_called)?;
        let called = CalledCounts::read(cursor)?;
        Ok(Self {
            id,
            corrected_called,
            called,
        })
    }
}
impl_record_accessors!(CorrectedIntensityV3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrectedIntensityV4 {
    pub id: LaneTileCycle<u32>,
    pub called: CalledCounts,
}
impl CorrectedIntensityV4 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let id = LaneTileCycle::read(cursor)?;
        let called = CalledCounts::read(cursor)?;
        Ok(Self { id, called })
    }
}
impl_record_accessors!(CorrectedIntensityV4);

/// Decoded corrected intensity file, one variant per supported version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CorrectedIntensityMetrics {
    V2 { records: Vec<CorrectedIntensityV2> },
    V3 { records: Vec<CorrectedIntensityV3> },
    V4 { records: Vec<CorrectedIntensityV4> },
}
impl CorrectedIntensityMetrics {
    pub fn version(&self) -> u8 {
        match self {
            Self::V2 { .. } => 2,
            Self::V3 { .. } => 3,
            Self::V4 { .. } => 4,
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records through the shared accessors.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &dyn CorrectedIntensityRecord> + '_> {
        match self {
            Self::V2 { records } => Box::new(records.iter().map(as_record)),
            Self::V3 { records } => Box::new(records.iter().map(as_record)),
            Self::V4 { records } => Box::new(records.iter().map(as_record)),
        }
    }

    /// Bases called over every record, no-calls included.
    pub fn total_bases(&self) -> u64 {
        self.iter().map(|r| r.base_count()).sum()
    }
}

fn as_record<T: CorrectedIntensityRecord>(record: &T) -> &dyn CorrectedIntensityRecord {
    record
}

impl MetricSet for CorrectedIntensityMetrics {
    const FAMILY: MetricFamily = MetricFamily::CorrectedIntensity;

    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = Header::read(cursor, Self::FAMILY)?;
        match header.version {
            2 => {
                header.check_record_size(Self::FAMILY, V2_RECORD_SIZE);
                let records = read_records(cursor, CorrectedIntensityV2::read)?;
                Ok(Self::V2 { records })
            }
            3 => {
                header.check_record_size(Self::FAMILY, V3_RECORD_SIZE);
                let records = read_records(cursor, CorrectedIntensityV3::read)?;
                Ok(Self::V3 { records })
            }
            4 => {
                header.check_record_size(Self::FAMILY, V4_RECORD_SIZE);
                let records = read_records(cursor, CorrectedIntensityV4::read)?;
                Ok(Self::V4 { records })
            }
            _ => Err(header.unsupported(Self::FAMILY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::encode::Encoder, InteropError};

    fn counts(enc: Encoder, counts: [u32; 5]) -> Encoder {
        counts.iter().fold(enc, |enc, &c| enc.u32(c))
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(V2_RECORD_SIZE, 48);
        assert_eq!(V3_RECORD_SIZE, 34);
        assert_eq!(V4_RECORD_SIZE, 28);
    }

    #[test]
    fn test_v2_layout() {
        let mut enc = Encoder::header(2, 48)
            .u16(1)
            .u16(1101)
            .u16(3)
            .u16(400);
        for v in [10, 20, 30, 40, 11, 21, 31, 41] {
            enc = enc.u16(v);
        }
        enc = counts(enc, [5, 100, 200, 300, 400]).f32(12.5);
        let metrics = CorrectedIntensityMetrics::from_bytes(&enc.finish()).unwrap();

        match &metrics {
            CorrectedIntensityMetrics::V2 { records } => {
                let rec = records[0];
                assert_eq!(rec.average_intensity, 400);
                assert_eq!(rec.corrected_all, [10, 20, 30, 40]);
                assert_eq!(rec.corrected_called, [11, 21, 31, 41]);
                assert_eq!(rec.signal_to_noise, 12.5);
            }
            _ => panic!("Expected version 2"),
        }
        let rec = metrics.iter().next().unwrap();
        assert_eq!((rec.lane(), rec.tile(), rec.cycle()), (1, 1101, 3));
        assert_eq!(rec.n_count(), 5);
        assert_eq!(rec.base_count(), 1005);
    }

    #[test]
    fn test_v3_layout() {
        let mut enc = Encoder::header(3, 34).u16(2).u16(2101).u16(1);
        for v in [1, 2, 3, 4] {
            enc = enc.u16(v);
        }
        enc = counts(enc, [1, 2, 3, 4, 5]);
        let metrics = CorrectedIntensityMetrics::from_bytes(&enc.finish()).unwrap();
        assert_eq!(metrics.version(), 3);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics.total_bases(), 15);
    }

    #[test]
    fn test_v4_layout() {
        let mut enc = Encoder::header(4, 28);
        enc = counts(enc.u16(1).u32(1_101_101).u16(1), [0, 10, 10, 10, 10]);
        enc = counts(enc.u16(1).u32(1_101_101).u16(2), [2, 9, 10, 10, 9]);
        let metrics = CorrectedIntensityMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 4);
        let records: Vec<_> = metrics.iter().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tile(), 1_101_101);
        assert_eq!(records[1].n_count(), 2);
        assert_eq!(metrics.total_bases(), 80);
    }

    #[test]
    fn test_truncated_counts() {
        let enc = Encoder::header(4, 28).u16(1).u32(1).u16(1).u32(0).u32(1);
        let result = CorrectedIntensityMetrics::from_bytes(&enc.finish());
        assert!(matches!(result, Err(InteropError::TruncatedRecord { pos: 2 })));
    }

    #[test]
    fn test_unsupported_version() {
        let result = CorrectedIntensityMetrics::from_bytes(&Encoder::header(1, 10).finish());
        assert!(matches!(
            result,
            Err(InteropError::UnsupportedVersion {
                family: MetricFamily::CorrectedIntensity,
                version: 1
            })
        ));
    }
}
