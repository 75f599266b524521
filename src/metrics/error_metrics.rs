//! Error metrics (`ErrorMetricsOut.bin`): per-cycle error rates from alignment to a
//! control (typically PhiX).

use std::io::BufRead;

use crate::{
    constructs::in_header, io::ByteCursor, Header, LaneTileCycle, MetricFamily, MetricSet,
    Result,
};

use super::read_records;

const V3_RECORD_SIZE: usize = LaneTileCycle::<u16>::SIZE + 4 + 5 * 4;

/// Version 3 record.
///
/// The perfect and 1..4-error read counts are decoded for completeness; summaries
/// only use `error_rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRecordV3 {
    pub id: LaneTileCycle<u16>,
    pub error_rate: f32,
    pub perfect_reads: u32,
    pub reads_with_errors: [u32; 4],
}
impl ErrorRecordV3 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let id = LaneTileCycle::read(cursor)?;
        let error_rate = cursor.read_f32()?;
        let perfect_reads = cursor.read_u32()?;
        let mut reads_with_errors = [0u32; 4];
        cursor.read_u32_into(&mut reads_with_errors)?;
        Ok(Self {
            id,
            error_rate,
            perfect_reads,
            reads_with_errors,
        })
    }
}

/// Adapter sequences stored once before the version 6 records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdapterTable {
    pub adapter_count: u16,
    pub adapter_base_count: u16,
    pub adapter_bases: Vec<u8>,
}
impl AdapterTable {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let adapter_count = cursor.read_u16()?;
        let adapter_base_count = cursor.read_u16()?;
        let adapter_bases = cursor.read_bytes(adapter_count as usize * adapter_base_count as usize)?;
        Ok(Self {
            adapter_count,
            adapter_base_count,
            adapter_bases,
        })
    }

    /// Adapter sequences as text.
    pub fn sequences(&self) -> Vec<String> {
        if self.adapter_base_count == 0 {
            return vec![String::new(); self.adapter_count as usize];
        }
        self.adapter_bases
            .chunks(self.adapter_base_count as usize)
            .map(|bases| String::from_utf8_lossy(bases).into_owned())
            .collect()
    }
}

/// Version 6 record with the fraction of reads trimmed for each adapter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRecordV6 {
    pub id: LaneTileCycle<u32>,
    pub error_rate: f32,
    pub adapter_trimmed: Vec<f32>,
}
impl ErrorRecordV6 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>, adapter_count: usize) -> Result<Self> {
        let id = LaneTileCycle::read(cursor)?;
        let error_rate = cursor.read_f32()?;
        let mut adapter_trimmed = vec![0f32; adapter_count];
        cursor.read_f32_into(&mut adapter_trimmed)?;
        Ok(Self {
            id,
            error_rate,
            adapter_trimmed,
        })
    }
}

/// Version-independent error record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorRecord {
    pub lane: u16,
    pub tile: u32,
    pub cycle: u16,
    pub error_rate: f64,
    pub adapter_trimmed: Option<Vec<f64>>,
}

/// Decoded error metrics file, one variant per supported version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorMetrics {
    V3 {
        records: Vec<ErrorRecordV3>,
    },
    V6 {
        adapters: AdapterTable,
        records: Vec<ErrorRecordV6>,
    },
}
impl ErrorMetrics {
    pub fn version(&self) -> u8 {
        match self {
            Self::V3 { .. } => 3,
            Self::V6 { .. } => 6,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::V3 { records } => records.len(),
            Self::V6 { records, .. } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn adapters(&self) -> Option<&AdapterTable> {
        match self {
            Self::V3 { .. } => None,
            Self::V6 { adapters, .. } => Some(adapters),
        }
    }

    /// Summarized records in file order.
    pub fn records(&self) -> Vec<ErrorRecord> {
        match self {
            Self::V3 { records } => records
                .iter()
                .map(|r| ErrorRecord {
                    lane: r.id.lane,
                    tile: r.id.tile_number(),
                    cycle: r.id.cycle,
                    error_rate: r.error_rate as f64,
                    adapter_trimmed: None,
                })
                .collect(),
            Self::V6 { records, .. } => records
                .iter()
                .map(|r| ErrorRecord {
                    lane: r.id.lane,
                    tile: r.id.tile_number(),
                    cycle: r.id.cycle,
                    error_rate: r.error_rate as f64,
                    adapter_trimmed: Some(r.adapter_trimmed.iter().map(|&f| f as f64).collect()),
                })
                .collect(),
        }
    }
}

impl MetricSet for ErrorMetrics {
    const FAMILY: MetricFamily = MetricFamily::Error;

    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = Header::read(cursor, Self::FAMILY)?;
        match header.version {
            3 => {
                header.check_record_size(Self::FAMILY, V3_RECORD_SIZE);
                let records = read_records(cursor, ErrorRecordV3::read)?;
                Ok(Self::V3 { records })
            }
            6 => {
                let adapters = in_header(Self::FAMILY, AdapterTable::read(cursor))?;
                let adapter_count = adapters.adapter_count as usize;
                header.check_record_size(
                    Self::FAMILY,
                    LaneTileCycle::<u32>::SIZE + 4 + 4 * adapter_count,
                );
                let records = read_records(cursor, |c| ErrorRecordV6::read(c, adapter_count))?;
                Ok(Self::V6 { adapters, records })
            }
            _ => Err(header.unsupported(Self::FAMILY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::encode::Encoder, InteropError};

    fn v3_record(enc: Encoder, lane: u16, tile: u16, cycle: u16, rate: f32) -> Encoder {
        enc.u16(lane)
            .u16(tile)
            .u16(cycle)
            .f32(rate)
            .u32(900)
            .u32(50)
            .u32(25)
            .u32(15)
            .u32(10)
    }

    #[test]
    fn test_v3_records() {
        let mut enc = Encoder::header(3, 30);
        enc = v3_record(enc, 1, 1101, 1, 0.25);
        enc = v3_record(enc, 1, 1101, 2, 0.5);
        let metrics = ErrorMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 3);
        assert_eq!(metrics.len(), 2);
        assert!(metrics.adapters().is_none());
        match &metrics {
            ErrorMetrics::V3 { records } => {
                assert_eq!(records[0].perfect_reads, 900);
                assert_eq!(records[0].reads_with_errors, [50, 25, 15, 10]);
                assert_eq!(records[1].id, LaneTileCycle::new(1, 1101, 2));
            }
            _ => panic!("Expected version 3"),
        }

        let summary = metrics.records();
        assert_eq!(summary[1].error_rate, 0.5);
        assert_eq!(summary[1].adapter_trimmed, None);
    }

    #[test]
    fn test_v6_adapter_table() {
        let enc = Encoder::header(6, 20)
            .u16(2)
            .u16(4)
            .bytes(b"ACGTTTGA")
            .u16(1)
            .u32(1_101_101)
            .u16(7)
            .f32(0.125)
            .f32(0.5)
            .f32(0.25);
        let metrics = ErrorMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 6);
        let adapters = metrics.adapters().unwrap();
        assert_eq!(adapters.adapter_count, 2);
        assert_eq!(adapters.sequences(), vec!["ACGT".to_string(), "TTGA".to_string()]);

        let records = metrics.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tile, 1_101_101);
        assert_eq!(records[0].cycle, 7);
        assert_eq!(records[0].error_rate, 0.125);
        assert_eq!(records[0].adapter_trimmed, Some(vec![0.5, 0.25]));
    }

    #[test]
    fn test_v6_without_adapters() {
        let enc = Encoder::header(6, 12)
            .u16(0)
            .u16(0)
            .u16(2)
            .u32(5)
            .u16(1)
            .f32(1.0);
        let metrics = ErrorMetrics::from_bytes(&enc.finish()).unwrap();
        assert!(metrics.adapters().unwrap().sequences().is_empty());
        assert_eq!(metrics.records()[0].adapter_trimmed, Some(vec![]));
    }

    #[test]
    fn test_truncated_final_record() {
        let mut enc = Encoder::header(3, 30);
        enc = v3_record(enc, 1, 1, 1, 0.1);
        enc = enc.u16(1).u16(1).u16(2).f32(0.2);
        let result = ErrorMetrics::from_bytes(&enc.finish());
        assert!(matches!(result, Err(InteropError::TruncatedRecord { pos: 32 })));
    }

    #[test]
    fn test_oversized_adapter_table() {
        let bytes = [6u8, 20, 0xFF, 0xFF, 0xFF, 0xFF];
        let result = ErrorMetrics::from_bytes(&bytes);
        assert!(matches!(
            result,
            Err(InteropError::TruncatedHeader {
                family: MetricFamily::Error,
                pos: 0
            })
        ));
    }

    #[test]
    fn test_truncated_adapter_table() {
        let enc = Encoder::header(6, 20).u16(2).u16(4).bytes(b"ACG");
        let result = ErrorMetrics::from_bytes(&enc.finish());
        assert!(matches!(
            result,
            Err(InteropError::TruncatedHeader {
                family: MetricFamily::Error,
                ..
            })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let result = ErrorMetrics::from_bytes(&Encoder::header(4, 30).finish());
        assert!(matches!(
            result,
            Err(InteropError::UnsupportedVersion {
                family: MetricFamily::Error,
                version: 4
            })
        ));
    }
}
