//! Extended tile metrics (`ExtendedTileMetricsOut.bin`): occupied clusters on
//! patterned flow cells.

use std::io::BufRead;

use crate::{
    io::ByteCursor, Header, InteropError, LaneTile, MetricFamily, MetricSet, Result,
};

use super::read_records;

const CODE_OCCUPIED: u16 = 0;
const V1_RECORD_SIZE: usize = LaneTile::<u16>::SIZE + 2 + 4;
const V3_RECORD_SIZE: usize = LaneTile::<u32>::SIZE + 3 * 4;

/// Version 1 record. Only the occupied-cluster code is defined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedTileV1 {
    pub id: LaneTile<u16>,
    pub occupied: f32,
}
impl ExtendedTileV1 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let id = LaneTile::read(cursor)?;
        let code = cursor.read_u16()?;
        let value = cursor.read_f32()?;
        if code != CODE_OCCUPIED {
            return Err(InteropError::InvalidDiscriminator {
                family: MetricFamily::ExtendedTile,
                code,
                pos: cursor.record_start(),
            });
        }
        Ok(Self {
            id,
            occupied: value,
        })
    }
}

/// Version 3 record. `loc_x`/`loc_y` are decoded but not summarized.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedTileV3 {
    pub id: LaneTile<u32>,
    pub occupied: f32,
    pub loc_x: f32,
    pub loc_y: f32,
}
impl ExtendedTileV3 {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let id = LaneTile::read(cursor)?;
        let occupied = cursor.read_f32()?;
        let loc_x = cursor.read_f32()?;
        let loc_y = cursor.read_f32()?;
        Ok(Self {
            id,
            occupied,
            loc_x,
            loc_y,
        })
    }
}

/// Version-independent occupancy record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtendedTileRecord {
    pub lane: u16,
    pub tile: u32,
    pub occupied_clusters: f64,
}

/// Decoded extended tile metrics file, one variant per supported version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtendedTileMetrics {
    V1 { records: Vec<ExtendedTileV1> },
    V3 { records: Vec<ExtendedTileV3> },
}
impl ExtendedTileMetrics {
    pub fn version(&self) -> u8 {
        match self {
            Self::V1 { .. } => 1,
            Self::V3 { .. } => 3,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::V1 { records } => records.len(),
            Self::V3 { records } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<ExtendedTileRecord> {
        match self {
            Self::V1 { records } => records
                .iter()
                .map(|r| ExtendedTileRecord {
                    lane: r.id.lane,
                    tile: r.id.tile_number(),
                    occupied_clusters: r.occupied as f64,
                })
                .collect(),
            Self::V3 { records } => records
                .iter()
                .map(|r| ExtendedTileRecord {
                    lane: r.id.lane,
                    tile: r.id.tile_number(),
                    occupied_clusters: r.occupied as f64,
                })
                .collect(),
        }
    }
}

impl MetricSet for ExtendedTileMetrics {
    const FAMILY: MetricFamily = MetricFamily::ExtendedTile;

    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = Header::read(cursor, Self::FAMILY)?;
        match header.version {
            1 => {
                header.check_record_size(Self::FAMILY, V1_RECORD_SIZE);
                let records = read_records(cursor, ExtendedTileV1::read)?;
                Ok(Self::V1 { records })
            }
            3 => {
                header.check_record_size(Self::FAMILY, V3_RECORD_SIZE);
                let records = read_records(cursor, ExtendedTileV3::read)?;
                Ok(Self::V3 { records })
            }
            _ => Err(header.unsupported(Self::FAMILY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::encode::Encoder;

    #[test]
    fn test_v1_occupied() {
        let enc = Encoder::header(1, 10)
            .u16(1)
            .u16(1101)
            .u16(0)
            .f32(4500.0)
            .u16(1)
            .u16(1102)
            .u16(0)
            .f32(4700.0);
        let metrics = ExtendedTileMetrics::from_bytes(&enc.finish()).unwrap();
        assert_eq!(metrics.version(), 1);
        let records = metrics.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tile, 1102);
        assert_eq!(records[1].occupied_clusters, 4700.0);
    }

    #[test]
    fn test_v1_unknown_code() {
        let enc = Encoder::header(1, 10).u16(1).u16(1101).u16(3).f32(1.0);
        let result = ExtendedTileMetrics::from_bytes(&enc.finish());
        assert!(matches!(
            result,
            Err(InteropError::InvalidDiscriminator {
                family: MetricFamily::ExtendedTile,
                code: 3,
                pos: 2
            })
        ));
    }

    #[test]
    fn test_v3_consumes_locations() {
        let enc = Encoder::header(3, 18)
            .u16(1)
            .u32(1_101_101)
            .f32(1000.0)
            .f32(12.5)
            .f32(-3.0)
            .u16(2)
            .u32(2_101_101)
            .f32(2000.0)
            .f32(0.0)
            .f32(0.0);
        let metrics = ExtendedTileMetrics::from_bytes(&enc.finish()).unwrap();

        match &metrics {
            ExtendedTileMetrics::V3 { records } => {
                assert_eq!(records[0].loc_x, 12.5);
                assert_eq!(records[0].loc_y, -3.0);
            }
            _ => panic!("Expected version 3"),
        }
        let records = metrics.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].lane, 2);
        assert_eq!(records[1].tile, 2_101_101);
        assert_eq!(records[1].occupied_clusters, 2000.0);
    }

    #[test]
    fn test_v3_truncated_location() {
        let enc = Encoder::header(3, 18).u16(1).u32(1).f32(1.0).f32(2.0);
        let result = ExtendedTileMetrics::from_bytes(&enc.finish());
        assert!(matches!(result, Err(InteropError::TruncatedRecord { pos: 2 })));
    }

    #[test]
    fn test_unsupported_version() {
        let result = ExtendedTileMetrics::from_bytes(&Encoder::header(2, 10).finish());
        assert!(matches!(
            result,
            Err(InteropError::UnsupportedVersion { version: 2, .. })
        ));
    }
}
