//! Index metrics (`IndexMetricsOut.bin`): clusters assigned to each sample index.
//!
//! This family has no record-size byte and its records are variable length: the
//! index, sample and project names are `u16` length-prefixed strings.

use std::{collections::BTreeMap, io::BufRead};

use crate::{io::ByteCursor, Header, LaneTile, MetricFamily, MetricSet, Result, TileId};

use super::read_records;

/// Clusters assigned to one index sequence on one tile and read.
///
/// Version 1 stores the cluster count as `u32`; it is widened to `u64` here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexRecord<T: TileId> {
    pub id: LaneTile<T>,
    pub read: u16,
    pub index_name: String,
    pub cluster_count: u64,
    pub sample_name: String,
    pub project_name: String,
}
impl<T: TileId> IndexRecord<T> {
    fn read<R: BufRead>(cursor: &mut ByteCursor<R>, wide_count: bool) -> Result<Self> {
        let id = LaneTile::<T>::read(cursor)?;
        let read = cursor.read_u16()?;
        let index_name = cursor.read_string()?;
        let cluster_count = if wide_count {
            cursor.read_u64()?
        } else {
            cursor.read_u32()? as u64
        };
        let sample_name = cursor.read_string()?;
        let project_name = cursor.read_string()?;
        Ok(Self {
            id,
            read,
            index_name,
            cluster_count,
            sample_name,
            project_name,
        })
    }
}

/// Decoded index metrics file, one variant per supported version.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexMetrics {
    V1 { records: Vec<IndexRecord<u16>> },
    V2 { records: Vec<IndexRecord<u32>> },
}
impl IndexMetrics {
    pub fn version(&self) -> u8 {
        match self {
            Self::V1 { .. } => 1,
            Self::V2 { .. } => 2,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::V1 { records } => records.len(),
            Self::V2 { records } => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(sample_name, cluster_count)` for every record.
    fn counts(&self) -> Vec<(&str, u64)> {
        match self {
            Self::V1 { records } => records
                .iter()
                .map(|r| (r.sample_name.as_str(), r.cluster_count))
                .collect(),
            Self::V2 { records } => records
                .iter()
                .map(|r| (r.sample_name.as_str(), r.cluster_count))
                .collect(),
        }
    }

    /// Clusters over every record.
    pub fn total_yield(&self) -> u64 {
        self.counts().into_iter().map(|(_, count)| count).sum()
    }

    /// Clusters per sample name.
    pub fn sample_yield(&self) -> BTreeMap<String, u64> {
        let mut yields = BTreeMap::new();
        for (sample, count) in self.counts() {
            *yields.entry(sample.to_string()).or_insert(0) += count;
        }
        yields
    }

    /// Each sample's share of the total yield. Empty when nothing was assigned.
    pub fn sample_fractions(&self) -> BTreeMap<String, f64> {
        let total = self.total_yield();
        if total == 0 {
            return BTreeMap::new();
        }
        self.sample_yield()
            .into_iter()
            .map(|(sample, count)| (sample, count as f64 / total as f64))
            .collect()
    }
}

impl MetricSet for IndexMetrics {
    const FAMILY: MetricFamily = MetricFamily::Index;

    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let header = Header::read(cursor, Self::FAMILY)?;
        match header.version {
            1 => {
                let records = read_records(cursor, |c| IndexRecord::<u16>::read(c, false))?;
                Ok(Self::V1 { records })
            }
            2 => {
                let records = read_records(cursor, |c| IndexRecord::<u32>::read(c, true))?;
                Ok(Self::V2 { records })
            }
            _ => Err(header.unsupported(Self::FAMILY)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::encode::Encoder, InteropError};

    fn v1_record(enc: Encoder, tile: u16, index: &str, count: u32, sample: &str) -> Encoder {
        enc.u16(1)
            .u16(tile)
            .u16(1)
            .string(index)
            .u32(count)
            .string(sample)
            .string("P1")
    }

    #[test]
    fn test_v1_sample_yield() {
        let enc = v1_record(Encoder::new().u8(1), 1101, "AATC", 12345, "S1");
        let metrics = IndexMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.version(), 1);
        match &metrics {
            IndexMetrics::V1 { records } => {
                let rec = &records[0];
                assert_eq!(rec.id, LaneTile::new(1, 1101));
                assert_eq!(rec.read, 1);
                assert_eq!(rec.index_name, "AATC");
                assert_eq!(rec.sample_name, "S1");
                assert_eq!(rec.project_name, "P1");
            }
            _ => panic!("Expected version 1"),
        }
        assert_eq!(metrics.sample_yield()["S1"], 12345);
        assert_eq!(metrics.total_yield(), 12345);
    }

    #[test]
    fn test_v1_groups_by_sample() {
        let mut enc = Encoder::new().u8(1);
        enc = v1_record(enc, 1101, "AATC", 100, "S1");
        enc = v1_record(enc, 1102, "AATC", 200, "S1");
        enc = v1_record(enc, 1101, "GGCA-TTAG", 700, "S2");
        let metrics = IndexMetrics::from_bytes(&enc.finish()).unwrap();

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics.total_yield(), 1000);
        let yields = metrics.sample_yield();
        assert_eq!(yields["S1"], 300);
        assert_eq!(yields["S2"], 700);
        let fractions = metrics.sample_fractions();
        assert!((fractions["S1"] - 0.3).abs() < 1e-12);
        assert!((fractions["S2"] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_v2_wide_fields() {
        let big = u32::MAX as u64 + 10;
        let enc = Encoder::new()
            .u8(2)
            .u16(3)
            .u32(2_101_101)
            .u16(2)
            .string("ACGTACGT")
            .u64(big)
            .string("Sample-A")
            .string("");
        let metrics = IndexMetrics::from_bytes(&enc.finish()).unwrap();

        match &metrics {
            IndexMetrics::V2 { records } => {
                assert_eq!(records[0].id.key(), (3, 2_101_101));
                assert_eq!(records[0].cluster_count, big);
                assert_eq!(records[0].project_name, "");
            }
            _ => panic!("Expected version 2"),
        }
        assert_eq!(metrics.sample_yield()["Sample-A"], big);
    }

    #[test]
    fn test_empty_file_has_no_fractions() {
        let metrics = IndexMetrics::from_bytes(&[1]).unwrap();
        assert!(metrics.is_empty());
        assert_eq!(metrics.total_yield(), 0);
        assert!(metrics.sample_fractions().is_empty());
    }

    #[test]
    fn test_truncated_name() {
        let enc = Encoder::new()
            .u8(1)
            .u16(1)
            .u16(1)
            .u16(1)
            .u16(8)
            .bytes(b"AAT");
        let result = IndexMetrics::from_bytes(&enc.finish());
        assert!(matches!(result, Err(InteropError::TruncatedRecord { pos: 1 })));
    }

    #[test]
    fn test_unsupported_version() {
        let result = IndexMetrics::from_bytes(&[3]);
        assert!(matches!(
            result,
            Err(InteropError::UnsupportedVersion {
                family: MetricFamily::Index,
                version: 3
            })
        ));
    }
}
