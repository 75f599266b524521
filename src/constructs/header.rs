use std::io::BufRead;

use log::{debug, warn};

use crate::{io::ByteCursor, InteropError, MetricFamily, Result};

/// Shared prefix at the start of every metric file.
///
/// The version is not validated here: each family's decoder dispatches on it and
/// reports [`InteropError::UnsupportedVersion`] when it has no layout for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub version: u8,             // Format version, selects the record layout
    pub record_size: Option<u8>, // Bytes per record (absent for index metrics)
}
impl Header {
    pub fn new(version: u8, record_size: Option<u8>) -> Self {
        Self {
            version,
            record_size,
        }
    }

    /// Reads the header for `family` from the start of a metric file.
    pub fn read<R: BufRead>(cursor: &mut ByteCursor<R>, family: MetricFamily) -> Result<Self> {
        let version = in_header(family, cursor.read_u8())?;
        let record_size = if family.has_record_size() {
            Some(in_header(family, cursor.read_u8())?)
        } else {
            None
        };
        debug!(
            "Read {} header: version {}, record size {:?}",
            family, version, record_size
        );
        Ok(Self::new(version, record_size))
    }

    /// Logs a warning when the stored record size disagrees with the layout the
    /// version implies. Decoding still follows the version.
    pub fn check_record_size(&self, family: MetricFamily, expected: usize) {
        if let Some(size) = self.record_size {
            if size as usize != expected {
                warn!(
                    "{} v{} declares {}-byte records, layout is {} bytes",
                    family, self.version, size, expected
                );
            }
        }
    }

    pub fn unsupported(&self, family: MetricFamily) -> InteropError {
        InteropError::UnsupportedVersion {
            family,
            version: self.version,
        }
    }
}

/// Reclassifies a truncation inside the header or a file-level prefix table.
pub(crate) fn in_header<T>(family: MetricFamily, result: Result<T>) -> Result<T> {
    result.map_err(|e| match e {
        InteropError::TruncatedRecord { pos } => InteropError::TruncatedHeader { family, pos },
        e => e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_with_record_size() {
        let bytes = [3u8, 15, 0xAA];
        let mut cursor = ByteCursor::new(&bytes[..]);
        let header = Header::read(&mut cursor, MetricFamily::Tile).unwrap();
        assert_eq!(header, Header::new(3, Some(15)));
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_index_header_has_no_record_size() {
        let bytes = [1u8, 0xAA];
        let mut cursor = ByteCursor::new(&bytes[..]);
        let header = Header::read(&mut cursor, MetricFamily::Index).unwrap();
        assert_eq!(header, Header::new(1, None));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_header_never_validates_version() {
        let bytes = [250u8, 1];
        let mut cursor = ByteCursor::new(&bytes[..]);
        let header = Header::read(&mut cursor, MetricFamily::Quality).unwrap();
        assert_eq!(header.version, 250);
    }

    #[test]
    fn test_truncated_header() {
        let bytes = [2u8];
        let mut cursor = ByteCursor::new(&bytes[..]);
        let result = Header::read(&mut cursor, MetricFamily::Error);
        assert!(matches!(
            result,
            Err(InteropError::TruncatedHeader {
                family: MetricFamily::Error,
                pos: 0
            })
        ));

        let mut cursor = ByteCursor::new(&[0u8; 0][..]);
        assert!(matches!(
            Header::read(&mut cursor, MetricFamily::Index),
            Err(InteropError::TruncatedHeader { .. })
        ));
    }
}
