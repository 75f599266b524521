//! Error handling for the interop library.
//!
//! This module defines all error types that can occur while decoding InterOp metric
//! files, parsing imaging tables, and loading whole run directories.

use thiserror::Error;

use crate::MetricFamily;

/// A specialized `Result` type for interop operations.
///
/// It's equivalent to `std::result::Result<T, InteropError>`.
///
/// # Examples
///
/// ```rust
/// use interop::{MetricSet, Result, TileMetrics};
///
/// fn count_tiles(bytes: &[u8]) -> Result<usize> {
///     let metrics = TileMetrics::from_bytes(bytes)?;
///     Ok(metrics.tile_count())
/// }
/// ```
pub type Result<T> = std::result::Result<T, InteropError>;

/// Error types for interop operations.
///
/// Every decode failure is scoped to a single metric file: the caller decides whether
/// to skip that family and keep its siblings (what [`RunMetrics`](crate::RunMetrics)
/// does) or abort.
///
/// # Examples
///
/// ```rust
/// use interop::{InteropError, MetricSet, TileMetrics};
///
/// // Version 9 tile metrics do not exist
/// let bytes = [9u8, 10];
/// match TileMetrics::from_bytes(&bytes) {
///     Err(InteropError::UnsupportedVersion { family, version }) => {
///         println!("{family}: no decoder for version {version}");
///     }
///     Err(e) => println!("Other error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum InteropError {
    /// I/O error from the underlying reader.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Decompression error from niffler when opening a compressed metric file.
    #[cfg(feature = "niffler")]
    #[error("Niffler error")]
    Niffler(#[from] niffler::Error),

    /// Malformed CSV in an imaging table.
    #[error("CSV error")]
    Csv(#[from] csv::Error),

    /// The header names a format version that has no decoder.
    ///
    /// Fatal for this file only; sibling metric files may still decode.
    #[error("Unsupported {family} version ({version})")]
    UnsupportedVersion { family: MetricFamily, version: u8 },

    /// The file ended before its header (or file-level prefix table) was complete.
    #[error("Truncated {family} header at position {pos}")]
    TruncatedHeader { family: MetricFamily, pos: usize },

    /// The stream ended partway through the record starting at `pos`.
    #[error("Truncated record at position {pos}")]
    TruncatedRecord { pos: usize },

    /// An in-record code or tag does not match any known case for the active version.
    #[error("Invalid {family} code ({code}) in record at position {pos}")]
    InvalidDiscriminator {
        family: MetricFamily,
        code: u16,
        pos: usize,
    },

    /// A tile metric code was seen twice for the same tile.
    #[error("Duplicate code ({code}) for lane {lane} tile {tile}")]
    DuplicateField { lane: u16, tile: u32, code: u16 },

    /// An imaging table header lacks one of `Lane`, `Tile`, `Cycle` or `Read`.
    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    /// A cell in an imaging table could not be parsed as a number.
    #[error("Invalid value ({value}) in column {column}")]
    InvalidValue { column: String, value: String },

    /// The imaging table contains no header line.
    #[error("Imaging table has no header line")]
    MissingHeaderLine,
}

impl InteropError {
    /// Returns true for errors caused by damaged or unknown file contents rather than
    /// by the environment (I/O, decompression).
    pub fn is_corrupt_input(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion { .. }
                | Self::TruncatedHeader { .. }
                | Self::TruncatedRecord { .. }
                | Self::InvalidDiscriminator { .. }
                | Self::DuplicateField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_display_messages() {
        let err = InteropError::UnsupportedVersion {
            family: MetricFamily::Tile,
            version: 9,
        };
        let display = format!("{}", err);
        assert!(display.contains("tile metrics"));
        assert!(display.contains("(9)"));

        let err = InteropError::TruncatedRecord { pos: 1024 };
        assert!(format!("{}", err).contains("1024"));

        let err = InteropError::InvalidDiscriminator {
            family: MetricFamily::ExtendedTile,
            code: 7,
            pos: 12,
        };
        let display = format!("{}", err);
        assert!(display.contains("extended tile metrics"));
        assert!(display.contains("(7)"));
        assert!(display.contains("12"));

        let err = InteropError::DuplicateField {
            lane: 1,
            tile: 1101,
            code: 102,
        };
        let display = format!("{}", err);
        assert!(display.contains("102"));
        assert!(display.contains("1101"));

        let err = InteropError::MissingRequiredColumn("Lane".to_string());
        assert!(format!("{}", err).contains("Lane"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: InteropError = io_err.into();

        match err {
            InteropError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Access denied");
        let err = InteropError::Io(io_err);

        let source = err.source();
        assert!(source.is_some());

        if let Some(source) = source {
            let io_source = source.downcast_ref::<std::io::Error>();
            assert!(io_source.is_some());
            assert_eq!(
                io_source.unwrap().kind(),
                std::io::ErrorKind::PermissionDenied
            );
        }
    }

    #[test]
    fn test_corrupt_input_classification() {
        assert!(InteropError::TruncatedRecord { pos: 0 }.is_corrupt_input());
        assert!(InteropError::DuplicateField {
            lane: 1,
            tile: 1,
            code: 100
        }
        .is_corrupt_input());
        let io_err = std::io::Error::other("disk on fire");
        assert!(!InteropError::Io(io_err).is_corrupt_input());
        assert!(!InteropError::MissingHeaderLine.is_corrupt_input());
    }

    #[test]
    fn test_error_send_sync() {
        fn is_send<T: Send>() {}
        fn is_sync<T: Sync>() {}

        is_send::<InteropError>();
        is_sync::<InteropError>();
    }
}
