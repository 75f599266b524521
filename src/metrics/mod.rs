//! Decoders for the six InterOp metric families.
//!
//! Each family is a small state machine: read the [`Header`](crate::Header), read any
//! file-level prefix table, then decode records until the stream ends cleanly on a
//! record boundary. Version dispatch is a `match` on the header version; a version
//! with no arm is an [`UnsupportedVersion`](crate::InteropError::UnsupportedVersion)
//! error for that file only.

mod corrected_intensity;
mod error_metrics;
mod extended_tile;
mod index;
mod quality;
mod tile;

use std::{
    io::{BufRead, BufReader, Read},
    path::Path,
};

use crate::{
    io::{open_path, ByteCursor, MappedFile},
    MetricFamily, Result,
};

pub use corrected_intensity::{
    CalledCounts, CorrectedIntensityMetrics, CorrectedIntensityRecord, CorrectedIntensityV2,
    CorrectedIntensityV3, CorrectedIntensityV4,
};
pub use error_metrics::{AdapterTable, ErrorMetrics, ErrorRecord, ErrorRecordV3, ErrorRecordV6};
pub use extended_tile::{ExtendedTileMetrics, ExtendedTileRecord, ExtendedTileV1, ExtendedTileV3};
pub use index::{IndexMetrics, IndexRecord};
pub use quality::{BinTable, QBin, QMetrics, QRecord, QRecordRef, DEFAULT_BIN_COUNT};
pub use tile::{
    TileCode, TileMetrics, TileReadRecordV2, TileReadRecordV3, TileReadRef, TileRecordV2,
    TileRecordV3, TileRef,
};

/// A decoded metric file.
///
/// Implementors provide [`MetricSet::decode`]; the constructors for readers, byte
/// slices, paths and memory maps are shared.
///
/// # Examples
///
/// ```rust,no_run
/// use interop::{MetricSet, QMetrics};
///
/// # fn main() -> interop::Result<()> {
/// let metrics = QMetrics::from_path("InterOp/QMetricsOut.bin")?;
/// println!("{} records over {} bins", metrics.len(), metrics.bin_count());
/// # Ok(())
/// # }
/// ```
pub trait MetricSet: Sized {
    /// Family this set belongs to, used in errors and logging.
    const FAMILY: MetricFamily;

    /// Decodes a complete metric file from the start of `cursor`.
    fn decode<R: BufRead>(cursor: &mut ByteCursor<R>) -> Result<Self>;

    fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut cursor = ByteCursor::new(BufReader::new(reader));
        Self::decode(&mut cursor)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);
        Self::decode(&mut cursor)
    }

    /// Opens and decodes a file, decompressing it if needed.
    fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut cursor = ByteCursor::new(open_path(path)?);
        Self::decode(&mut cursor)
    }

    /// Decodes an uncompressed file through a memory map.
    fn from_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mapped = MappedFile::open(path)?;
        Self::from_bytes(mapped.bytes())
    }
}

/// Reads records with `read_record` until the stream ends on a record boundary.
pub(crate) fn read_records<R, T, F>(cursor: &mut ByteCursor<R>, mut read_record: F) -> Result<Vec<T>>
where
    R: BufRead,
    F: FnMut(&mut ByteCursor<R>) -> Result<T>,
{
    let mut records = Vec::new();
    while cursor.next_record()? {
        records.push(read_record(cursor)?);
    }
    Ok(records)
}
