//! Openers for metric files and imaging tables.
//!
//! InterOp files are often archived compressed; with the `niffler` feature enabled the
//! openers transparently decompress gzip/zstd input before decoding.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::Result;

const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;
#[cfg(feature = "niffler")]
const MIN_SNIFF_LEN: u64 = 5;
pub type BoxedReader = Box<dyn Read + Send>;

/// Opens a file for decoding with buffered I/O.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - Decompression fails (for compressed files)
///
/// # Examples
///
/// ```rust,no_run
/// use interop::{open_path, MetricSet, TileMetrics};
///
/// # fn main() -> interop::Result<()> {
/// let reader = open_path("InterOp/TileMetricsOut.bin.gz")?;
/// let metrics = TileMetrics::from_reader(reader)?;
/// println!("{} tiles", metrics.tile_count());
/// # Ok(())
/// # }
/// ```
pub fn open_path<P: AsRef<Path>>(path: P) -> Result<BufReader<BoxedReader>> {
    let file = File::open(path)?;

    #[cfg(feature = "niffler")]
    {
        // Too short to carry a compression magic number; sniffing would reject it.
        if file.metadata()?.len() < MIN_SNIFF_LEN {
            let pt: BoxedReader = Box::new(file);
            return Ok(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, pt));
        }
        let (pt, _format) = niffler::send::get_reader(Box::new(BufReader::new(file)))?;
        Ok(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, pt))
    }
    #[cfg(not(feature = "niffler"))]
    {
        let pt: BoxedReader = Box::new(BufReader::new(file));
        Ok(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, pt))
    }
}
