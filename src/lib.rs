//! # interop - Decoding Illumina InterOp Run Metrics
//!
//! `interop` is a Rust library for reading the binary InterOp metric files an Illumina
//! sequencer writes into a run's `InterOp/` directory, and for rolling them up into
//! per-lane QC summaries (cluster counts, density, percent passing filter, percent
//! aligned, percent of bases at or above a Q-score, error rate, index yield).
//!
//! ## Format Overview
//!
//! Every metric file is little-endian and starts with a short header:
//!
//! - Version: `u8`, selects the record layout
//! - Record size: `u8`, byte width of one record (absent in index metrics)
//!
//! Some versions follow the header with a file-level table (quality bins, adapter
//! sequences, a file-wide density). Records then repeat until the end of the file. A
//! file that ends partway through a record is an error; one that ends exactly on a
//! record boundary is complete.
//!
//! | Family | File | Versions |
//! |---|---|---|
//! | [`TileMetrics`] | `TileMetricsOut.bin` | 2, 3 |
//! | [`QMetrics`] | `QMetricsOut.bin` | 4, 6, 7 |
//! | [`ErrorMetrics`] | `ErrorMetricsOut.bin` | 3, 6 |
//! | [`IndexMetrics`] | `IndexMetricsOut.bin` | 1, 2 |
//! | [`ExtendedTileMetrics`] | `ExtendedTileMetricsOut.bin` | 1, 3 |
//! | [`CorrectedIntensityMetrics`] | `CorrectedIntMetricsOut.bin` | 2, 3, 4 |
//!
//! ## Basic Usage
//!
//! ### Decoding a Single File
//!
//! ```rust
//! use interop::{MetricSet, TileMetrics};
//!
//! # fn main() -> interop::Result<()> {
//! // Version 2: one (lane, tile, code, value) record of 10 bytes
//! let bytes = [
//!     2, 10, // header
//!     1, 0, 0x4D, 0x04, // lane 1, tile 1101
//!     102, 0, // code 102: cluster count
//!     0x00, 0x00, 0x7A, 0x44, // 1000.0
//! ];
//! let metrics = TileMetrics::from_bytes(&bytes)?;
//! let tile = metrics.tiles().next().unwrap();
//! assert_eq!(tile.tile, 1101);
//! assert_eq!(tile.cluster_count, 1000.0);
//! # Ok(())
//! # }
//! ```
//!
//! ### Summarizing a Run
//!
//! ```rust,no_run
//! use interop::{RunLayout, RunMetrics, SummaryOptions};
//!
//! // Families are decoded concurrently; 0 = use all available cores
//! let run = RunMetrics::load("/runs/240101_M00001_0001", &RunLayout::default(), 0);
//! let summary = run.summarize(&SummaryOptions::default().with_q_threshold(30));
//! for lane in &summary.lanes {
//!     println!(
//!         "lane {}: {:.1}% PF, {:.1}% >= Q30",
//!         lane.lane, lane.percent_pf, lane.percent_over_q
//!     );
//! }
//! ```
//!
//! ### Compressed and Memory-Mapped Files
//!
//! [`MetricSet::from_path`] transparently decompresses gzip, bzip2, xz and zstd files
//! when the `niffler` feature is enabled (the default). [`MetricSet::from_mmap`] maps an
//! uncompressed file instead of streaming it.
//!
//! ```rust,no_run
//! use interop::{MetricSet, QMetrics};
//!
//! # fn main() -> interop::Result<()> {
//! let streamed = QMetrics::from_path("InterOp/QMetricsOut.bin.gz")?;
//! let mapped = QMetrics::from_mmap("InterOp/QMetricsOut.bin")?;
//! println!("{} / {} records", streamed.len(), mapped.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All decoding returns `Result<T, InteropError>`. Errors are scoped to one file:
//! [`RunMetrics::load`] records a failed family in [`RunMetrics::failures`] and keeps
//! the others.
//!
//! ```rust
//! use interop::{InteropError, MetricSet, TileMetrics};
//!
//! # fn main() {
//! // A record cut short after 4 of its 10 bytes
//! let bytes = [2, 10, 1, 0, 0x4D, 0x04];
//!
//! match TileMetrics::from_bytes(&bytes) {
//!     Err(InteropError::TruncatedRecord { pos }) => {
//!         println!("Truncated record starting at byte {}", pos);
//!     }
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! # }
//! ```

mod config;
mod constructs;
mod error;
mod imaging;
mod io;
mod metrics;
mod parallel;
mod run;
mod stats;
mod summary;

pub use config::{RunLayout, SummaryOptions, DEFAULT_Q_THRESHOLD};
pub use constructs::{Header, LaneTile, LaneTileCycle, MetricFamily, TileId};
pub use error::{InteropError, Result};
pub use imaging::{expand_header, summarize_tiles, ImagingRow, ImagingTable, TileSummary};
pub use io::{open_path, BoxedReader, ByteCursor, MappedFile};
pub use metrics::{
    AdapterTable, BinTable, CalledCounts, CorrectedIntensityMetrics, CorrectedIntensityRecord,
    CorrectedIntensityV2, CorrectedIntensityV3, CorrectedIntensityV4, ErrorMetrics,
    ErrorRecord, ErrorRecordV3, ErrorRecordV6, ExtendedTileMetrics, ExtendedTileRecord,
    ExtendedTileV1, ExtendedTileV3, IndexMetrics, IndexRecord, MetricSet, QBin, QMetrics,
    QRecord, QRecordRef, TileCode, TileMetrics, TileReadRecordV2, TileReadRecordV3, TileReadRef,
    TileRecordV2, TileRecordV3, TileRef, DEFAULT_BIN_COUNT,
};
pub use parallel::{parallel_map, resolve_threads};
pub use run::{FamilyFailure, RunMetrics};
pub use stats::{Numeric, RunningAverage, RunningSummary, RunningVariance};
pub use summary::{
    called_bases_by_lane, error_rate_by_lane, lane_tile_stats, max_cycle_by_lane,
    occupied_by_lane, percent_aligned_by_read, percent_over_q_by_lane, q_tally_by_lane,
    total_percent_over_q, LaneSummary, LaneTileStats, QualityTally, RunSummary,
};
