//! Per-lane aggregation of tile metrics.

use std::collections::BTreeMap;

use crate::{RunningSummary, TileMetrics};

/// Cluster, density and alignment figures for one lane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneTileStats {
    pub tile_count: usize,
    pub cluster_count: f64,
    pub cluster_count_pf: f64,
    pub density: RunningSummary<f64>,
    pub percent_aligned: RunningSummary<f32>,
}
impl Default for LaneTileStats {
    fn default() -> Self {
        Self {
            tile_count: 0,
            cluster_count: 0.0,
            cluster_count_pf: 0.0,
            density: RunningSummary::new(),
            percent_aligned: RunningSummary::new(),
        }
    }
}
impl LaneTileStats {
    /// Percent of clusters passing filter, `NaN` without clusters.
    pub fn percent_pf(&self) -> f64 {
        if self.cluster_count > 0.0 {
            100.0 * self.cluster_count_pf / self.cluster_count
        } else {
            f64::NAN
        }
    }
}

/// Aggregates tile metrics by lane.
///
/// Density depends on the flow cell type. When the file carries a file-level density
/// (patterned flow cells, version 3) each tile contributes `cluster_count / density`;
/// otherwise each tile's own density value is averaged.
///
/// Percent aligned is averaged over the lane's read records and is `NaN` when the lane
/// has none (the run has not been aligned yet).
pub fn lane_tile_stats(metrics: &TileMetrics) -> BTreeMap<u16, LaneTileStats> {
    let file_density = metrics.file_density();
    let mut lanes: BTreeMap<u16, LaneTileStats> = BTreeMap::new();
    for tile in metrics.tiles() {
        let stats = lanes.entry(tile.lane).or_default();
        stats.tile_count += 1;
        if !tile.cluster_count.is_nan() {
            stats.cluster_count += tile.cluster_count as f64;
        }
        if !tile.cluster_count_pf.is_nan() {
            stats.cluster_count_pf += tile.cluster_count_pf as f64;
        }
        let density = match file_density {
            Some(file_density) => tile.cluster_count as f64 / file_density as f64,
            None => tile.density as f64,
        };
        stats.density.push(density);
    }
    for read in metrics.reads() {
        lanes
            .entry(read.lane)
            .or_default()
            .percent_aligned
            .push(read.percent_aligned);
    }
    lanes
}

/// Mean percent aligned per `(lane, read)`.
pub fn percent_aligned_by_read(metrics: &TileMetrics) -> BTreeMap<(u16, u32), f64> {
    let mut reads: BTreeMap<(u16, u32), RunningSummary<f32>> = BTreeMap::new();
    for read in metrics.reads() {
        reads
            .entry((read.lane, read.read))
            .or_default()
            .push(read.percent_aligned);
    }
    reads
        .into_iter()
        .map(|(key, summary)| (key, summary.mean_or_nan()))
        .collect()
}
