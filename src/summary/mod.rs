//! Aggregation of decoded metrics into per-lane QC summaries.

mod quality;
mod tile;

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    CorrectedIntensityMetrics, ErrorMetrics, ExtendedTileMetrics, RunMetrics, RunningSummary,
    SummaryOptions,
};

pub use quality::{
    max_cycle_by_lane, percent_over_q_by_lane, q_tally_by_lane, total_percent_over_q,
    QualityTally,
};
pub use tile::{lane_tile_stats, percent_aligned_by_read, LaneTileStats};

/// Occupied clusters per lane.
pub fn occupied_by_lane(metrics: &ExtendedTileMetrics) -> BTreeMap<u16, f64> {
    let mut lanes: BTreeMap<u16, f64> = BTreeMap::new();
    for record in metrics.records() {
        if !record.occupied_clusters.is_nan() {
            *lanes.entry(record.lane).or_default() += record.occupied_clusters;
        }
    }
    lanes
}

/// Mean error rate per lane.
pub fn error_rate_by_lane(metrics: &ErrorMetrics) -> BTreeMap<u16, f64> {
    let mut lanes: BTreeMap<u16, RunningSummary<f64>> = BTreeMap::new();
    for record in metrics.records() {
        lanes.entry(record.lane).or_default().push(record.error_rate);
    }
    lanes
        .into_iter()
        .map(|(lane, summary)| (lane, summary.mean_or_nan()))
        .collect()
}

/// `(called bases, no-calls)` per lane.
pub fn called_bases_by_lane(metrics: &CorrectedIntensityMetrics) -> BTreeMap<u16, (u64, u64)> {
    let mut lanes: BTreeMap<u16, (u64, u64)> = BTreeMap::new();
    for record in metrics.iter() {
        let (bases, no_calls) = lanes.entry(record.lane()).or_default();
        *bases += record.base_count();
        *no_calls += record.n_count() as u64;
    }
    lanes
}

/// QC figures for one lane. Figures whose metric family was unavailable are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneSummary {
    pub lane: u16,
    pub tile_count: usize,
    pub cluster_count: f64,
    pub cluster_count_pf: f64,
    pub percent_pf: f64,
    pub density: f64,
    pub density_std_dev: f64,
    pub percent_aligned: f64,
    pub percent_over_q: f64,
    pub occupied_clusters: f64,
    /// Occupied clusters as a percent of the lane's cluster count
    pub percent_occupied: f64,
    pub error_rate: f64,
    pub called_bases: u64,
    pub percent_no_calls: f64,
}
impl LaneSummary {
    fn empty(lane: u16) -> Self {
        Self {
            lane,
            tile_count: 0,
            cluster_count: f64::NAN,
            cluster_count_pf: f64::NAN,
            percent_pf: f64::NAN,
            density: f64::NAN,
            density_std_dev: f64::NAN,
            percent_aligned: f64::NAN,
            percent_over_q: f64::NAN,
            occupied_clusters: f64::NAN,
            percent_occupied: f64::NAN,
            error_rate: f64::NAN,
            called_bases: 0,
            percent_no_calls: f64::NAN,
        }
    }
}

/// Run-level QC report assembled from every family that decoded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub lanes: Vec<LaneSummary>,
    /// Percent of bases at or above the threshold over all lanes
    pub percent_over_q: f64,
    pub q_threshold: u8,
    /// Clusters assigned to samples (index metrics)
    pub total_yield: Option<u64>,
    pub sample_fractions: BTreeMap<String, f64>,
}
impl RunSummary {
    pub fn new(run: &RunMetrics, options: &SummaryOptions) -> Self {
        let tiles = run.tile.as_ref().map(lane_tile_stats).unwrap_or_default();
        let over_q = run
            .quality
            .as_ref()
            .map(|q| percent_over_q_by_lane(q, options.q_threshold, options.exclude_last_cycle))
            .unwrap_or_default();
        let occupied = run
            .extended_tile
            .as_ref()
            .map(occupied_by_lane)
            .unwrap_or_default();
        let errors = run
            .error
            .as_ref()
            .map(error_rate_by_lane)
            .unwrap_or_default();
        let called = run
            .corrected_intensity
            .as_ref()
            .map(called_bases_by_lane)
            .unwrap_or_default();

        let lane_ids: BTreeSet<u16> = tiles
            .keys()
            .chain(over_q.keys())
            .chain(occupied.keys())
            .chain(errors.keys())
            .chain(called.keys())
            .copied()
            .collect();

        let lanes = lane_ids
            .into_iter()
            .map(|lane| {
                let mut summary = LaneSummary::empty(lane);
                if let Some(stats) = tiles.get(&lane) {
                    summary.tile_count = stats.tile_count;
                    summary.cluster_count = stats.cluster_count;
                    summary.cluster_count_pf = stats.cluster_count_pf;
                    summary.percent_pf = stats.percent_pf();
                    summary.density = stats.density.mean_or_nan();
                    summary.density_std_dev = stats.density.std_dev();
                    summary.percent_aligned = stats.percent_aligned.mean_or_nan();
                }
                if let Some(&pct) = over_q.get(&lane) {
                    summary.percent_over_q = pct;
                }
                if let Some(&count) = occupied.get(&lane) {
                    summary.occupied_clusters = count;
                    if summary.cluster_count > 0.0 {
                        summary.percent_occupied = 100.0 * count / summary.cluster_count;
                    }
                }
                if let Some(&rate) = errors.get(&lane) {
                    summary.error_rate = rate;
                }
                if let Some(&(bases, no_calls)) = called.get(&lane) {
                    summary.called_bases = bases;
                    if bases > 0 {
                        summary.percent_no_calls = 100.0 * no_calls as f64 / bases as f64;
                    }
                }
                summary
            })
            .collect();

        let percent_over_q = run
            .quality
            .as_ref()
            .map(|q| total_percent_over_q(q, options.q_threshold, options.exclude_last_cycle))
            .unwrap_or(f64::NAN);

        Self {
            lanes,
            percent_over_q,
            q_threshold: options.q_threshold,
            total_yield: run.index.as_ref().map(|i| i.total_yield()),
            sample_fractions: run
                .index
                .as_ref()
                .map(|i| i.sample_fractions())
                .unwrap_or_default(),
        }
    }

    pub fn lane(&self, lane: u16) -> Option<&LaneSummary> {
        self.lanes.iter().find(|l| l.lane == lane)
    }
}
