//! Percent of bases at or above a quality threshold.

use std::collections::BTreeMap;

use crate::QMetrics;

/// Bases at or above the threshold and bases in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualityTally {
    pub above: i64,
    pub total: i64,
}
impl QualityTally {
    /// `NaN` when no bases are in scope.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            f64::NAN
        } else {
            100.0 * self.above as f64 / self.total as f64
        }
    }

    fn add(&mut self, other: QualityTally) {
        self.above += other.above;
        self.total += other.total;
    }
}

/// Highest cycle observed in each lane.
pub fn max_cycle_by_lane(metrics: &QMetrics) -> BTreeMap<u16, u16> {
    let mut cycles: BTreeMap<u16, u16> = BTreeMap::new();
    for record in metrics.iter() {
        let max = cycles.entry(record.lane).or_insert(record.cycle);
        *max = (*max).max(record.cycle);
    }
    cycles
}

/// Tallies bases whose bin lower bound is at least `threshold`, by lane.
///
/// With `exclude_last_cycle` only cycles strictly below the lane's highest observed
/// cycle are counted; the final cycle's metrics are incomplete.
pub fn q_tally_by_lane(
    metrics: &QMetrics,
    threshold: u8,
    exclude_last_cycle: bool,
) -> BTreeMap<u16, QualityTally> {
    let max_cycles = max_cycle_by_lane(metrics);
    let table = metrics.table();
    let mut tallies: BTreeMap<u16, QualityTally> = BTreeMap::new();
    for record in metrics.iter() {
        let tally = tallies.entry(record.lane).or_default();
        if exclude_last_cycle && record.cycle >= max_cycles[&record.lane] {
            continue;
        }
        tally.add(QualityTally {
            above: record.count_at_or_above(table, threshold),
            total: record.total(),
        });
    }
    tallies
}

/// Percent of bases at or above `threshold` per lane.
pub fn percent_over_q_by_lane(
    metrics: &QMetrics,
    threshold: u8,
    exclude_last_cycle: bool,
) -> BTreeMap<u16, f64> {
    q_tally_by_lane(metrics, threshold, exclude_last_cycle)
        .into_iter()
        .map(|(lane, tally)| (lane, tally.percent()))
        .collect()
}

/// Percent of bases at or above `threshold` over every lane.
pub fn total_percent_over_q(metrics: &QMetrics, threshold: u8, exclude_last_cycle: bool) -> f64 {
    let mut total = QualityTally::default();
    for tally in q_tally_by_lane(metrics, threshold, exclude_last_cycle).into_values() {
        total.add(tally);
    }
    total.percent()
}
