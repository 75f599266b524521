//! Run directory layout and summary options.

use std::path::{Path, PathBuf};

use crate::MetricFamily;

/// Default Q-score threshold for percent-bases-over-Q.
pub const DEFAULT_Q_THRESHOLD: u8 = 30;

/// Where the metric files of a run live.
///
/// # Examples
///
/// ```rust
/// use interop::{MetricFamily, RunLayout};
///
/// let layout = RunLayout::default()
///     .with_file_name(MetricFamily::Tile, "TileMetrics.bin");
/// let path = layout.path_for("/runs/A", MetricFamily::Tile);
/// assert!(path.ends_with("InterOp/TileMetrics.bin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunLayout {
    pub interop_dir: String,
    pub tile: String,
    pub quality: String,
    pub error: String,
    pub index: String,
    pub extended_tile: String,
    pub corrected_intensity: String,
}

impl Default for RunLayout {
    fn default() -> Self {
        Self {
            interop_dir: "InterOp".to_string(),
            tile: MetricFamily::Tile.default_file_name().to_string(),
            quality: MetricFamily::Quality.default_file_name().to_string(),
            error: MetricFamily::Error.default_file_name().to_string(),
            index: MetricFamily::Index.default_file_name().to_string(),
            extended_tile: MetricFamily::ExtendedTile.default_file_name().to_string(),
            corrected_intensity: MetricFamily::CorrectedIntensity
                .default_file_name()
                .to_string(),
        }
    }
}

impl RunLayout {
    pub fn with_interop_dir(mut self, dir: impl Into<String>) -> Self {
        self.interop_dir = dir.into();
        self
    }

    pub fn with_file_name(mut self, family: MetricFamily, name: impl Into<String>) -> Self {
        *self.file_name_mut(family) = name.into();
        self
    }

    pub fn file_name(&self, family: MetricFamily) -> &str {
        match family {
            MetricFamily::Tile => &self.tile,
            MetricFamily::Quality => &self.quality,
            MetricFamily::Error => &self.error,
            MetricFamily::Index => &self.index,
            MetricFamily::ExtendedTile => &self.extended_tile,
            MetricFamily::CorrectedIntensity => &self.corrected_intensity,
        }
    }

    fn file_name_mut(&mut self, family: MetricFamily) -> &mut String {
        match family {
            MetricFamily::Tile => &mut self.tile,
            MetricFamily::Quality => &mut self.quality,
            MetricFamily::Error => &mut self.error,
            MetricFamily::Index => &mut self.index,
            MetricFamily::ExtendedTile => &mut self.extended_tile,
            MetricFamily::CorrectedIntensity => &mut self.corrected_intensity,
        }
    }

    /// Full path of `family`'s file inside `run_dir`.
    pub fn path_for<P: AsRef<Path>>(&self, run_dir: P, family: MetricFamily) -> PathBuf {
        run_dir
            .as_ref()
            .join(&self.interop_dir)
            .join(self.file_name(family))
    }
}

/// Knobs for [`RunSummary`](crate::RunSummary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryOptions {
    /// Bins whose lower bound is at least this count as high quality.
    pub q_threshold: u8,
    /// Drop each lane's final cycle from percent-over-Q; its metrics are incomplete.
    pub exclude_last_cycle: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            q_threshold: DEFAULT_Q_THRESHOLD,
            exclude_last_cycle: true,
        }
    }
}

impl SummaryOptions {
    pub fn with_q_threshold(mut self, q_threshold: u8) -> Self {
        self.q_threshold = q_threshold;
        self
    }

    pub fn with_exclude_last_cycle(mut self, exclude: bool) -> Self {
        self.exclude_last_cycle = exclude;
        self
    }
}
