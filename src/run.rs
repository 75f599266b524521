//! Loading every metric family of a run directory.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::{
    parallel::parallel_map, CorrectedIntensityMetrics, ErrorMetrics, ExtendedTileMetrics,
    IndexMetrics, InteropError, MetricFamily, MetricSet, QMetrics, Result, RunLayout,
    RunSummary, SummaryOptions, TileMetrics,
};

/// A metric family that was present but could not be decoded.
#[derive(Debug)]
pub struct FamilyFailure {
    pub family: MetricFamily,
    pub path: PathBuf,
    pub error: InteropError,
}

/// Every metric family decoded from one run.
///
/// A family is `None` when its file is absent. A family whose file exists but fails to
/// decode is also `None` and is recorded in [`RunMetrics::failures`]; the other
/// families are unaffected.
#[derive(Debug, Default)]
pub struct RunMetrics {
    pub tile: Option<TileMetrics>,
    pub quality: Option<QMetrics>,
    pub error: Option<ErrorMetrics>,
    pub index: Option<IndexMetrics>,
    pub extended_tile: Option<ExtendedTileMetrics>,
    pub corrected_intensity: Option<CorrectedIntensityMetrics>,
    pub failures: Vec<FamilyFailure>,
}

enum Decoded {
    Tile(TileMetrics),
    Quality(QMetrics),
    Error(ErrorMetrics),
    Index(IndexMetrics),
    ExtendedTile(ExtendedTileMetrics),
    CorrectedIntensity(CorrectedIntensityMetrics),
}
impl Decoded {
    fn version(&self) -> u8 {
        match self {
            Self::Tile(m) => m.version(),
            Self::Quality(m) => m.version(),
            Self::Error(m) => m.version(),
            Self::Index(m) => m.version(),
            Self::ExtendedTile(m) => m.version(),
            Self::CorrectedIntensity(m) => m.version(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Tile(m) => m.len(),
            Self::Quality(m) => m.len(),
            Self::Error(m) => m.len(),
            Self::Index(m) => m.len(),
            Self::ExtendedTile(m) => m.len(),
            Self::CorrectedIntensity(m) => m.len(),
        }
    }
}

fn decode_family(family: MetricFamily, path: &Path) -> Result<Decoded> {
    Ok(match family {
        MetricFamily::Tile => Decoded::Tile(TileMetrics::from_path(path)?),
        MetricFamily::Quality => Decoded::Quality(QMetrics::from_path(path)?),
        MetricFamily::Error => Decoded::Error(ErrorMetrics::from_path(path)?),
        MetricFamily::Index => Decoded::Index(IndexMetrics::from_path(path)?),
        MetricFamily::ExtendedTile => Decoded::ExtendedTile(ExtendedTileMetrics::from_path(path)?),
        MetricFamily::CorrectedIntensity => {
            Decoded::CorrectedIntensity(CorrectedIntensityMetrics::from_path(path)?)
        }
    })
}

impl RunMetrics {
    /// Decodes the families found under `run_dir`, one thread per family up to
    /// `num_threads` (`0` for all cores).
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use interop::{RunLayout, RunMetrics, RunSummary, SummaryOptions};
    ///
    /// let run = RunMetrics::load("/runs/240101_M00001_0001", &RunLayout::default(), 0);
    /// for failure in &run.failures {
    ///     eprintln!("skipped {}: {}", failure.family, failure.error);
    /// }
    /// let summary = RunSummary::new(&run, &SummaryOptions::default());
    /// ```
    pub fn load<P: AsRef<Path>>(run_dir: P, layout: &RunLayout, num_threads: usize) -> Self {
        let run_dir = run_dir.as_ref();
        let jobs: Vec<(MetricFamily, PathBuf)> = MetricFamily::ALL
            .iter()
            .map(|&family| (family, layout.path_for(run_dir, family)))
            .collect();

        let results = parallel_map(&jobs, num_threads, |(family, path)| {
            if !path.is_file() {
                debug!("No {} at {}", family, path.display());
                return None;
            }
            Some(decode_family(*family, path))
        });

        let mut run = Self::default();
        for ((family, path), result) in jobs.into_iter().zip(results) {
            match result {
                None => {}
                Some(Ok(decoded)) => {
                    info!(
                        "Loaded {} v{} ({} records) from {}",
                        family,
                        decoded.version(),
                        decoded.len(),
                        path.display()
                    );
                    run.insert(decoded);
                }
                Some(Err(error)) => {
                    warn!("Skipping {} at {}: {}", family, path.display(), error);
                    run.failures.push(FamilyFailure {
                        family,
                        path,
                        error,
                    });
                }
            }
        }
        run
    }

    fn insert(&mut self, decoded: Decoded) {
        match decoded {
            Decoded::Tile(m) => self.tile = Some(m),
            Decoded::Quality(m) => self.quality = Some(m),
            Decoded::Error(m) => self.error = Some(m),
            Decoded::Index(m) => self.index = Some(m),
            Decoded::ExtendedTile(m) => self.extended_tile = Some(m),
            Decoded::CorrectedIntensity(m) => self.corrected_intensity = Some(m),
        }
    }

    /// Families that decoded successfully.
    pub fn loaded(&self) -> Vec<MetricFamily> {
        let present = [
            self.tile.is_some(),
            self.quality.is_some(),
            self.error.is_some(),
            self.index.is_some(),
            self.extended_tile.is_some(),
            self.corrected_intensity.is_some(),
        ];
        MetricFamily::ALL
            .iter()
            .zip(present)
            .filter_map(|(&family, present)| present.then_some(family))
            .collect()
    }

    pub fn summarize(&self, options: &SummaryOptions) -> RunSummary {
        RunSummary::new(self, options)
    }
}
