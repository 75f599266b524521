use std::fmt;

/// The six InterOp metric families written by the instrument, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricFamily {
    Tile,
    Quality,
    Error,
    Index,
    ExtendedTile,
    CorrectedIntensity,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 6] = [
        MetricFamily::Tile,
        MetricFamily::Quality,
        MetricFamily::Error,
        MetricFamily::Index,
        MetricFamily::ExtendedTile,
        MetricFamily::CorrectedIntensity,
    ];

    /// File name the instrument uses for this family inside `InterOp/`.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::Tile => "TileMetricsOut.bin",
            Self::Quality => "QMetricsOut.bin",
            Self::Error => "ErrorMetricsOut.bin",
            Self::Index => "IndexMetricsOut.bin",
            Self::ExtendedTile => "ExtendedTileMetricsOut.bin",
            Self::CorrectedIntensity => "CorrectedIntMetricsOut.bin",
        }
    }

    /// Index metrics carry no record-size byte after the version.
    pub fn has_record_size(&self) -> bool {
        !matches!(self, Self::Index)
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tile => "tile metrics",
            Self::Quality => "quality metrics",
            Self::Error => "error metrics",
            Self::Index => "index metrics",
            Self::ExtendedTile => "extended tile metrics",
            Self::CorrectedIntensity => "corrected intensity metrics",
        };
        f.write_str(name)
    }
}
