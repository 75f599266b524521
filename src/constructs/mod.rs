mod family;
mod header;
mod identity;

pub(crate) use header::in_header;
pub use family::MetricFamily;
pub use header::Header;
pub use identity::{LaneTile, LaneTileCycle, TileId};
