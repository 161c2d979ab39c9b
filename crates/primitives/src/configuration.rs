use crate::geometry::Rect;
use crate::windowing::{Rotation, ScreenOrientation};

/// Global configuration snapshot handed to clients after relayout.
///
/// `seq` grows with every change so clients can discard stale snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Configuration {
	pub seq: u64,
	pub rotation: Rotation,
	/// Either `Portrait` or `Landscape` once computed.
	pub orientation: ScreenOrientation,
	pub app_bounds: Rect,
	pub density_dpi: u32,
}

impl Configuration {
	/// Returns `true` if any field other than `seq` differs.
	pub fn differs_from(&self, other: &Configuration) -> bool {
		self.rotation != other.rotation || self.orientation != other.orientation || self.app_bounds != other.app_bounds || self.density_dpi != other.density_dpi
	}
}
