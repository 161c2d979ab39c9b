use foyer_primitives::{Configuration, DisplayId, Rect, Rotation, ScreenOrientation, Size};

/// Window-side state of one display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayContent {
	pub id: DisplayId,
	/// Size in the natural (unrotated) orientation.
	pub base: Size,
	pub density_dpi: u32,
	pub rotation: Rotation,
	/// Orientation last derived from the visible app tokens.
	pub last_orientation: ScreenOrientation,
	pub config: Configuration,
	/// A rotation update arrived while updates were deferred.
	pub pending_rotation_update: bool,
	/// Owner uid of a private display; `None` for public displays.
	pub owner_uid: Option<foyer_primitives::Uid>,
}

impl DisplayContent {
	pub fn new(id: DisplayId, base: Size, density_dpi: u32) -> Self {
		let mut display = Self {
			id,
			base,
			density_dpi,
			rotation: Rotation::Rot0,
			last_orientation: ScreenOrientation::Unspecified,
			config: Configuration::default(),
			pending_rotation_update: false,
			owner_uid: None,
		};
		display.recompute_config();
		display
	}

	/// Size as currently rotated.
	pub fn size(&self) -> Size {
		if self.rotation.is_quarter_turn() { self.base.transposed() } else { self.base }
	}

	pub fn bounds(&self) -> Rect {
		Rect::sized(self.size())
	}

	/// Rebuilds the configuration from rotation and size. Bumps `seq` only
	/// when something visible changed.
	pub fn recompute_config(&mut self) -> bool {
		let size = self.size();
		let next = Configuration {
			seq: self.config.seq,
			rotation: self.rotation,
			orientation: if size.width > size.height {
				ScreenOrientation::Landscape
			} else {
				ScreenOrientation::Portrait
			},
			app_bounds: Rect::sized(size),
			density_dpi: self.density_dpi,
		};
		if next.differs_from(&self.config) || self.config.seq == 0 {
			self.config = Configuration { seq: self.config.seq + 1, ..next };
			true
		} else {
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn quarter_turn_swaps_bounds_and_bumps_seq() {
		let mut d = DisplayContent::new(DisplayId::DEFAULT, Size::new(1080, 1920), 420);
		let seq = d.config.seq;
		assert_eq!(d.config.orientation, ScreenOrientation::Portrait);
		assert!(!d.recompute_config());
		d.rotation = Rotation::Rot90;
		assert!(d.recompute_config());
		assert_eq!(d.config.seq, seq + 1);
		assert_eq!(d.config.app_bounds, Rect::new(0, 0, 1920, 1080));
		assert_eq!(d.config.orientation, ScreenOrientation::Landscape);
	}
}
