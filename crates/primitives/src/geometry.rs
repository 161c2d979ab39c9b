/// Axis-aligned rectangle in display pixels. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
	pub left: i32,
	pub top: i32,
	pub right: i32,
	pub bottom: i32,
}

impl Rect {
	pub const EMPTY: Rect = Rect {
		left: 0,
		top: 0,
		right: 0,
		bottom: 0,
	};

	pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
		Self { left, top, right, bottom }
	}

	/// Rectangle at the origin with the given size.
	pub const fn sized(size: Size) -> Self {
		Self::new(0, 0, size.width, size.height)
	}

	pub const fn width(&self) -> i32 {
		self.right - self.left
	}

	pub const fn height(&self) -> i32 {
		self.bottom - self.top
	}

	pub const fn is_empty(&self) -> bool {
		self.left >= self.right || self.top >= self.bottom
	}

	pub const fn size(&self) -> Size {
		Size {
			width: self.width(),
			height: self.height(),
		}
	}
}

/// Width and height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
	pub width: i32,
	pub height: i32,
}

impl Size {
	pub const fn new(width: i32, height: i32) -> Self {
		Self { width, height }
	}

	/// Swaps width and height, as a quarter-turn rotation does.
	pub const fn transposed(self) -> Self {
		Self {
			width: self.height,
			height: self.width,
		}
	}
}
