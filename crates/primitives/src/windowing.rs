/// How a stack's tasks are arranged on its display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowingMode {
	#[default]
	Undefined,
	Fullscreen,
	/// Picture-in-picture. A pinned stack holds at most one task.
	Pinned,
	SplitScreenPrimary,
	SplitScreenSecondary,
	Freeform,
}

impl WindowingMode {
	pub const fn is_split_screen(self) -> bool {
		matches!(self, Self::SplitScreenPrimary | Self::SplitScreenSecondary)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Fullscreen => "fullscreen",
			Self::Pinned => "pinned",
			Self::SplitScreenPrimary => "split-screen-primary",
			Self::SplitScreenSecondary => "split-screen-secondary",
			Self::Freeform => "freeform",
		}
	}
}

/// Display rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
	#[default]
	Rot0,
	Rot90,
	Rot180,
	Rot270,
}

impl Rotation {
	/// Returns `true` when width and height are swapped relative to the natural orientation.
	pub const fn is_quarter_turn(self) -> bool {
		matches!(self, Self::Rot90 | Self::Rot270)
	}

	pub const fn degrees(self) -> u16 {
		match self {
			Self::Rot0 => 0,
			Self::Rot90 => 90,
			Self::Rot180 => 180,
			Self::Rot270 => 270,
		}
	}
}

/// Orientation requested by a window or an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenOrientation {
	#[default]
	Unspecified,
	Portrait,
	Landscape,
	ReversePortrait,
	ReverseLandscape,
	/// Follow the sensor.
	Sensor,
	/// Inherit from whatever is below.
	Behind,
	/// Keep the current rotation.
	Locked,
}

impl ScreenOrientation {
	/// Returns `true` when this request does not pin a rotation by itself.
	pub const fn is_deferring(self) -> bool {
		matches!(self, Self::Unspecified | Self::Behind)
	}
}

/// App transition requested when the task hierarchy changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transit {
	#[default]
	None,
	ActivityOpen,
	ActivityClose,
	TaskOpen,
	TaskClose,
	TaskToFront,
	TaskOpenBehind,
}

impl Transit {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::ActivityOpen => "activity-open",
			Self::ActivityClose => "activity-close",
			Self::TaskOpen => "task-open",
			Self::TaskClose => "task-close",
			Self::TaskToFront => "task-to-front",
			Self::TaskOpenBehind => "task-open-behind",
		}
	}
}
