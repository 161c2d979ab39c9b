//! Window vocabulary: types, layout parameters and the flag words that
//! travel with them.

use std::fmt;

use foyer_primitives::{DisplayId, Size, TokenKey};

/// Raw window type.
///
/// Types are partitioned into three ranges: application windows
/// (`1..=99`), sub-windows attached to a parent (`1000..=1999`) and system
/// windows (`2000..=2999`). Codes outside every range are rejected on add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowType(pub u32);

impl WindowType {
	pub const FIRST_APPLICATION_WINDOW: u32 = 1;
	pub const LAST_APPLICATION_WINDOW: u32 = 99;
	pub const FIRST_SUB_WINDOW: u32 = 1000;
	pub const LAST_SUB_WINDOW: u32 = 1999;
	pub const FIRST_SYSTEM_WINDOW: u32 = 2000;
	pub const LAST_SYSTEM_WINDOW: u32 = 2999;

	pub const BASE_APPLICATION: WindowType = WindowType(1);
	pub const APPLICATION: WindowType = WindowType(2);
	pub const APPLICATION_STARTING: WindowType = WindowType(3);
	pub const DRAWN_APPLICATION: WindowType = WindowType(4);

	pub const APPLICATION_PANEL: WindowType = WindowType(1000);
	pub const APPLICATION_MEDIA: WindowType = WindowType(1001);
	pub const APPLICATION_SUB_PANEL: WindowType = WindowType(1002);
	pub const APPLICATION_ATTACHED_DIALOG: WindowType = WindowType(1003);
	pub const APPLICATION_MEDIA_OVERLAY: WindowType = WindowType(1004);
	pub const APPLICATION_ABOVE_SUB_PANEL: WindowType = WindowType(1005);

	pub const STATUS_BAR: WindowType = WindowType(2000);
	pub const SYSTEM_ALERT: WindowType = WindowType(2003);
	pub const TOAST: WindowType = WindowType(2005);
	pub const INPUT_METHOD: WindowType = WindowType(2011);
	pub const INPUT_METHOD_DIALOG: WindowType = WindowType(2012);
	pub const WALLPAPER: WindowType = WindowType(2013);
	pub const NAVIGATION_BAR: WindowType = WindowType(2019);
	pub const DREAM: WindowType = WindowType(2023);
	pub const PRIVATE_PRESENTATION: WindowType = WindowType(2030);
	pub const VOICE_INTERACTION: WindowType = WindowType(2031);
	pub const ACCESSIBILITY_OVERLAY: WindowType = WindowType(2032);
	pub const QS_DIALOG: WindowType = WindowType(2035);
	pub const APPLICATION_OVERLAY: WindowType = WindowType(2038);

	pub const fn is_application(self) -> bool {
		self.0 >= Self::FIRST_APPLICATION_WINDOW && self.0 <= Self::LAST_APPLICATION_WINDOW
	}

	pub const fn is_sub_window(self) -> bool {
		self.0 >= Self::FIRST_SUB_WINDOW && self.0 <= Self::LAST_SUB_WINDOW
	}

	pub const fn is_system(self) -> bool {
		self.0 >= Self::FIRST_SYSTEM_WINDOW && self.0 <= Self::LAST_SYSTEM_WINDOW
	}

	pub const fn is_valid(self) -> bool {
		self.is_application() || self.is_sub_window() || self.is_system()
	}

	/// Input-method windows never take focus away from the app they serve.
	pub const fn is_input_method(self) -> bool {
		self.0 == Self::INPUT_METHOD.0 || self.0 == Self::INPUT_METHOD_DIALOG.0
	}

	/// At most one window of these types may exist at a time.
	pub const fn is_singleton(self) -> bool {
		self.0 == Self::STATUS_BAR.0 || self.0 == Self::NAVIGATION_BAR.0
	}

	/// Base z-layer; sub-windows sit just above their parent.
	pub const fn base_layer(self) -> u32 {
		match self.0 {
			1..=99 => 2,
			2013 => 1,
			2005 => 8,
			2023 => 3,
			2003 | 2038 => 11,
			2011 => 14,
			2012 => 15,
			2031 => 6,
			2000 => 17,
			2035 => 18,
			2019 => 21,
			2032 => 24,
			_ => 5,
		}
	}
}

impl fmt::Display for WindowType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "type{}", self.0)
	}
}

bitflags::bitflags! {
	/// Layout parameter flags that change focus, input or surface behaviour.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct WindowFlags: u32 {
		const NOT_FOCUSABLE = 0x0000_0008;
		const NOT_TOUCHABLE = 0x0000_0010;
		const NOT_TOUCH_MODAL = 0x0000_0020;
		const KEEP_SCREEN_ON = 0x0000_0080;
		const SECURE = 0x0000_2000;
		/// Inverts whether the window can be an input-method target.
		const ALT_FOCUSABLE_IM = 0x0002_0000;
		const SHOW_WHEN_LOCKED = 0x0008_0000;
		const SHOW_WALLPAPER = 0x0010_0000;
		const HARDWARE_ACCELERATED = 0x0100_0000;
	}
}

bitflags::bitflags! {
	/// Bits reported back from a relayout.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct RelayoutFlags: u32 {
		const IN_TOUCH_MODE = 0x1;
		/// First relayout since the surface became visible.
		const FIRST_TIME = 0x2;
		/// The surface was created, replaced or released.
		const SURFACE_CHANGED = 0x4;
		/// The returned configuration differs from the last one reported.
		const CONFIG_CHANGED = 0x8;
	}
}

/// Visibility requested by the client's root view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewVisibility {
	#[default]
	Visible,
	Invisible,
	Gone,
}

impl ViewVisibility {
	pub const fn is_visible(self) -> bool {
		matches!(self, Self::Visible)
	}
}

/// Client-supplied window attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutParams {
	pub ty: WindowType,
	pub flags: WindowFlags,
	/// Requested size; `None` matches the parent or display.
	pub size: Option<Size>,
	/// Token the window attaches to: app token for application windows, parent
	/// client for sub-windows, explicit system token otherwise.
	pub token: Option<TokenKey>,
	pub package: String,
	pub title: String,
	pub display: DisplayId,
	/// Asks for rotation without a freeze while this window is on top.
	pub seamless_rotation: bool,
}

impl LayoutParams {
	pub fn new(ty: WindowType, package: impl Into<String>) -> Self {
		Self {
			ty,
			flags: WindowFlags::empty(),
			size: None,
			token: None,
			package: package.into(),
			title: String::new(),
			display: DisplayId::DEFAULT,
			seamless_rotation: false,
		}
	}

	pub fn rotating_seamlessly(mut self) -> Self {
		self.seamless_rotation = true;
		self
	}

	pub fn with_token(mut self, token: TokenKey) -> Self {
		self.token = Some(token);
		self
	}

	pub fn with_flags(mut self, flags: WindowFlags) -> Self {
		self.flags |= flags;
		self
	}

	pub fn with_size(mut self, size: Size) -> Self {
		self.size = Some(size);
		self
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = title.into();
		self
	}

	pub fn on_display(mut self, display: DisplayId) -> Self {
		self.display = display;
		self
	}

	/// Focusable windows may receive key input.
	pub fn can_receive_keys(&self) -> bool {
		!self.flags.contains(WindowFlags::NOT_FOCUSABLE)
	}

	/// Input-method targeting: focusable windows are targets unless they set
	/// `ALT_FOCUSABLE_IM`; non-focusable ones only when they set it.
	pub fn can_be_ime_target(&self) -> bool {
		let focusable = self.can_receive_keys();
		focusable != self.flags.contains(WindowFlags::ALT_FOCUSABLE_IM)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn type_ranges_are_disjoint() {
		for ty in [WindowType::BASE_APPLICATION, WindowType::DRAWN_APPLICATION] {
			assert!(ty.is_application() && !ty.is_sub_window() && !ty.is_system());
		}
		assert!(WindowType::APPLICATION_ABOVE_SUB_PANEL.is_sub_window());
		assert!(WindowType::TOAST.is_system());
		assert!(!WindowType(0).is_valid());
		assert!(!WindowType(500).is_valid());
		assert!(!WindowType(3000).is_valid());
	}

	#[test]
	fn ime_targeting_follows_alt_flag() {
		let plain = LayoutParams::new(WindowType::APPLICATION, "com.app");
		assert!(plain.can_be_ime_target());
		let alt = plain.clone().with_flags(WindowFlags::ALT_FOCUSABLE_IM);
		assert!(!alt.can_be_ime_target());
		let unfocusable = plain.clone().with_flags(WindowFlags::NOT_FOCUSABLE);
		assert!(!unfocusable.can_be_ime_target());
		assert!(unfocusable.with_flags(WindowFlags::ALT_FOCUSABLE_IM).can_be_ime_target());
	}
}
