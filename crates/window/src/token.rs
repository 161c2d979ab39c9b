use foyer_primitives::{DisplayId, RecordId, ScreenOrientation, TaskId, TokenKey, WindowId};

use crate::types::WindowType;

/// App-specific token state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppToken {
	pub record: RecordId,
	pub task: Option<TaskId>,
	/// Requested orientation of the activity.
	pub orientation: ScreenOrientation,
	/// Visibility the activity side asked for.
	pub hidden_requested: bool,
	/// Visibility last reported to the client.
	pub client_hidden: bool,
	pub starting_window: Option<WindowId>,
	/// Windows of this token are about to be replaced (relaunch).
	pub will_replace_windows: bool,
	/// Removal requested; no new windows are accepted.
	pub removed: bool,
	/// Counts towards the app-freeze unfreeze condition.
	pub freezing_screen: bool,
}

impl AppToken {
	pub fn new(record: RecordId, task: Option<TaskId>) -> Self {
		Self {
			record,
			task,
			orientation: ScreenOrientation::Unspecified,
			hidden_requested: true,
			client_hidden: true,
			starting_window: None,
			will_replace_windows: false,
			removed: false,
			freezing_screen: false,
		}
	}
}

/// What a token groups windows for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
	App(Box<AppToken>),
	Wallpaper,
	InputMethod,
	VoiceInteraction,
	Dream,
	Toast,
	AccessibilityOverlay,
	/// Any other system type; implicit tokens for top-level system windows.
	System(WindowType),
}

impl TokenKind {
	/// Token kind a window of `ty` must attach to, if its type demands one.
	pub fn required_for(ty: WindowType) -> Option<TokenKindTag> {
		Some(match ty {
			t if t.is_application() => TokenKindTag::App,
			WindowType::INPUT_METHOD => TokenKindTag::InputMethod,
			WindowType::VOICE_INTERACTION => TokenKindTag::VoiceInteraction,
			WindowType::WALLPAPER => TokenKindTag::Wallpaper,
			WindowType::DREAM => TokenKindTag::Dream,
			WindowType::ACCESSIBILITY_OVERLAY => TokenKindTag::AccessibilityOverlay,
			WindowType::TOAST => TokenKindTag::Toast,
			_ => return None,
		})
	}

	/// Kind of the implicit token created for a top-level window of `ty`.
	pub fn implicit_for(ty: WindowType) -> Self {
		match TokenKind::required_for(ty) {
			Some(TokenKindTag::Wallpaper) => Self::Wallpaper,
			Some(TokenKindTag::InputMethod) => Self::InputMethod,
			Some(TokenKindTag::VoiceInteraction) => Self::VoiceInteraction,
			Some(TokenKindTag::Dream) => Self::Dream,
			Some(TokenKindTag::Toast) => Self::Toast,
			Some(TokenKindTag::AccessibilityOverlay) => Self::AccessibilityOverlay,
			Some(TokenKindTag::App | TokenKindTag::System) | None => Self::System(ty),
		}
	}

	pub fn tag(&self) -> TokenKindTag {
		match self {
			Self::App(_) => TokenKindTag::App,
			Self::Wallpaper => TokenKindTag::Wallpaper,
			Self::InputMethod => TokenKindTag::InputMethod,
			Self::VoiceInteraction => TokenKindTag::VoiceInteraction,
			Self::Dream => TokenKindTag::Dream,
			Self::Toast => TokenKindTag::Toast,
			Self::AccessibilityOverlay => TokenKindTag::AccessibilityOverlay,
			Self::System(_) => TokenKindTag::System,
		}
	}

	pub fn as_app(&self) -> Option<&AppToken> {
		match self {
			Self::App(app) => Some(app),
			_ => None,
		}
	}

	pub fn as_app_mut(&mut self) -> Option<&mut AppToken> {
		match self {
			Self::App(app) => Some(app),
			_ => None,
		}
	}

	pub fn is_app(&self) -> bool {
		matches!(self, Self::App(_))
	}

	pub fn is_wallpaper(&self) -> bool {
		matches!(self, Self::Wallpaper)
	}
}

/// Discriminant of [`TokenKind`] without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKindTag {
	App,
	Wallpaper,
	InputMethod,
	VoiceInteraction,
	Dream,
	Toast,
	AccessibilityOverlay,
	System,
}

/// Group of windows belonging to one client identity or app instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowToken {
	pub key: TokenKey,
	pub kind: TokenKind,
	/// Added by the system, as opposed to created implicitly on first add.
	pub explicit: bool,
	pub display: DisplayId,
	/// Top-level windows in z-order, bottom to top.
	pub windows: Vec<WindowId>,
}

impl WindowToken {
	pub fn new(key: TokenKey, kind: TokenKind, explicit: bool, display: DisplayId) -> Self {
		Self {
			key,
			kind,
			explicit,
			display,
			windows: Vec::new(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.windows.is_empty()
	}
}
