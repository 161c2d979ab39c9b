use foyer_primitives::{DisplayId, TokenKey, WindowId};

use crate::drag::DragToken;

/// Delayed work owned by the window manager.
///
/// Fired through [`crate::WindowManager::handle_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowMessage {
	/// A toast outlived its display time.
	HideToast(WindowId),
	/// Windows failed to redraw after a freeze in time.
	WindowFreezeTimeout(DisplayId),
	/// App tokens failed to unfreeze in time.
	AppFreezeTimeout,
	/// Seamlessly rotated windows failed to report in time.
	SeamlessRotationTimeout(DisplayId),
	/// Client failed to start the drag it prepared.
	DragStartTimeout(DragToken),
	/// Drop target failed to report a result.
	DragEndTimeout(DragToken),
	/// Replacement windows of a relaunching app never showed up.
	WindowReplacementTimeout(TokenKey),
	/// Gives up waiting for boot completion and enables the screen.
	BootTimeout,
	/// Re-polls the boot animation.
	CheckBootAnimation,
	ForceGc,
}

impl WindowMessage {
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::HideToast(_) => "hide-toast",
			Self::WindowFreezeTimeout(_) => "window-freeze-timeout",
			Self::AppFreezeTimeout => "app-freeze-timeout",
			Self::SeamlessRotationTimeout(_) => "seamless-rotation-timeout",
			Self::DragStartTimeout(_) => "drag-start-timeout",
			Self::DragEndTimeout(_) => "drag-end-timeout",
			Self::WindowReplacementTimeout(_) => "window-replacement-timeout",
			Self::BootTimeout => "boot-timeout",
			Self::CheckBootAnimation => "check-boot-animation",
			Self::ForceGc => "force-gc",
		}
	}
}
