use foyer_primitives::{ClientId, DisplayId, Pid, Rect, SessionId, Size, TokenKey, Uid, WindowId};
use smallvec::SmallVec;

use crate::collaborators::SurfaceHandle;
use crate::types::{LayoutParams, ViewVisibility, WindowType};

/// Surface lifecycle of one window.
///
/// `AddedNotVisible -> RelayoutPending -> Visible -> AnimatingExit -> Destroyed`.
/// A surface exists only in `Visible` and `AnimatingExit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceLifecycle {
	#[default]
	AddedNotVisible,
	/// Relayout asked for visibility; the surface is being created.
	RelayoutPending,
	Visible,
	AnimatingExit,
	Destroyed,
}

impl SurfaceLifecycle {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AddedNotVisible => "added",
			Self::RelayoutPending => "relayout-pending",
			Self::Visible => "visible",
			Self::AnimatingExit => "animating-exit",
			Self::Destroyed => "destroyed",
		}
	}
}

/// One surface-bearing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
	pub id: WindowId,
	/// Insertion order; breaks z-order ties.
	pub seq: u64,
	pub client: ClientId,
	pub session: SessionId,
	pub uid: Uid,
	pub pid: Pid,
	pub attrs: LayoutParams,
	/// Owning token. Sub-windows share their parent's token.
	pub token: TokenKey,
	pub parent: Option<WindowId>,
	pub children: SmallVec<[WindowId; 2]>,
	pub display: DisplayId,
	pub view_visibility: ViewVisibility,
	pub lifecycle: SurfaceLifecycle,
	pub surface: Option<SurfaceHandle>,
	/// A hidden surface kept around to skip recreation on the next show.
	pub saved_surface: Option<SurfaceHandle>,
	pub requested: Size,
	pub frame: Rect,
	pub layer: u32,
	pub relayout_called: bool,
	/// Set when removal was asked for while an exit animation runs.
	pub remove_on_exit: bool,
	pub orientation_changing: bool,
	pub seamlessly_rotated: bool,
	/// Last configuration sequence reported to the client.
	pub reported_config_seq: u64,
}

impl WindowState {
	pub fn ty(&self) -> WindowType {
		self.attrs.ty
	}

	pub fn has_surface(&self) -> bool {
		self.surface.is_some()
	}

	/// Visible to the user right now, or on its way out.
	pub fn is_on_screen(&self) -> bool {
		matches!(self.lifecycle, SurfaceLifecycle::Visible | SurfaceLifecycle::AnimatingExit)
	}

	/// Counts as a visible window for background-start checks.
	pub fn is_visible_non_toast(&self) -> bool {
		self.lifecycle == SurfaceLifecycle::Visible && self.attrs.ty != WindowType::TOAST
	}
}
