//! Drag-and-drop session state.
//!
//! One drag exists at a time. It starts with a prepared drag surface, turns
//! into a running drag once touch focus moves to the drag window, and ends
//! with a reported drop result, a cancel, or a timeout.

use std::fmt;

use foyer_primitives::{ClientId, WindowId};

use crate::collaborators::SurfaceHandle;

/// Identifies one drag session; stale timeouts carry an old token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DragToken(pub u64);

impl fmt::Display for DragToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "drag#{}", self.0)
	}
}

/// Event delivered to windows taking part in a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
	Started { token: DragToken },
	Location { token: DragToken, x: i32, y: i32 },
	Drop { token: DragToken, x: i32, y: i32 },
	Ended { token: DragToken, result: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragPhase {
	/// Surface prepared; waiting for the client to start.
	Prepared,
	/// Touch focus moved to the drag surface.
	Running,
	/// Dropped on a target; waiting for its result.
	Dropped,
}

impl DragPhase {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Prepared => "prepared",
			Self::Running => "running",
			Self::Dropped => "dropped",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
	pub token: DragToken,
	/// Client that owns the drag.
	pub owner: ClientId,
	/// Window the drag started from.
	pub source: WindowId,
	pub surface: SurfaceHandle,
	/// Input channel that receives the touch stream once running.
	pub input_window: Option<WindowId>,
	pub phase: DragPhase,
	/// Window the drag was dropped on.
	pub drop_target: Option<WindowId>,
}
