//! Seams to everything the window manager drives but does not own.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use foyer_primitives::{ClientId, Configuration, DisplayId, Rect, Rotation, ScreenOrientation, Size, Transit, Uid, WindowId};
use foyer_worker::{Clock, DelayedQueue, TimerToken};

use crate::drag::DragEvent;
use crate::error::SurfaceError;
use crate::messages::WindowMessage;
use crate::types::WindowType;

/// A client process died while being called back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("window client is gone")]
pub struct ClientGone;

/// Opaque compositor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

impl fmt::Display for SurfaceHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "surface#{}", self.0)
	}
}

/// Surface compositor. Transactions nest inside the service lock.
pub trait Compositor: Send {
	fn open_transaction(&mut self);
	fn close_transaction(&mut self);
	fn create_surface(&mut self, window: WindowId, size: Size, secure: bool) -> Result<SurfaceHandle, SurfaceError>;
	fn destroy_surface(&mut self, surface: SurfaceHandle);
	/// Makes a saved surface visible again.
	fn show_surface(&mut self, surface: SurfaceHandle);
	fn hide_surface(&mut self, surface: SurfaceHandle);
	fn set_layer(&mut self, surface: SurfaceHandle, layer: u32);
}

/// Window-side policy decisions.
pub trait WindowPolicy: Send {
	/// Permission to add a window of `ty`.
	fn check_add_permission(&self, ty: WindowType, uid: Uid, package: &str) -> bool;
	/// Display exists for `uid` (private displays are owner-only).
	fn has_display_access(&self, display: DisplayId, uid: Uid) -> bool;
	fn target_sdk(&self, package: &str, uid: Uid) -> u32;
	fn rotation_for_orientation(&self, orientation: ScreenOrientation, last: Rotation) -> Rotation;
	fn is_screen_on(&self) -> bool;
	/// Animations are enabled and the display may show a freeze animation.
	fn ok_to_animate(&self) -> bool;
	fn is_boot_animation_complete(&self) -> bool;
	/// Runtime garbage collection after an unfreeze.
	fn request_gc(&self);
}

/// Input routing.
pub trait InputMonitor: Send {
	fn open_input_channel(&mut self, window: WindowId);
	fn close_input_channel(&mut self, window: WindowId);
	fn set_focused_window(&mut self, window: Option<WindowId>);
	fn update_input_windows(&mut self);
	fn freeze_dispatch(&mut self);
	fn thaw_dispatch(&mut self);
	/// Moves an ongoing touch stream. `false` when no touch is in flight.
	fn transfer_touch_focus(&mut self, from: WindowId, to: WindowId) -> bool;
}

/// Asynchronous callbacks into client processes.
pub trait WindowClients: Send {
	fn window_focus_changed(&mut self, client: ClientId, has_focus: bool) -> Result<(), ClientGone>;
	fn resized(&mut self, client: ClientId, frame: Rect, config: &Configuration) -> Result<(), ClientGone>;
	fn rotation_changed(&mut self, watcher: ClientId, rotation: Rotation) -> Result<(), ClientGone>;
	fn dispatch_drag_event(&mut self, client: ClientId, event: &DragEvent) -> Result<(), ClientGone>;
}

/// App-transition sequencing and exit animations.
pub trait AppTransitionHost: Send {
	fn is_transition_set(&self) -> bool;
	fn prepare(&mut self, transit: Transit, always_keep_current: bool);
	fn execute(&mut self);
	/// Apps still waiting to draw for the running transition.
	fn opening_apps(&self) -> usize;
	/// Starts the exit animation of `window`. `false` when none applies.
	fn start_exit_animation(&mut self, window: WindowId) -> bool;
	fn start_rotation_animation(&mut self, display: DisplayId, from: Rotation, to: Rotation);
}

/// Delayed messages, scheduled on the service's single queue.
pub trait WindowTimers: Send {
	fn now(&self) -> Duration;
	fn schedule(&mut self, delay: Duration, message: WindowMessage) -> TimerToken;
	fn cancel(&mut self, token: TimerToken);
	/// Cancels every pending message matching `pred`.
	fn cancel_where(&mut self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> usize;
	fn is_pending(&self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> bool;
}

/// Stand-alone [`WindowTimers`] over its own queue.
pub struct LocalTimers {
	clock: Arc<dyn Clock>,
	queue: DelayedQueue<WindowMessage>,
}

impl LocalTimers {
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self {
			clock,
			queue: DelayedQueue::new(),
		}
	}

	/// Pops every message due now.
	pub fn drain_due(&mut self) -> Vec<WindowMessage> {
		self.queue.drain_due(self.clock.now())
	}

	pub fn pending(&self) -> impl Iterator<Item = (Duration, &WindowMessage)> {
		self.queue.iter()
	}
}

impl WindowTimers for LocalTimers {
	fn now(&self) -> Duration {
		self.clock.now()
	}

	fn schedule(&mut self, delay: Duration, message: WindowMessage) -> TimerToken {
		self.queue.schedule(self.clock.now(), delay, message)
	}

	fn cancel(&mut self, token: TimerToken) {
		self.queue.cancel(token);
	}

	fn cancel_where(&mut self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> usize {
		self.queue.cancel_where(pred)
	}

	fn is_pending(&self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> bool {
		self.queue.contains(pred)
	}
}

/// Collaborators owned by the window manager.
pub struct WindowEnv {
	pub policy: Box<dyn WindowPolicy>,
	pub compositor: Box<dyn Compositor>,
	pub input: Box<dyn InputMonitor>,
	pub clients: Box<dyn WindowClients>,
	pub transitions: Box<dyn AppTransitionHost>,
	pub timers: Box<dyn WindowTimers>,
}
