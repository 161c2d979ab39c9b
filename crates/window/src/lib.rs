#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Window surface state machine and rotation/freeze controller.
//!
//! [`WindowManager`] owns the window table (keyed by client), window tokens
//! and per-display state. Windows move through
//! [`SurfaceLifecycle`](state::SurfaceLifecycle) as clients add, relayout
//! and remove them. A surface exists only after a visible relayout.
//!
//! Everything outside the table (compositor, input, policy, client
//! callbacks, app transitions, timers) is reached through
//! [`collaborators`]. Delayed work is expressed as [`WindowMessage`]s that
//! the owner fires back through [`WindowManager::handle_message`].

pub mod collaborators;
mod config;
pub mod display;
pub mod drag;
mod error;
pub mod freeze;
mod manager;
mod messages;
pub mod state;
pub mod token;
pub mod types;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use collaborators::{
	AppTransitionHost, ClientGone, Compositor, InputMonitor, LocalTimers, SurfaceHandle, WindowClients, WindowEnv, WindowPolicy, WindowTimers,
};
pub use config::WindowConfig;
pub use drag::{DragEvent, DragPhase, DragToken};
pub use error::{ADD_OKAY, AddWindowError, Result, SurfaceError, WindowError, add_result_code};
pub use freeze::{FreezeController, StopFreeze, UnfreezeBlocker, WindowsFreezing};
pub use manager::{BootState, ClientIdentity, FocusState, RelayoutResult, RotationWatcher, TOAST_TOKEN_REQUIRED_SDK, UpdateFocus, WindowManager};
pub use messages::WindowMessage;
pub use state::{SurfaceLifecycle, WindowState};
pub use types::{LayoutParams, RelayoutFlags, ViewVisibility, WindowFlags, WindowType};

#[cfg(test)]
mod invariants;
