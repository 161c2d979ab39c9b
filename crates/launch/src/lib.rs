#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Activity launch resolver.
//!
//! [`LaunchController::execute`] turns a [`StartRequest`] into a
//! [`LaunchOutcome`]: admission (caller, result link, voice, permission,
//! app lock, background starts, watcher veto, redirects, app switches)
//! followed by placement into the [`foyer_tasks::Hierarchy`]. Everything
//! the resolver consults but does not own is reached through the traits in
//! [`collaborators`].
//!
//! Policy denials are [`foyer_primitives::StartResult`] codes; only caller
//! errors come back as [`LaunchError`].

pub mod background;
pub mod collaborators;
mod config;
mod controller;
mod error;
mod gate;
mod outcome;
mod pending;
mod request;
mod resolve;
mod starter;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use background::{BackgroundStartAllowance, BackgroundStartVerdict};
pub use collaborators::{ClientGone, Collaborators, SurfaceHost};
pub use config::LaunchConfig;
pub use controller::{LastStart, LaunchController};
pub use error::{LaunchError, Result};
pub use outcome::{LaunchOutcome, WaitCondition, WaitResult};
pub use pending::{AppSwitchState, PendingActivityLaunch};
pub use request::{ActivityOptions, StartFlags, StartRequest, compute_resolve_filter_uid};
pub use resolve::{HEAVY_WEIGHT_SWITCHER_CLASS, HEAVY_WEIGHT_SWITCHER_PACKAGE};

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod tests;
