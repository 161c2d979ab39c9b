#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Activity/window service.
//!
//! [`FoyerService`] holds the task hierarchy, the launch controller and the
//! window manager behind one lock. [`ServiceGuard`] is the only way in; it
//! replays hierarchy changes on the window side after every mutation so the
//! two halves never disagree outside the lock.
//!
//! Delayed work from both halves goes through one [`TimerQueue`], pumped
//! either by hand ([`FoyerService::fire_due`]) or by the async driver from
//! [`FoyerService::spawn_timer_driver`]. Callers that need to know how their
//! start ended use [`FoyerService::start_activity_and_wait`], which parks on
//! the lock's condvar.

mod bridge;
pub mod config;
mod error;
mod guard;
mod service;
mod state;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
mod timers;
mod wait;

pub use config::{ConfigError, FoyerConfig};
pub use error::{Result, ServiceError};
pub use guard::ServiceGuard;
pub use service::{FoyerService, TimerDriver};
pub use state::{LaunchPolicies, WindowHosts};
pub use timers::{ServiceMessage, TimerQueue};
pub use wait::{WaitId, Waiters};

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod tests;
