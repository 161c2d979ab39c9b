#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Timer plumbing for the activity/window service.
//!
//! All background work (deferred GC, boot timeout, freeze timeouts, drag
//! timeouts, window replacement) is expressed as messages in one
//! [`DelayedQueue`]. The queue itself is synchronous and clock-driven so the
//! owning service can pump it under its own lock; [`driver::run_timer_driver`]
//! turns it into a hosted async loop.

mod clock;
mod delayed;
pub mod driver;
mod token;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use delayed::DelayedQueue;
pub use driver::{TimerSink, run_timer_driver};
pub use token::TimerToken;
