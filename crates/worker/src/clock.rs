use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of "now" for timeouts, expressed as time since service start.
pub trait Clock: Send + Sync {
	fn now(&self) -> Duration;
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
	origin: Instant,
}

impl MonotonicClock {
	pub fn new() -> Self {
		Self { origin: Instant::now() }
	}
}

impl Default for MonotonicClock {
	fn default() -> Self {
		Self::new()
	}
}

impl Clock for MonotonicClock {
	fn now(&self) -> Duration {
		self.origin.elapsed()
	}
}

/// Hand-advanced [`Clock`] for deterministic timeout tests.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
	millis: Arc<AtomicU64>,
}

impl ManualClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Moves time forward by `by`.
	pub fn advance(&self, by: Duration) {
		let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
		self.millis.fetch_add(ms, Ordering::AcqRel);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Duration {
		Duration::from_millis(self.millis.load(Ordering::Acquire))
	}
}
