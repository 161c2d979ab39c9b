//! Async pump for a [`DelayedQueue`](crate::DelayedQueue) owned elsewhere.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Upper bound on one idle wait; the loop re-reads the deadline afterwards.
const IDLE_WAIT: Duration = Duration::from_secs(60);

/// Owner of a delayed queue that the driver can pump.
pub trait TimerSink: Send + Sync + 'static {
	/// Time remaining until the earliest pending message, `None` when idle.
	fn time_to_next(&self) -> Option<Duration>;

	/// Fires every message that is due now. Returns how many fired.
	fn fire_due(&self) -> usize;
}

/// Runs until `cancel` fires, firing due messages as they come up.
///
/// `wake` must be notified whenever a message is scheduled earlier than the
/// current head so the loop can shorten its sleep.
pub async fn run_timer_driver(sink: Arc<dyn TimerSink>, wake: Arc<Notify>, cancel: CancellationToken) {
	tracing::debug!("timer.driver: started");
	loop {
		let wait = sink.time_to_next().unwrap_or(IDLE_WAIT);
		if wait.is_zero() {
			let fired = sink.fire_due();
			tracing::trace!(fired, "timer.driver: fired");
			continue;
		}
		tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			_ = wake.notified() => {}
			_ = tokio::time::sleep(wait) => {
				let fired = sink.fire_due();
				tracing::trace!(fired, "timer.driver: fired");
			}
		}
	}
	tracing::debug!("timer.driver: stopped");
}
