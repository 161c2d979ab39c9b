//! The service's single delayed-message queue.
//!
//! Window timeouts, wait timeouts and the pending-launch replay all share one
//! [`DelayedQueue`]. The queue has its own short-lived lock so the window
//! manager can schedule into it while the service lock is held; the order is
//! always service lock first, queue lock second.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use foyer_window::{WindowMessage, WindowTimers};
use foyer_worker::{Clock, DelayedQueue, TimerToken};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::wait::WaitId;

/// Delayed work of the whole service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMessage {
	Window(WindowMessage),
	/// A waiting start gave up.
	WaitTimeout(WaitId),
	/// The app-switch block ran out; replay deferred starts.
	PendingLaunchesDue,
}

impl fmt::Display for ServiceMessage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Window(m) => write!(f, "window:{}", m.as_str()),
			Self::WaitTimeout(id) => write!(f, "wait-timeout:{id}"),
			Self::PendingLaunchesDue => f.write_str("pending-launches-due"),
		}
	}
}

pub struct TimerQueue {
	clock: Arc<dyn Clock>,
	queue: Mutex<DelayedQueue<ServiceMessage>>,
	wake: Arc<Notify>,
}

impl TimerQueue {
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self {
			clock,
			queue: Mutex::new(DelayedQueue::new()),
			wake: Arc::new(Notify::new()),
		}
	}

	pub fn now(&self) -> Duration {
		self.clock.now()
	}

	/// Notified when a message lands ahead of the current head.
	pub fn wake(&self) -> Arc<Notify> {
		self.wake.clone()
	}

	pub fn schedule(&self, delay: Duration, message: ServiceMessage) -> TimerToken {
		let now = self.clock.now();
		let (token, earlier) = {
			let mut queue = self.queue.lock();
			let earlier = queue.next_deadline().is_none_or(|head| now.saturating_add(delay) < head);
			(queue.schedule(now, delay, message), earlier)
		};
		tracing::trace!(%message, ?delay, "timers.schedule");
		if earlier {
			self.wake.notify_one();
		}
		token
	}

	pub fn cancel(&self, token: TimerToken) -> Option<ServiceMessage> {
		self.queue.lock().cancel(token)
	}

	pub fn cancel_where(&self, pred: impl FnMut(&ServiceMessage) -> bool) -> usize {
		self.queue.lock().cancel_where(pred)
	}

	pub fn contains(&self, pred: impl FnMut(&ServiceMessage) -> bool) -> bool {
		self.queue.lock().contains(pred)
	}

	pub fn len(&self) -> usize {
		self.queue.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.queue.lock().is_empty()
	}

	/// Pops every message due now, in deadline order.
	pub fn drain_due(&self) -> Vec<ServiceMessage> {
		let now = self.clock.now();
		self.queue.lock().drain_due(now)
	}

	pub fn time_to_next(&self) -> Option<Duration> {
		let now = self.clock.now();
		self.queue.lock().next_deadline().map(|d| d.saturating_sub(now))
	}

	/// Snapshot of pending messages with their deadlines.
	pub fn pending(&self) -> Vec<(Duration, ServiceMessage)> {
		self.queue.lock().iter().map(|(due, m)| (due, *m)).collect()
	}
}

/// The window manager's view of the shared queue.
pub(crate) struct WindowTimerPort(pub(crate) Arc<TimerQueue>);

impl WindowTimers for WindowTimerPort {
	fn now(&self) -> Duration {
		self.0.now()
	}

	fn schedule(&mut self, delay: Duration, message: WindowMessage) -> TimerToken {
		self.0.schedule(delay, ServiceMessage::Window(message))
	}

	fn cancel(&mut self, token: TimerToken) {
		self.0.cancel(token);
	}

	fn cancel_where(&mut self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> usize {
		self.0.cancel_where(|m| matches!(m, ServiceMessage::Window(w) if pred(w)))
	}

	fn is_pending(&self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> bool {
		self.0.contains(|m| matches!(m, ServiceMessage::Window(w) if pred(w)))
	}
}

#[cfg(test)]
mod tests {
	use foyer_primitives::DisplayId;
	use foyer_worker::ManualClock;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn window_port_only_sees_window_messages() {
		let clock = ManualClock::new();
		let queue = Arc::new(TimerQueue::new(Arc::new(clock.clone())));
		let mut port = WindowTimerPort(queue.clone());
		queue.schedule(Duration::from_millis(10), ServiceMessage::PendingLaunchesDue);
		port.schedule(Duration::from_millis(20), WindowMessage::ForceGc);
		port.schedule(Duration::from_millis(30), WindowMessage::WindowFreezeTimeout(DisplayId::DEFAULT));

		assert!(port.is_pending(&mut |m| *m == WindowMessage::ForceGc));
		assert_eq!(port.cancel_where(&mut |_| true), 2);
		assert_eq!(queue.len(), 1);

		clock.advance(Duration::from_millis(10));
		assert_eq!(queue.time_to_next(), Some(Duration::ZERO));
		assert_eq!(queue.drain_due(), vec![ServiceMessage::PendingLaunchesDue]);
		assert!(queue.is_empty());
	}

	#[test]
	fn cancelled_tokens_stay_cancelled() {
		let clock = ManualClock::new();
		let queue = TimerQueue::new(Arc::new(clock.clone()));
		let token = queue.schedule(Duration::from_millis(5), ServiceMessage::PendingLaunchesDue);
		assert_eq!(queue.cancel(token), Some(ServiceMessage::PendingLaunchesDue));
		assert_eq!(queue.cancel(token), None);
		clock.advance(Duration::from_secs(1));
		assert!(queue.drain_due().is_empty());
	}
}
