//! Single delayed-message queue.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::token::TimerToken;

/// Ordered queue of messages due at a point in service time.
///
/// Messages due at the same instant fire in scheduling order. Superseded
/// messages are cancelled by token or by predicate; nothing ever fires twice.
#[derive(Debug)]
pub struct DelayedQueue<M> {
	last_seq: u64,
	entries: BTreeMap<(Duration, TimerToken), M>,
}

impl<M> Default for DelayedQueue<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M> DelayedQueue<M> {
	pub fn new() -> Self {
		Self {
			last_seq: 0,
			entries: BTreeMap::new(),
		}
	}

	/// Schedules `message` to fire at `due`.
	pub fn schedule_at(&mut self, due: Duration, message: M) -> TimerToken {
		self.last_seq += 1;
		let token = TimerToken::new(self.last_seq);
		self.entries.insert((due, token), message);
		token
	}

	/// Schedules `message` to fire `delay` after `now`.
	pub fn schedule(&mut self, now: Duration, delay: Duration, message: M) -> TimerToken {
		self.schedule_at(now.saturating_add(delay), message)
	}

	/// Removes the message scheduled under `token`, if still pending.
	pub fn cancel(&mut self, token: TimerToken) -> Option<M> {
		let key = self.entries.keys().find(|(_, t)| *t == token).copied()?;
		self.entries.remove(&key)
	}

	/// Removes every pending message matching `pred`; returns how many were removed.
	pub fn cancel_where(&mut self, mut pred: impl FnMut(&M) -> bool) -> usize {
		let before = self.entries.len();
		self.entries.retain(|_, m| !pred(m));
		before - self.entries.len()
	}

	/// Returns `true` if any pending message matches `pred`.
	pub fn contains(&self, mut pred: impl FnMut(&M) -> bool) -> bool {
		self.entries.values().any(|m| pred(m))
	}

	/// Pops every message due at or before `now`, earliest first.
	pub fn drain_due(&mut self, now: Duration) -> Vec<M> {
		let later = self.entries.split_off(&(now.saturating_add(Duration::from_nanos(1)), TimerToken::new(0)));
		let due = std::mem::replace(&mut self.entries, later);
		due.into_values().collect()
	}

	/// Earliest pending deadline.
	pub fn next_deadline(&self) -> Option<Duration> {
		self.entries.keys().next().map(|(due, _)| *due)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Pending messages with their deadlines, earliest first.
	pub fn iter(&self) -> impl Iterator<Item = (Duration, &M)> {
		self.entries.iter().map(|((due, _), m)| (*due, m))
	}
}
