//! Callers blocked on the outcome of their start.
//!
//! A waiter is registered under the service lock with the condition its
//! start left behind, then parks on the service condvar. Whoever completes
//! it (a drawn window, a resumed record, a later start folding into the same
//! task, or the timeout message) notifies the condvar; the waiter takes its
//! [`WaitResult`] the next time it holds the lock.

use std::fmt::{self, Write as _};
use std::time::Duration;

use foyer_launch::{LaunchOutcome, WaitCondition, WaitResult};
use foyer_primitives::{ComponentName, StartResult, TokenKey};
use foyer_tasks::{Hierarchy, LifecycleState};
use foyer_window::WindowManager;
use foyer_worker::TimerToken;
use rustc_hash::FxHashMap;

use crate::timers::{ServiceMessage, TimerQueue};

/// Handle of one waiting caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaitId(pub u64);

impl fmt::Display for WaitId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "wait#{}", self.0)
	}
}

#[derive(Debug)]
struct Waiter {
	condition: WaitCondition,
	/// External result of the start being waited on.
	result: StartResult,
	started: Duration,
	timer: TimerToken,
	done: Option<WaitResult>,
}

impl Waiter {
	fn complete(&mut self, result: StartResult, who: Option<ComponentName>, timed_out: bool, now: Duration, timers: &TimerQueue) {
		timers.cancel(self.timer);
		self.done = Some(WaitResult {
			result,
			who,
			timed_out,
			total_time: now.saturating_sub(self.started),
		});
	}
}

/// Registered waiters, completed or not.
#[derive(Debug, Default)]
pub struct Waiters {
	next: u64,
	entries: FxHashMap<WaitId, Waiter>,
}

impl Waiters {
	pub(crate) fn register(&mut self, outcome: &LaunchOutcome, condition: WaitCondition, started: Duration, timeout: Duration, timers: &TimerQueue) -> WaitId {
		self.next += 1;
		let id = WaitId(self.next);
		let timer = timers.schedule(timeout, ServiceMessage::WaitTimeout(id));
		self.entries.insert(
			id,
			Waiter {
				condition,
				result: outcome.external(),
				started,
				timer,
				done: None,
			},
		);
		tracing::debug!(%id, ?condition, "service.wait: registered");
		id
	}

	/// Callers still blocked.
	pub fn pending(&self) -> usize {
		self.entries.values().filter(|w| w.done.is_none()).count()
	}

	pub fn is_done(&self, id: WaitId) -> bool {
		self.entries.get(&id).is_some_and(|w| w.done.is_some())
	}

	/// Removes a completed waiter and hands back its result.
	pub(crate) fn take(&mut self, id: WaitId) -> Option<WaitResult> {
		if !self.is_done(id) {
			return None;
		}
		self.entries.remove(&id).and_then(|w| w.done)
	}

	/// Completes every waiter whose condition now holds. Returns how many.
	pub(crate) fn settle(&mut self, h: &Hierarchy, wm: &WindowManager, now: Duration, timers: &TimerQueue) -> usize {
		let mut completed = 0;
		for (id, waiter) in self.entries.iter_mut().filter(|(_, w)| w.done.is_none()) {
			let Some(who) = satisfied(waiter.condition, h, wm) else {
				continue;
			};
			tracing::debug!(%id, who = ?who.as_ref().map(ToString::to_string), "service.wait: satisfied");
			waiter.complete(waiter.result, who, false, now, timers);
			completed += 1;
		}
		completed
	}

	/// A later start folded into an existing task: callers waiting for a
	/// launch take that start's result instead.
	pub(crate) fn report_brought_forward(&mut self, outcome: &LaunchOutcome, h: &Hierarchy, now: Duration, timers: &TimerQueue) -> usize {
		let who = outcome.record.and_then(|r| h.record(r)).map(|r| r.component().clone());
		let mut completed = 0;
		for waiter in self.entries.values_mut() {
			if waiter.done.is_none() && matches!(waiter.condition, WaitCondition::Launched(_)) {
				waiter.complete(outcome.external(), who.clone(), false, now, timers);
				completed += 1;
			}
		}
		completed
	}

	/// The timeout message fired. `false` if the waiter was already done.
	pub(crate) fn time_out(&mut self, id: WaitId, now: Duration, timers: &TimerQueue) -> bool {
		let Some(waiter) = self.entries.get_mut(&id).filter(|w| w.done.is_none()) else {
			return false;
		};
		tracing::debug!(%id, "service.wait: timed out");
		waiter.complete(waiter.result, None, true, now, timers);
		true
	}

	pub(crate) fn dump(&self, out: &mut String) {
		let mut ids: Vec<&WaitId> = self.entries.keys().collect();
		ids.sort_unstable();
		for id in ids {
			let w = &self.entries[id];
			let _ = writeln!(out, "    {id} condition={:?} result={} started={:?} done={}", w.condition, w.result, w.started, w.done.is_some());
		}
	}
}

/// `Some(who)` once `condition` holds.
fn satisfied(condition: WaitCondition, h: &Hierarchy, wm: &WindowManager) -> Option<Option<ComponentName>> {
	let record = match condition {
		WaitCondition::Settled => return Some(None),
		WaitCondition::Launched(r) | WaitCondition::Visible(r) => r,
	};
	let Some(r) = h.record(record) else {
		return Some(None);
	};
	let holds = match condition {
		WaitCondition::Launched(_) => wm.is_app_drawn(TokenKey::from(record)),
		_ => r.visible && r.is_state(LifecycleState::Resumed),
	};
	holds.then(|| Some(r.component().clone()))
}
