//! [`ServiceGuard`]: holding the service lock.

use std::fmt::Write as _;
use std::time::Duration;

use foyer_launch::collaborators::ActivityController;
use foyer_launch::{LaunchController, LaunchOutcome, StartRequest, WaitCondition, WaitResult};
use foyer_primitives::{Configuration, StartResult};
use foyer_tasks::Hierarchy;
use foyer_window::WindowManager;
use parking_lot::{Condvar, MutexGuard};

use crate::bridge;
use crate::error::Result;
use crate::state::ServiceState;
use crate::timers::{ServiceMessage, TimerQueue};
use crate::wait::{WaitId, Waiters};

/// Exclusive access to the hierarchy, the launch controller and the window
/// manager.
///
/// Every mutating entry point ends by replaying hierarchy events on the
/// window side and completing satisfied waiters, so state observed after a
/// call through the guard is always consistent between the two halves.
pub struct ServiceGuard<'a> {
	pub(crate) state: MutexGuard<'a, ServiceState>,
	pub(crate) cond: &'a Condvar,
}

impl ServiceGuard<'_> {
	pub fn now(&self) -> Duration {
		self.state.clock.now()
	}

	pub fn hierarchy(&self) -> &Hierarchy {
		&self.state.hierarchy
	}

	pub fn windows(&self) -> &WindowManager {
		&self.state.wm
	}

	pub fn launch(&self) -> &LaunchController {
		&self.state.launch
	}

	pub fn waiters(&self) -> &Waiters {
		&self.state.waiters
	}

	pub fn timers(&self) -> &TimerQueue {
		&self.state.timers
	}

	/// Runs one start request through the launch resolver.
	pub fn start_activity(&mut self, request: StartRequest) -> Result<LaunchOutcome> {
		let result = self.state.with_launch(|launch, h, env| launch.execute(h, env, request));
		if let Ok(outcome) = &result
			&& outcome.reports_to_waiters()
			&& matches!(outcome.result, StartResult::TaskToFront | StartResult::DeliveredToTop)
		{
			let state = &mut *self.state;
			let now = state.clock.now();
			if state.waiters.report_brought_forward(outcome, &state.hierarchy, now, &state.timers) > 0 {
				self.cond.notify_all();
			}
		}
		self.settle();
		Ok(result?)
	}

	/// Stops app switches and arms the replay of whatever gets deferred.
	pub fn stop_app_switches(&mut self) {
		let state = &mut *self.state;
		let now = state.clock.now();
		state.launch.stop_app_switches(now);
		if let Some(token) = state.pending_launches_timer.take() {
			state.timers.cancel(token);
		}
		let delay = state.launch.config().app_switch_delay();
		state.pending_launches_timer = Some(state.timers.schedule(delay, ServiceMessage::PendingLaunchesDue));
	}

	pub fn resume_app_switches(&mut self) -> Result<()> {
		if let Some(token) = self.state.pending_launches_timer.take() {
			self.state.timers.cancel(token);
		}
		let result = self.state.with_launch(|launch, h, env| launch.resume_app_switches(h, env));
		self.settle();
		Ok(result?)
	}

	/// Mutates the hierarchy directly, as activity lifecycle reports do.
	pub fn with_hierarchy<R>(&mut self, f: impl FnOnce(&mut Hierarchy) -> R) -> R {
		let r = f(&mut self.state.hierarchy);
		self.settle();
		r
	}

	/// Runs window-manager calls, as client sessions do.
	pub fn with_windows<R>(&mut self, f: impl FnOnce(&mut WindowManager) -> R) -> R {
		let r = f(&mut self.state.wm);
		self.settle();
		r
	}

	/// Installs or clears the start watcher.
	pub fn set_activity_controller(&mut self, controller: Option<Box<dyn ActivityController>>) {
		self.state.watcher = controller;
	}

	pub fn update_configuration(&mut self, config: Configuration) {
		self.with_windows(|wm| wm.update_configuration(config));
	}

	/// Fires every message that is due, including messages scheduled by the
	/// ones firing. Returns how many fired.
	pub fn fire_due(&mut self) -> usize {
		let mut fired = 0;
		loop {
			let due = self.state.timers.drain_due();
			if due.is_empty() {
				break;
			}
			for message in due {
				self.dispatch(message);
				fired += 1;
			}
		}
		if fired > 0 {
			self.settle();
		}
		fired
	}

	fn dispatch(&mut self, message: ServiceMessage) {
		tracing::trace!(%message, "service.timers: fire");
		match message {
			ServiceMessage::Window(m) => self.state.wm.handle_message(m),
			ServiceMessage::WaitTimeout(id) => {
				let state = &mut *self.state;
				let now = state.clock.now();
				if state.waiters.time_out(id, now, &state.timers) {
					self.cond.notify_all();
				}
			}
			ServiceMessage::PendingLaunchesDue => {
				self.state.pending_launches_timer = None;
				let now = self.state.clock.now();
				if self.state.launch.app_switch().is_stopped(now) {
					return;
				}
				if let Err(err) = self.state.with_launch(|launch, h, env| launch.resume_app_switches(h, env)) {
					tracing::warn!(%err, "service.timers: pending launch replay failed");
				}
			}
		}
	}

	/// Replays hierarchy events on the window side and completes waiters.
	fn settle(&mut self) {
		let state = &mut *self.state;
		let events = state.hierarchy.take_events();
		if !events.is_empty() {
			bridge::apply_events(&state.hierarchy, &mut state.wm, events);
		}
		let now = state.clock.now();
		if state.waiters.settle(&state.hierarchy, &state.wm, now, &state.timers) > 0 {
			self.cond.notify_all();
		}
	}

	/// Registers a waiter for `outcome`, or `None` when there is nothing to
	/// wait for.
	pub(crate) fn register_waiter(&mut self, outcome: &LaunchOutcome, started: Duration) -> Option<WaitId> {
		if !outcome.reports_to_waiters() {
			return None;
		}
		let condition = outcome.wait_condition(&self.state.hierarchy);
		if condition == WaitCondition::Settled {
			return None;
		}
		let state = &mut *self.state;
		let timeout = state.launch.config().wait_timeout();
		let id = state.waiters.register(outcome, condition, started, timeout, &state.timers);
		self.settle();
		Some(id)
	}

	/// Result for a start that had nothing to wait for.
	pub(crate) fn immediate_result(&self, outcome: &LaunchOutcome) -> WaitResult {
		let who = outcome
			.reports_to_waiters()
			.then(|| outcome.record.and_then(|r| self.state.hierarchy.record(r)).map(|r| r.component().clone()))
			.flatten();
		WaitResult {
			result: outcome.external(),
			who,
			timed_out: false,
			total_time: Duration::ZERO,
		}
	}

	pub(crate) fn take_wait_result(&mut self, id: WaitId) -> Option<WaitResult> {
		self.state.waiters.take(id)
	}

	/// Parks on the service condvar, releasing the lock until notified.
	pub(crate) fn wait(&mut self) {
		self.cond.wait(&mut self.state);
	}

	/// Text dump of every piece of state behind the lock.
	pub fn dump(&self) -> String {
		let state = &*self.state;
		let mut out = String::new();
		let _ = writeln!(out, "FOYER SERVICE (now={:?})", state.clock.now());
		let _ = writeln!(out, "  waiters: {}", state.waiters.pending());
		state.waiters.dump(&mut out);
		let pending = state.timers.pending();
		let _ = writeln!(out, "  timers: {}", pending.len());
		for (due, message) in pending {
			let _ = writeln!(out, "    at={due:?} {message}");
		}
		state.hierarchy.dump(&mut out);
		state.launch.dump(&mut out);
		state.wm.dump(&mut out);
		out
	}
}
