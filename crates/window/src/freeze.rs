//! Display freeze guard.
//!
//! [`FreezeController`] is pure state: the window manager feeds it the
//! conditions it cannot see (display readiness, screen state, opening apps)
//! and performs the side effects of the transitions it reports.

use std::time::Duration;

/// State of windows redrawing after a freeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowsFreezing {
	#[default]
	None,
	/// Some window still has to redraw in the new orientation.
	Active,
	/// Gave up waiting.
	Timeout,
}

/// External conditions for starting a freeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreezeConditions {
	pub display_ready: bool,
	pub screen_on: bool,
	/// Policy allows a screen-rotation animation.
	pub animatable: bool,
}

impl FreezeConditions {
	pub const READY: Self = Self {
		display_ready: true,
		screen_on: true,
		animatable: true,
	};
}

/// First condition found holding a freeze in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnfreezeBlocker {
	WaitingForConfig,
	AppsFreezing(u32),
	WindowsFreezing,
	ClientFreezing,
	OpeningApps(usize),
}

/// Result of [`FreezeController::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopFreeze {
	NotFrozen,
	Deferred(UnfreezeBlocker),
	/// The display is live again after being frozen for this long.
	Unfrozen(Duration),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreezeController {
	frozen_since: Option<Duration>,
	pub waiting_for_config: bool,
	pub apps_freezing: u32,
	pub windows_freezing: WindowsFreezing,
	pub client_freezing: bool,
	seamless_pending: u32,
	freezes: u64,
	last_duration: Option<Duration>,
}

impl FreezeController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_frozen(&self) -> bool {
		self.frozen_since.is_some()
	}

	/// Freezes the display. Returns `false` (and changes nothing) when already
	/// frozen or when the conditions do not allow a freeze.
	pub fn start(&mut self, now: Duration, conditions: FreezeConditions) -> bool {
		if self.is_frozen() || !conditions.display_ready || !conditions.screen_on || !conditions.animatable {
			return false;
		}
		self.frozen_since = Some(now);
		self.freezes += 1;
		true
	}

	pub fn blocker(&self, opening_apps: usize) -> Option<UnfreezeBlocker> {
		if self.waiting_for_config {
			Some(UnfreezeBlocker::WaitingForConfig)
		} else if self.apps_freezing > 0 {
			Some(UnfreezeBlocker::AppsFreezing(self.apps_freezing))
		} else if self.windows_freezing == WindowsFreezing::Active {
			Some(UnfreezeBlocker::WindowsFreezing)
		} else if self.client_freezing {
			Some(UnfreezeBlocker::ClientFreezing)
		} else if opening_apps > 0 {
			Some(UnfreezeBlocker::OpeningApps(opening_apps))
		} else {
			None
		}
	}

	/// Unfreezes unless something still holds the freeze.
	pub fn stop(&mut self, now: Duration, opening_apps: usize) -> StopFreeze {
		let Some(since) = self.frozen_since else {
			return StopFreeze::NotFrozen;
		};
		if let Some(blocker) = self.blocker(opening_apps) {
			return StopFreeze::Deferred(blocker);
		}
		self.frozen_since = None;
		self.client_freezing = false;
		self.windows_freezing = WindowsFreezing::None;
		let duration = now.saturating_sub(since);
		self.last_duration = Some(duration);
		StopFreeze::Unfrozen(duration)
	}

	/// Starts a seamless rotation covering `windows` windows.
	pub fn begin_seamless(&mut self, windows: u32) {
		self.seamless_pending = windows;
	}

	/// One seamlessly rotated window finished. Returns `true` when it was the last.
	pub fn seamless_window_done(&mut self) -> bool {
		if self.seamless_pending == 0 {
			return false;
		}
		self.seamless_pending -= 1;
		self.seamless_pending == 0
	}

	/// Drops every outstanding seamless window. Returns `true` if any were pending.
	pub fn abandon_seamless(&mut self) -> bool {
		std::mem::take(&mut self.seamless_pending) > 0
	}

	pub fn seamless_pending(&self) -> u32 {
		self.seamless_pending
	}

	/// Rotation updates wait for both freezes and seamless rotations to finish.
	pub fn defers_rotation(&self) -> bool {
		self.is_frozen() || self.seamless_pending > 0
	}

	pub fn freezes(&self) -> u64 {
		self.freezes
	}

	pub fn last_duration(&self) -> Option<Duration> {
		self.last_duration
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	fn ms(n: u64) -> Duration {
		Duration::from_millis(n)
	}

	#[test]
	fn second_start_is_a_no_op() {
		let mut f = FreezeController::new();
		assert!(f.start(ms(10), FreezeConditions::READY));
		assert!(!f.start(ms(20), FreezeConditions::READY));
		assert_eq!(f.freezes(), 1);
		assert_eq!(f.stop(ms(50), 0), StopFreeze::Unfrozen(ms(40)));
	}

	#[test]
	fn stop_without_freeze_is_a_no_op() {
		let mut f = FreezeController::new();
		f.apps_freezing = 2;
		assert_eq!(f.stop(ms(5), 3), StopFreeze::NotFrozen);
		assert_eq!(f.apps_freezing, 2);
	}

	#[test]
	fn unmet_conditions_refuse_freeze() {
		let mut f = FreezeController::new();
		for conditions in [
			FreezeConditions { display_ready: false, ..FreezeConditions::READY },
			FreezeConditions { screen_on: false, ..FreezeConditions::READY },
			FreezeConditions { animatable: false, ..FreezeConditions::READY },
		] {
			assert!(!f.start(ms(0), conditions));
		}
		assert!(!f.is_frozen());
	}

	#[test]
	fn blockers_are_checked_in_order() {
		let mut f = FreezeController::new();
		f.start(ms(0), FreezeConditions::READY);
		f.waiting_for_config = true;
		f.apps_freezing = 1;
		assert_eq!(f.stop(ms(1), 1), StopFreeze::Deferred(UnfreezeBlocker::WaitingForConfig));
		f.waiting_for_config = false;
		assert_eq!(f.stop(ms(1), 1), StopFreeze::Deferred(UnfreezeBlocker::AppsFreezing(1)));
		f.apps_freezing = 0;
		f.windows_freezing = WindowsFreezing::Active;
		assert_eq!(f.stop(ms(1), 1), StopFreeze::Deferred(UnfreezeBlocker::WindowsFreezing));
		f.windows_freezing = WindowsFreezing::Timeout;
		f.client_freezing = true;
		assert_eq!(f.stop(ms(1), 1), StopFreeze::Deferred(UnfreezeBlocker::ClientFreezing));
		f.client_freezing = false;
		assert_eq!(f.stop(ms(1), 1), StopFreeze::Deferred(UnfreezeBlocker::OpeningApps(1)));
		assert_eq!(f.stop(ms(1), 0), StopFreeze::Unfrozen(ms(1)));
		assert_eq!(f.windows_freezing, WindowsFreezing::None);
	}

	#[test]
	fn seamless_counter_reports_last_window() {
		let mut f = FreezeController::new();
		f.begin_seamless(2);
		assert!(f.defers_rotation());
		assert!(!f.seamless_window_done());
		assert!(f.seamless_window_done());
		assert!(!f.seamless_window_done());
		assert!(!f.defers_rotation());
	}

	#[derive(Debug, Clone)]
	enum Op {
		Start,
		Stop(usize),
		AppsFreezing(u32),
		Config(bool),
	}

	fn op() -> impl Strategy<Value = Op> {
		prop_oneof![
			Just(Op::Start),
			(0usize..2).prop_map(Op::Stop),
			(0u32..3).prop_map(Op::AppsFreezing),
			any::<bool>().prop_map(Op::Config),
		]
	}

	proptest! {
		/// Starting twice never counts twice; stopping only succeeds with no blocker.
		#[test]
		fn prop_freeze_guard_is_idempotent(ops in proptest::collection::vec(op(), 1..40)) {
			let mut f = FreezeController::new();
			let mut expected_freezes = 0u64;
			for (i, op) in ops.into_iter().enumerate() {
				let now = ms(i as u64);
				match op {
					Op::Start => {
						let was = f.is_frozen();
						let started = f.start(now, FreezeConditions::READY);
						prop_assert_eq!(started, !was);
						if started {
							expected_freezes += 1;
						}
					}
					Op::Stop(opening) => {
						let was = f.is_frozen();
						let blocked = f.blocker(opening).is_some();
						match f.stop(now, opening) {
							StopFreeze::NotFrozen => prop_assert!(!was),
							StopFreeze::Deferred(_) => prop_assert!(was && blocked && f.is_frozen()),
							StopFreeze::Unfrozen(_) => prop_assert!(was && !blocked && !f.is_frozen()),
						}
					}
					Op::AppsFreezing(n) => f.apps_freezing = n,
					Op::Config(w) => f.waiting_for_config = w,
				}
			}
			prop_assert_eq!(f.freezes(), expected_freezes);
		}
	}
}
