use foyer_primitives::DisplayId;

use super::WindowManager;
use crate::freeze::{FreezeConditions, StopFreeze, WindowsFreezing};
use crate::messages::WindowMessage;

impl WindowManager {
	/// Freezes the display. `false` when already frozen or the display cannot
	/// freeze right now (not enabled yet, screen off, animations off).
	pub(crate) fn start_freezing_display(&mut self) -> bool {
		let conditions = FreezeConditions {
			display_ready: self.boot.display_enabled,
			screen_on: self.env.policy.is_screen_on(),
			animatable: self.env.policy.ok_to_animate(),
		};
		let now = self.env.timers.now();
		if !self.freeze.start(now, conditions) {
			return false;
		}
		self.env.input.freeze_dispatch();
		tracing::debug!(freezes = self.freeze.freezes(), "wm.freeze: display frozen");
		true
	}

	/// Unfreezes unless a freeze source still holds.
	pub(crate) fn stop_freezing_display(&mut self) {
		let now = self.env.timers.now();
		let opening = self.env.transitions.opening_apps();
		match self.freeze.stop(now, opening) {
			StopFreeze::NotFrozen => {}
			StopFreeze::Deferred(blocker) => {
				tracing::trace!(?blocker, "wm.freeze: unfreeze deferred");
			}
			StopFreeze::Unfrozen(duration) => {
				self.env.input.thaw_dispatch();
				self.env.timers.cancel_where(&mut |m| matches!(m, WindowMessage::WindowFreezeTimeout(_) | WindowMessage::AppFreezeTimeout));
				for win in self.windows.values_mut() {
					win.orientation_changing = false;
				}
				self.env.timers.cancel_where(&mut |m| *m == WindowMessage::ForceGc);
				self.env.timers.schedule(self.config.force_gc_delay(), WindowMessage::ForceGc);
				tracing::info!(duration_ms = duration.as_millis() as u64, "wm.freeze: display unfrozen");
				self.run_pending_rotations();
			}
		}
	}

	/// Windows did not redraw in time; give up on them.
	pub(crate) fn window_freeze_timeout(&mut self, display_id: DisplayId) {
		if self.freeze.windows_freezing != WindowsFreezing::Active {
			return;
		}
		self.freeze.windows_freezing = WindowsFreezing::Timeout;
		let mut stuck = 0usize;
		for win in self.windows.values_mut().filter(|w| w.display == display_id && w.orientation_changing) {
			win.orientation_changing = false;
			stuck += 1;
		}
		tracing::warn!(display = %display_id, stuck, "wm.freeze: window freeze timed out");
		self.stop_freezing_display();
	}

	/// App tokens did not unfreeze in time; drop them all.
	pub(crate) fn app_freeze_timeout(&mut self) {
		let mut stuck = 0usize;
		for app in self.tokens.values_mut().filter_map(|t| t.kind.as_app_mut()) {
			if std::mem::take(&mut app.freezing_screen) {
				stuck += 1;
			}
		}
		self.freeze.apps_freezing = 0;
		tracing::warn!(stuck, "wm.freeze: app freeze timed out");
		self.stop_freezing_display();
	}

	/// A client-driven freeze, held until
	/// [`stop_client_freezing`](Self::stop_client_freezing).
	pub fn start_client_freezing(&mut self) -> bool {
		if !self.start_freezing_display() && !self.freeze.is_frozen() {
			return false;
		}
		self.freeze.client_freezing = true;
		true
	}

	pub fn stop_client_freezing(&mut self) {
		if !std::mem::take(&mut self.freeze.client_freezing) {
			return;
		}
		self.stop_freezing_display();
	}
}
