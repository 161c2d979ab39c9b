use super::WindowManager;
use crate::messages::WindowMessage;

/// Progress of enabling the screen after boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootState {
	pub system_booted: bool,
	pub display_enabled: bool,
	/// The boot timeout fired; the animation is no longer waited for.
	pub force_enabled: bool,
	/// Boot-animation polls made so far.
	pub polls: u32,
}

impl WindowManager {
	/// Arms the boot timeout. Called once when the service starts.
	pub fn arm_boot_timeout(&mut self) {
		if self.boot.display_enabled {
			return;
		}
		self.env.timers.cancel_where(&mut |m| *m == WindowMessage::BootTimeout);
		self.env.timers.schedule(self.config.boot_timeout(), WindowMessage::BootTimeout);
	}

	/// The system finished booting; enable the screen once the boot
	/// animation is done.
	pub fn enable_screen_after_boot(&mut self) {
		if self.boot.system_booted {
			return;
		}
		self.boot.system_booted = true;
		tracing::debug!("wm.boot: system booted");
		self.perform_enable_screen();
	}

	/// Enables the screen, polling the boot animation a bounded number of
	/// times first.
	pub(crate) fn perform_enable_screen(&mut self) {
		if self.boot.display_enabled || (!self.boot.system_booted && !self.boot.force_enabled) {
			return;
		}
		if !self.boot.force_enabled && !self.env.policy.is_boot_animation_complete() {
			if self.boot.polls < self.config.boot_animation_max_polls {
				self.boot.polls += 1;
				if !self.env.timers.is_pending(&mut |m| *m == WindowMessage::CheckBootAnimation) {
					self.env.timers.schedule(self.config.boot_animation_poll(), WindowMessage::CheckBootAnimation);
				}
				tracing::trace!(polls = self.boot.polls, "wm.boot: waiting for boot animation");
				return;
			}
			tracing::warn!(polls = self.boot.polls, "wm.boot: boot animation never finished");
		}
		self.boot.display_enabled = true;
		self.env.timers.cancel_where(&mut |m| matches!(m, WindowMessage::BootTimeout | WindowMessage::CheckBootAnimation));
		tracing::info!(forced = self.boot.force_enabled, polls = self.boot.polls, "wm.boot: screen enabled");
		self.update_rotation_unchecked(foyer_primitives::DisplayId::DEFAULT);
		self.request_placement();
	}

	pub(crate) fn boot_timeout(&mut self) {
		if self.boot.display_enabled {
			return;
		}
		tracing::warn!("wm.boot: boot timed out; forcing screen on");
		self.boot.force_enabled = true;
		self.perform_enable_screen();
	}
}
