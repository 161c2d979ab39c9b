use std::time::Duration;

use serde::Deserialize;

/// Window-side timeouts and switches, read from the `[window]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
	pub toast_timeout_ms: u64,
	pub window_freeze_timeout_ms: u64,
	pub app_freeze_timeout_ms: u64,
	pub seamless_rotation_timeout_ms: u64,
	pub drag_start_timeout_ms: u64,
	pub drag_end_timeout_ms: u64,
	pub window_replacement_timeout_ms: u64,
	pub boot_timeout_ms: u64,
	pub boot_animation_poll_ms: u64,
	/// Polls before giving up on the boot animation and enabling anyway.
	pub boot_animation_max_polls: u32,
	pub force_gc_delay_ms: u64,
	/// Keep hidden app surfaces for a flicker-free re-show.
	pub saved_surfaces: bool,
}

impl Default for WindowConfig {
	fn default() -> Self {
		Self {
			toast_timeout_ms: 4_000,
			window_freeze_timeout_ms: 2_000,
			app_freeze_timeout_ms: 2_000,
			seamless_rotation_timeout_ms: 2_000,
			drag_start_timeout_ms: 5_000,
			drag_end_timeout_ms: 5_000,
			window_replacement_timeout_ms: 2_000,
			boot_timeout_ms: 30_000,
			boot_animation_poll_ms: 200,
			boot_animation_max_polls: 25,
			force_gc_delay_ms: 2_000,
			saved_surfaces: true,
		}
	}
}

macro_rules! durations {
	($($name:ident => $field:ident),* $(,)?) => {
		impl WindowConfig {
			$(
				pub fn $name(&self) -> Duration {
					Duration::from_millis(self.$field)
				}
			)*
		}
	};
}

durations! {
	toast_timeout => toast_timeout_ms,
	window_freeze_timeout => window_freeze_timeout_ms,
	app_freeze_timeout => app_freeze_timeout_ms,
	seamless_rotation_timeout => seamless_rotation_timeout_ms,
	drag_start_timeout => drag_start_timeout_ms,
	drag_end_timeout => drag_end_timeout_ms,
	window_replacement_timeout => window_replacement_timeout_ms,
	boot_timeout => boot_timeout_ms,
	boot_animation_poll => boot_animation_poll_ms,
	force_gc_delay => force_gc_delay_ms,
}
