use std::time::Duration;

use serde::Deserialize;

/// Launch-side tunables, read from the `[launch]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
	/// When `false`, restricted background starts are aborted instead of
	/// only being kept from moving to front.
	pub background_starts_enabled: bool,
	/// Emit the aborted-background-start event record.
	pub start_logging_enabled: bool,
	/// Enables the heavy-weight process switch in wait mode.
	pub heavy_weight_feature: bool,
	/// How long a waiting caller blocks before its wait is timed out.
	pub wait_timeout_ms: u64,
	/// How long app switches stay stopped after `stop_app_switches`.
	pub app_switch_delay_ms: u64,
}

impl Default for LaunchConfig {
	fn default() -> Self {
		Self {
			background_starts_enabled: true,
			start_logging_enabled: true,
			heavy_weight_feature: false,
			wait_timeout_ms: 10_000,
			app_switch_delay_ms: 5_000,
		}
	}
}

impl LaunchConfig {
	pub fn wait_timeout(&self) -> Duration {
		Duration::from_millis(self.wait_timeout_ms)
	}

	pub fn app_switch_delay(&self) -> Duration {
		Duration::from_millis(self.app_switch_delay_ms)
	}
}
