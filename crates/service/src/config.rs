//! `foyer.toml` loading.
//!
//! ```toml
//! [launch]
//! wait_timeout_ms = 10000
//!
//! [window]
//! window_freeze_timeout_ms = 2000
//! saved_surfaces = true
//! ```
//!
//! Every table and key is optional; missing ones keep their defaults.

use std::path::{Path, PathBuf};

use foyer_launch::LaunchConfig;
use foyer_window::WindowConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Whole-service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoyerConfig {
	pub launch: LaunchConfig,
	pub window: WindowConfig,
}

impl FoyerConfig {
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		let config = Self::from_toml_str(&content)?;
		tracing::debug!(path = %path.display(), "config.load: loaded");
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_input_keeps_defaults() {
		let config = FoyerConfig::from_toml_str("").unwrap();
		assert_eq!(config, FoyerConfig::default());
		assert_eq!(config.window.window_freeze_timeout(), Duration::from_millis(2_000));
		assert_eq!(config.window.force_gc_delay(), Duration::from_millis(2_000));
		assert_eq!(config.window.drag_start_timeout(), Duration::from_millis(5_000));
		assert_eq!(config.window.boot_timeout(), Duration::from_millis(30_000));
		assert_eq!(config.window.toast_timeout(), Duration::from_millis(4_000));
		assert_eq!(config.launch.wait_timeout(), Duration::from_millis(10_000));
	}

	#[test]
	fn partial_tables_override_only_their_keys() {
		let config = FoyerConfig::from_toml_str(
			r#"
			[launch]
			background_starts_enabled = false
			wait_timeout_ms = 250

			[window]
			saved_surfaces = false
			"#,
		)
		.unwrap();
		assert!(!config.launch.background_starts_enabled);
		assert_eq!(config.launch.wait_timeout(), Duration::from_millis(250));
		assert_eq!(config.launch.app_switch_delay_ms, LaunchConfig::default().app_switch_delay_ms);
		assert!(!config.window.saved_surfaces);
		assert_eq!(config.window.toast_timeout_ms, 4_000);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(matches!(FoyerConfig::from_toml_str("[window]\nfreeze_ms = 1\n"), Err(ConfigError::Parse(_))));
		assert!(matches!(FoyerConfig::from_toml_str("[compositor]\n"), Err(ConfigError::Parse(_))));
	}

	#[test]
	fn load_reads_a_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("foyer.toml");
		std::fs::write(&path, "[window]\nboot_animation_max_polls = 3\n").unwrap();
		assert_eq!(FoyerConfig::load(&path).unwrap().window.boot_animation_max_polls, 3);

		let missing = dir.path().join("missing.toml");
		assert!(matches!(FoyerConfig::load(&missing), Err(ConfigError::Io { path, .. }) if path == missing));
	}
}
