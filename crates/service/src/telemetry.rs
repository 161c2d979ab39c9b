//! Subscriber setup.
//!
//! Diagnostics use short `area.op` messages. Creation, new-intent and
//! new-task records go to the [`EVENTS_TARGET`] target so a filter such as
//! `foyer::events=info,warn` keeps only them and the warnings.

use tracing_subscriber::EnvFilter;

/// Target of the activity event records.
pub const EVENTS_TARGET: &str = "foyer::events";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

fn filter(default: &str) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global fmt subscriber. Returns `false` if one was already set.
pub fn init(default_filter: &str) -> bool {
	tracing_subscriber::fmt().with_env_filter(filter(default_filter)).with_target(true).try_init().is_ok()
}

/// Test subscriber writing through the test harness capture. Idempotent.
pub fn init_for_tests() {
	let _ = tracing_subscriber::fmt().with_env_filter(filter("debug")).with_test_writer().try_init();
}
