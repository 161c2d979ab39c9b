//! App-switch gating and deferred starts.

use std::time::Duration;

use foyer_primitives::{Pid, RecordId, StackId, Uid};

use crate::collaborators::PermissionPolicy;
use crate::request::StartFlags;

/// A start that arrived while app switches were stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActivityLaunch {
	pub record: RecordId,
	pub source: Option<RecordId>,
	pub start_flags: StartFlags,
	/// Focused stack when the start was deferred.
	pub stack: Option<StackId>,
	pub caller: Option<Pid>,
}

/// Whether starts from a uid other than the resumed one may switch apps.
///
/// Stopping switches (the home key does this) blocks such starts until the
/// deadline passes or switches are resumed explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSwitchState {
	allowed_after: Option<Duration>,
	did_app_switch: bool,
}

impl AppSwitchState {
	/// Blocks app switches until `now + delay`.
	pub fn stop(&mut self, now: Duration, delay: Duration) {
		self.allowed_after = Some(now + delay);
		self.did_app_switch = false;
	}

	/// Lifts the block immediately.
	pub fn resume(&mut self) {
		self.allowed_after = None;
	}

	pub fn is_stopped(&self, now: Duration) -> bool {
		self.allowed_after.is_some_and(|t| now < t)
	}

	pub fn allowed_after(&self) -> Option<Duration> {
		self.allowed_after
	}

	pub fn did_app_switch(&self) -> bool {
		self.did_app_switch
	}

	/// Returns `true` if a start from these callers may switch apps now.
	pub fn check_allowed(&self, now: Duration, permissions: &dyn PermissionPolicy, calling: (Option<Pid>, Uid), real_calling: (Option<Pid>, Uid)) -> bool {
		if !self.is_stopped(now) {
			return true;
		}
		if permissions.can_stop_app_switches(calling.0, calling.1) {
			return true;
		}
		if real_calling.1 != calling.1 && permissions.can_stop_app_switches(real_calling.0, real_calling.1) {
			return true;
		}
		tracing::warn!(calling_uid = %calling.1, real_calling_uid = %real_calling.1, "launch.app_switch: start blocked");
		false
	}

	/// Called once a start got through. A second switch clears any remaining block.
	pub fn on_start_did_app_switch(&mut self) {
		if self.did_app_switch {
			self.allowed_after = None;
		} else {
			self.did_app_switch = true;
		}
	}
}
