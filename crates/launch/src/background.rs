//! Background activity-start policy.
//!
//! [`evaluate`] walks a fixed list of allow-exceptions and stops at the first
//! one that applies. When none applies the start is restricted and the full
//! set of evaluated facts is logged and returned.

use foyer_primitives::{Intent, PendingIntentId, Pid, RecordId, Uid};
use foyer_tasks::{Hierarchy, RESULT_CANCELED};

use crate::collaborators::{PermissionPolicy, ProcessInfo, ProcessRegistry, ProcessState, RecentTasks, SurfaceHost};
use crate::config::LaunchConfig;

/// The start whose background status is being decided.
#[derive(Debug, Clone, Copy)]
pub struct BackgroundStartQuery<'a> {
	pub calling_uid: Uid,
	pub calling_pid: Option<Pid>,
	pub calling_package: Option<&'a str>,
	pub real_calling_uid: Uid,
	pub real_calling_pid: Option<Pid>,
	/// Resolved calling process, if the caller supplied one.
	pub caller_app: Option<&'a ProcessInfo>,
	pub originating_pending_intent: Option<PendingIntentId>,
	/// The pending-intent sender allowlisted this start.
	pub allowlisted: bool,
	pub intent: &'a Intent,
}

/// Collaborators the policy reads.
#[derive(Clone, Copy)]
pub struct BackgroundFacts<'a> {
	pub permissions: &'a dyn PermissionPolicy,
	pub processes: &'a dyn ProcessRegistry,
	pub recents: &'a dyn RecentTasks,
	pub windows: &'a dyn SurfaceHost,
}

/// The exception that let a start through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundStartAllowance {
	/// Root, system or NFC.
	PrivilegedUid,
	CallerVisibleWindow,
	CallerPersistentProcess,
	RealCallerVisibleWindow,
	RealCallerPersistentAllowlisted,
	RealCallerCompanionApp,
	BackgroundStartPermission,
	RecentsComponent,
	DeviceOwner,
	CallerCompanionApp,
	ProcessAllowlisted,
	SystemAlertWindow,
}

/// Result of [`evaluate`], with every fact that went into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundStartVerdict {
	pub allowed_by: Option<BackgroundStartAllowance>,
	pub calling_uid: Uid,
	pub real_calling_uid: Uid,
	pub calling_uid_has_visible_window: bool,
	pub calling_uid_foreground: bool,
	pub calling_uid_persistent: bool,
	pub real_calling_uid_has_visible_window: bool,
	pub real_calling_uid_foreground: bool,
	pub real_calling_uid_persistent: bool,
	pub from_pending_intent: bool,
	pub allowlisted: bool,
	pub caller_app: Option<Pid>,
}

impl BackgroundStartVerdict {
	fn allowed(mut self, by: BackgroundStartAllowance) -> Self {
		self.allowed_by = Some(by);
		self
	}

	/// The start is restricted.
	pub fn should_abort(&self) -> bool {
		self.allowed_by.is_none()
	}
}

/// Decides whether a start without a user trigger must be restricted.
pub fn evaluate(query: &BackgroundStartQuery<'_>, facts: &BackgroundFacts<'_>, config: &LaunchConfig) -> BackgroundStartVerdict {
	use BackgroundStartAllowance as Allow;

	let calling_uid = query.calling_uid;
	let real_calling_uid = query.real_calling_uid;
	let mut verdict = BackgroundStartVerdict {
		allowed_by: None,
		calling_uid,
		real_calling_uid,
		calling_uid_has_visible_window: false,
		calling_uid_foreground: false,
		calling_uid_persistent: false,
		real_calling_uid_has_visible_window: false,
		real_calling_uid_foreground: false,
		real_calling_uid_persistent: false,
		from_pending_intent: query.originating_pending_intent.is_some(),
		allowlisted: query.allowlisted,
		caller_app: query.caller_app.map(|p| p.pid),
	};

	let app_id = calling_uid.app_id();
	if calling_uid == Uid::ROOT || app_id == Uid::SYSTEM.0 || app_id == Uid::NFC.0 {
		return verdict.allowed(Allow::PrivilegedUid);
	}

	let calling_state = facts.processes.uid_state(calling_uid);
	verdict.calling_uid_has_visible_window = facts.windows.is_any_non_toast_window_visible_for_uid(calling_uid);
	verdict.calling_uid_foreground =
		verdict.calling_uid_has_visible_window || matches!(calling_state, ProcessState::Top | ProcessState::BoundTop);
	verdict.calling_uid_persistent = calling_state.is_persistent();
	if verdict.calling_uid_has_visible_window {
		return verdict.allowed(Allow::CallerVisibleWindow);
	}
	if verdict.calling_uid_persistent {
		return verdict.allowed(Allow::CallerPersistentProcess);
	}

	if calling_uid == real_calling_uid {
		verdict.real_calling_uid_has_visible_window = verdict.calling_uid_has_visible_window;
		verdict.real_calling_uid_foreground = verdict.calling_uid_foreground;
		verdict.real_calling_uid_persistent = verdict.calling_uid_persistent;
	} else {
		let real_state = facts.processes.uid_state(real_calling_uid);
		verdict.real_calling_uid_has_visible_window = facts.windows.is_any_non_toast_window_visible_for_uid(real_calling_uid);
		verdict.real_calling_uid_foreground = verdict.real_calling_uid_has_visible_window || real_state == ProcessState::Top;
		verdict.real_calling_uid_persistent = real_calling_uid.app_id() == Uid::SYSTEM.0 || real_state.is_persistent();

		if verdict.real_calling_uid_has_visible_window {
			return verdict.allowed(Allow::RealCallerVisibleWindow);
		}
		if verdict.real_calling_uid_persistent && query.allowlisted {
			return verdict.allowed(Allow::RealCallerPersistentAllowlisted);
		}
		if facts.permissions.is_associated_companion_app(real_calling_uid.user_id(), real_calling_uid) {
			return verdict.allowed(Allow::RealCallerCompanionApp);
		}
	}

	if facts.permissions.can_start_activities_from_background(query.calling_pid, calling_uid) {
		return verdict.allowed(Allow::BackgroundStartPermission);
	}
	if facts.recents.is_caller_recents(calling_uid) {
		return verdict.allowed(Allow::RecentsComponent);
	}
	if facts.permissions.is_device_owner(calling_uid) {
		return verdict.allowed(Allow::DeviceOwner);
	}
	if facts.permissions.is_associated_companion_app(calling_uid.user_id(), calling_uid) {
		return verdict.allowed(Allow::CallerCompanionApp);
	}

	// Pending-intent starts carry no caller process; judge the sender's instead.
	let (caller_app, caller_app_uid) = match query.caller_app {
		Some(app) => (Some(app.clone()), calling_uid),
		None => (facts.processes.process(query.real_calling_pid, real_calling_uid), real_calling_uid),
	};
	if let Some(app) = &caller_app {
		verdict.caller_app = Some(app.pid);
		if app.background_starts_allowed {
			return verdict.allowed(Allow::ProcessAllowlisted);
		}
		let siblings = facts.processes.processes_for_uid(caller_app_uid);
		if siblings.iter().any(|p| p.pid != app.pid && p.background_starts_allowed) {
			return verdict.allowed(Allow::ProcessAllowlisted);
		}
	}

	if facts.permissions.has_system_alert_window(calling_uid, query.calling_pid, query.calling_package) {
		tracing::warn!(
			calling_package = query.calling_package.unwrap_or_default(),
			"launch.background_start: allowed because SYSTEM_ALERT_WINDOW is granted"
		);
		return verdict.allowed(Allow::SystemAlertWindow);
	}

	tracing::warn!(
		calling_package = query.calling_package.unwrap_or_default(),
		calling_uid = %calling_uid,
		is_calling_uid_foreground = verdict.calling_uid_foreground,
		is_calling_uid_persistent_system_process = verdict.calling_uid_persistent,
		real_calling_uid = %real_calling_uid,
		is_real_calling_uid_foreground = verdict.real_calling_uid_foreground,
		is_real_calling_uid_persistent_system_process = verdict.real_calling_uid_persistent,
		originating_pending_intent = ?query.originating_pending_intent,
		is_bg_start_allowlisted = query.allowlisted,
		intent = %query.intent,
		caller_app = ?verdict.caller_app,
		"launch.background_start: restricted"
	);
	if config.start_logging_enabled {
		tracing::info!(
			target: "foyer::events",
			calling_uid = %calling_uid,
			calling_uid_state = ?calling_state,
			calling_uid_has_visible_window = verdict.calling_uid_has_visible_window,
			real_calling_uid = %real_calling_uid,
			real_calling_uid_has_visible_window = verdict.real_calling_uid_has_visible_window,
			from_pending_intent = verdict.from_pending_intent,
			"am_abort_bg_start"
		);
	}
	verdict
}

/// Aborts a restricted start outright when background starts are disabled.
///
/// Returns `true` if the start was aborted; the record's result target then
/// receives a cancelled result.
pub(crate) fn handle_background_abort(h: &mut Hierarchy, config: &LaunchConfig, record: RecordId) -> bool {
	if config.background_starts_enabled {
		return false;
	}
	let link = h.record(record).and_then(|r| r.result_to.map(|to| (to, r.result_who.clone(), r.request_code)));
	if let Some((to, who, request_code)) = link {
		h.send_result(to, None, who, request_code, RESULT_CANCELED, None);
	}
	tracing::debug!(record = %record, "launch.background_start: aborted");
	true
}
