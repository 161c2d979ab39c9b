//! Narrow contracts to everything the resolver consults but does not own.
//!
//! Every trait here is implemented outside this crate. Policy traits take
//! `&self`; implementations that record calls use interior mutability. The
//! surface seam takes `&mut self` because it is backed by the window state
//! machine living under the same service lock.

use foyer_primitives::{
	ActivityInfo, ApplicationInfo, AuxiliaryResolveInfo, ComponentName, Configuration, Intent, PendingIntentId, Pid, ResolveInfo, Transit, Uid, UserId,
};
use foyer_tasks::Task;
use foyer_worker::Clock;

use crate::request::StartFlags;

/// The remote end died while we were calling into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("client process is gone")]
pub struct ClientGone;

/// Process importance, most important first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ProcessState {
	Persistent,
	PersistentUi,
	Top,
	BoundTop,
	ForegroundService,
	Service,
	Cached,
	#[default]
	Nonexistent,
}

impl ProcessState {
	pub fn is_persistent(self) -> bool {
		self <= Self::PersistentUi
	}
}

/// What the process registry knows about one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
	pub pid: Pid,
	pub uid: Uid,
	pub name: String,
	/// Process was explicitly allowed to start activities from the background.
	pub background_starts_allowed: bool,
}

/// Inputs to [`PermissionPolicy::check_start_any_activity`].
#[derive(Debug, Clone, Copy)]
pub struct StartPermissionCheck<'a> {
	pub intent: &'a Intent,
	pub info: &'a ActivityInfo,
	pub result_who: Option<&'a str>,
	pub request_code: i32,
	pub calling_pid: Option<Pid>,
	pub calling_uid: Uid,
	pub calling_package: Option<&'a str>,
	pub ignore_target_security: bool,
	pub launching_in_task: bool,
	pub has_result_record: bool,
}

pub trait PermissionPolicy: Send + Sync {
	/// Component-level permission check (exported, signature, target permission).
	fn check_start_any_activity(&self, check: &StartPermissionCheck<'_>) -> bool;
	/// Intent firewall.
	fn check_intent_firewall(&self, intent: &Intent, calling_uid: Uid, calling_pid: Option<Pid>, resolved_type: Option<&str>, app: &ApplicationInfo) -> bool;
	/// Runtime permission policy.
	fn check_start_activity(&self, intent: &Intent, calling_uid: Uid, calling_package: Option<&str>) -> bool;
	fn can_start_activities_from_background(&self, pid: Option<Pid>, uid: Uid) -> bool;
	fn has_system_alert_window(&self, uid: Uid, pid: Option<Pid>, package: Option<&str>) -> bool;
	fn is_device_owner(&self, uid: Uid) -> bool;
	fn is_associated_companion_app(&self, user: UserId, uid: Uid) -> bool;
	/// Holder may start activities while app switches are stopped.
	fn can_stop_app_switches(&self, pid: Option<Pid>, uid: Uid) -> bool;
}

pub trait PackageResolver: Send + Sync {
	fn resolve_intent(&self, intent: &Intent, resolved_type: Option<&str>, user: UserId, filter_uid: Uid) -> Option<ResolveInfo>;
	fn resolve_activity(&self, intent: &Intent, resolve: Option<&ResolveInfo>, start_flags: StartFlags, user: UserId) -> Option<ActivityInfo>;
	/// Whether `component` declares a filter matching `intent`.
	fn activity_supports_intent(&self, component: &ComponentName, intent: &Intent, resolved_type: Option<&str>) -> Result<bool, ClientGone>;
	fn is_permission_review_required(&self, package: &str, user: UserId) -> bool;
	fn is_instant_app_installer_component(&self, component: &ComponentName) -> bool;
	fn request_instant_app_phase_two(&self, auxiliary: &AuxiliaryResolveInfo, intent: &Intent, resolved_type: Option<&str>, calling_package: Option<&str>, user: UserId);
	/// Mints a one-shot sender that will replay `intent` as `uid`.
	fn intent_sender(&self, creator_package: &str, uid: Uid, user: UserId, intent: &Intent) -> PendingIntentId;
}

pub trait ProcessRegistry: Send + Sync {
	fn process_for_caller(&self, caller: Pid) -> Option<ProcessInfo>;
	fn process(&self, pid: Option<Pid>, uid: Uid) -> Option<ProcessInfo>;
	fn processes_for_uid(&self, uid: Uid) -> Vec<ProcessInfo>;
	fn uid_state(&self, uid: Uid) -> ProcessState;
	fn heavy_weight_process(&self) -> Option<ProcessInfo>;
}

pub trait LockTaskController: Send + Sync {
	/// `is_clearing` is set when the start would clear `task`.
	fn is_lock_task_mode_violation(&self, task: &Task, is_clearing: bool) -> bool;
}

pub trait AppLockPolicy: Send + Sync {
	fn is_app_locked(&self, package: &str) -> bool;
	fn is_app_opened(&self, package: &str) -> bool;
	fn is_alarm_or_call_intent(&self, intent: &Intent) -> bool;
	/// Remembers the intent to replay once the package is unlocked.
	fn set_app_intent(&self, package: &str, intent: &Intent);
	/// Shows the unlock screen for `package`.
	fn launch_before_activity(&self, package: &str);
}

pub trait RecentTasks: Send + Sync {
	fn is_caller_recents(&self, uid: Uid) -> bool;
	fn add(&self, task: &Task);
	fn is_freeze_task_list_reordering_set(&self) -> bool;
	fn set_freeze_task_list_reordering(&self);
	fn reset_freeze_task_list_reordering_on_timeout(&self);
}

pub trait TaskChangeNotifier: Send + Sync {
	fn notify_pinned_activity_restart_attempt(&self, cleared_task: bool);
}

/// Optional watcher that can veto starts.
pub trait ActivityController: Send + Sync {
	/// `intent` has extras stripped. `Ok(false)` vetoes the start.
	fn activity_starting(&self, intent: &Intent, package: &str) -> Result<bool, ClientGone>;
}

/// What the resolver needs from the window side.
pub trait SurfaceHost: Send {
	/// Opens a layout batch. Batches nest.
	fn defer_surface_layout(&mut self);
	/// Closes a layout batch; the outermost close performs placement.
	fn continue_surface_layout(&mut self);
	fn prepare_app_transition(&mut self, transit: Transit, always_keep_current: bool);
	fn execute_app_transition(&mut self);
	fn is_any_non_toast_window_visible_for_uid(&self, uid: Uid) -> bool;
	fn show_recent_apps(&mut self);
	fn global_configuration(&self) -> Configuration;
	fn update_configuration(&mut self, config: Configuration);
}

/// Everything a launch consults, borrowed for the duration of one call.
pub struct Collaborators<'a> {
	pub permissions: &'a dyn PermissionPolicy,
	pub packages: &'a dyn PackageResolver,
	pub processes: &'a dyn ProcessRegistry,
	pub lock_task: &'a dyn LockTaskController,
	pub app_lock: &'a dyn AppLockPolicy,
	pub recents: &'a dyn RecentTasks,
	pub task_changes: &'a dyn TaskChangeNotifier,
	/// Dropped in place when the watcher turns out to be dead.
	pub controller: &'a mut Option<Box<dyn ActivityController>>,
	pub surface: &'a mut dyn SurfaceHost,
	pub clock: &'a dyn Clock,
}
