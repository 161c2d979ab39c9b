//! In-memory collaborators for tests.
//!
//! [`FakeSystem`] implements every policy trait over one lock-protected
//! [`FakeState`] that tests configure directly and inspect afterwards.
//! [`LaunchHarness`] bundles it with a hierarchy, a controller, a
//! [`FakeSurface`] and a manual clock.

use std::sync::Arc;

use foyer_primitives::{
	ActivityInfo, ActivityType, ApplicationInfo, AuxiliaryResolveInfo, ComponentName, Configuration, DisplayId, Intent, IntentFlags, PendingIntentId, Pid,
	RecordId, ResolveInfo, TaskId, Transit, Uid, UserId, WindowingMode,
};
use foyer_tasks::{Hierarchy, RecordSpec, Task};
use foyer_worker::ManualClock;
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::collaborators::{
	ActivityController, AppLockPolicy, ClientGone, Collaborators, LockTaskController, PackageResolver, PermissionPolicy, ProcessInfo, ProcessRegistry,
	ProcessState, RecentTasks, StartPermissionCheck, SurfaceHost, TaskChangeNotifier,
};
use crate::config::LaunchConfig;
use crate::controller::LaunchController;
use crate::error::Result;
use crate::outcome::LaunchOutcome;
use crate::request::{StartFlags, StartRequest};

/// Uid of the default test application.
pub const APP_UID: Uid = Uid(10_050);
/// Uid of the default launcher.
pub const LAUNCHER_UID: Uid = Uid(10_010);

/// A standard activity of `package` running as `uid`.
pub fn activity(package: &str, class: &str, uid: Uid) -> ActivityInfo {
	ActivityInfo::new(ComponentName::new(package, format!("{package}.{class}")), ApplicationInfo::new(package, uid))
}

/// Sender minted through [`PackageResolver::intent_sender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedSender {
	pub id: PendingIntentId,
	pub creator: String,
	pub uid: Uid,
	pub intent: Intent,
}

/// Everything the fakes answer from and record into.
#[derive(Debug, Default)]
pub struct FakeState {
	pub activities: FxHashMap<ComponentName, ActivityInfo>,
	/// Implicit resolution: action to component.
	pub actions: FxHashMap<String, ComponentName>,
	/// Components only reachable as instant apps, with their auxiliary info.
	pub instant_only: FxHashMap<ComponentName, AuxiliaryResolveInfo>,
	pub installer: Option<ComponentName>,
	pub voice_capable: FxHashSet<ComponentName>,
	pub review_required: FxHashSet<String>,
	pub voice_check_fails: bool,

	pub deny_start: bool,
	pub firewall_blocks: bool,
	pub deny_runtime: bool,
	pub background_start_uids: FxHashSet<Uid>,
	pub system_alert_uids: FxHashSet<Uid>,
	pub device_owner: Option<Uid>,
	pub companion_uids: FxHashSet<Uid>,
	pub app_switch_uids: FxHashSet<Uid>,

	pub processes: Vec<ProcessInfo>,
	pub uid_states: FxHashMap<Uid, ProcessState>,
	pub heavy_weight: Option<ProcessInfo>,

	pub lock_task_violations: FxHashSet<TaskId>,

	pub locked_packages: FxHashSet<String>,
	pub opened_packages: FxHashSet<String>,
	pub alarm_or_call_actions: FxHashSet<String>,
	pub app_lock_intents: Vec<(String, Intent)>,
	pub app_lock_screens: Vec<String>,

	pub recents_uid: Option<Uid>,
	pub recents_added: Vec<TaskId>,
	pub freeze_reordering: bool,
	pub freeze_resets: usize,

	pub pinned_restart_attempts: Vec<bool>,
	pub phase_two_requests: Vec<ComponentName>,
	pub senders: Vec<MintedSender>,
}

/// One lock-protected [`FakeState`] behind every policy trait.
#[derive(Debug, Default, Clone)]
pub struct FakeSystem {
	state: Arc<Mutex<FakeState>>,
}

impl FakeSystem {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn lock(&self) -> MutexGuard<'_, FakeState> {
		self.state.lock()
	}

	/// Makes `info` resolvable by component.
	pub fn install(&self, info: ActivityInfo) {
		self.lock().activities.insert(info.component.clone(), info);
	}

	/// Makes `info` resolvable by component and by `action`.
	pub fn install_for_action(&self, action: &str, info: ActivityInfo) {
		let mut state = self.lock();
		state.actions.insert(action.to_owned(), info.component.clone());
		state.activities.insert(info.component.clone(), info);
	}

	pub fn add_process(&self, pid: Pid, uid: Uid, name: &str) {
		self.lock().processes.push(ProcessInfo {
			pid,
			uid,
			name: name.to_owned(),
			background_starts_allowed: false,
		});
	}

	pub fn set_uid_state(&self, uid: Uid, state: ProcessState) {
		self.lock().uid_states.insert(uid, state);
	}
}

impl PermissionPolicy for FakeSystem {
	fn check_start_any_activity(&self, _check: &StartPermissionCheck<'_>) -> bool {
		!self.lock().deny_start
	}

	fn check_intent_firewall(&self, _intent: &Intent, _calling_uid: Uid, _calling_pid: Option<Pid>, _resolved_type: Option<&str>, _app: &ApplicationInfo) -> bool {
		!self.lock().firewall_blocks
	}

	fn check_start_activity(&self, _intent: &Intent, _calling_uid: Uid, _calling_package: Option<&str>) -> bool {
		!self.lock().deny_runtime
	}

	fn can_start_activities_from_background(&self, _pid: Option<Pid>, uid: Uid) -> bool {
		self.lock().background_start_uids.contains(&uid)
	}

	fn has_system_alert_window(&self, uid: Uid, _pid: Option<Pid>, _package: Option<&str>) -> bool {
		self.lock().system_alert_uids.contains(&uid)
	}

	fn is_device_owner(&self, uid: Uid) -> bool {
		self.lock().device_owner == Some(uid)
	}

	fn is_associated_companion_app(&self, _user: UserId, uid: Uid) -> bool {
		self.lock().companion_uids.contains(&uid)
	}

	fn can_stop_app_switches(&self, _pid: Option<Pid>, uid: Uid) -> bool {
		self.lock().app_switch_uids.contains(&uid)
	}
}

impl PackageResolver for FakeSystem {
	fn resolve_intent(&self, intent: &Intent, _resolved_type: Option<&str>, _user: UserId, _filter_uid: Uid) -> Option<ResolveInfo> {
		let state = self.lock();
		let component = match &intent.component {
			Some(c) => c.clone(),
			None => state.actions.get(intent.action.as_deref()?)?.clone(),
		};
		if let Some(aux) = state.instant_only.get(&component) {
			let installer = state.activities.get(&aux.installer)?.clone();
			return Some(ResolveInfo {
				activity: installer,
				auxiliary: Some(aux.clone()),
			});
		}
		state.activities.get(&component).cloned().map(ResolveInfo::new)
	}

	fn resolve_activity(&self, intent: &Intent, resolve: Option<&ResolveInfo>, _start_flags: StartFlags, _user: UserId) -> Option<ActivityInfo> {
		if let Some(resolve) = resolve {
			return Some(resolve.activity.clone());
		}
		let component = intent.component.as_ref()?;
		self.lock().activities.get(component).cloned()
	}

	fn activity_supports_intent(&self, component: &ComponentName, _intent: &Intent, _resolved_type: Option<&str>) -> std::result::Result<bool, ClientGone> {
		let state = self.lock();
		if state.voice_check_fails {
			return Err(ClientGone);
		}
		Ok(state.voice_capable.contains(component))
	}

	fn is_permission_review_required(&self, package: &str, _user: UserId) -> bool {
		self.lock().review_required.contains(package)
	}

	fn is_instant_app_installer_component(&self, component: &ComponentName) -> bool {
		self.lock().installer.as_ref() == Some(component)
	}

	fn request_instant_app_phase_two(&self, auxiliary: &AuxiliaryResolveInfo, _intent: &Intent, _resolved_type: Option<&str>, _calling_package: Option<&str>, _user: UserId) {
		self.lock().phase_two_requests.push(auxiliary.installer.clone());
	}

	fn intent_sender(&self, creator_package: &str, uid: Uid, _user: UserId, intent: &Intent) -> PendingIntentId {
		let mut state = self.lock();
		let id = PendingIntentId(state.senders.len() as u64 + 1);
		state.senders.push(MintedSender {
			id,
			creator: creator_package.to_owned(),
			uid,
			intent: intent.clone(),
		});
		id
	}
}

impl ProcessRegistry for FakeSystem {
	fn process_for_caller(&self, caller: Pid) -> Option<ProcessInfo> {
		self.lock().processes.iter().find(|p| p.pid == caller).cloned()
	}

	fn process(&self, pid: Option<Pid>, uid: Uid) -> Option<ProcessInfo> {
		let state = self.lock();
		match pid {
			Some(pid) => state.processes.iter().find(|p| p.pid == pid && p.uid == uid).cloned(),
			None => state.processes.iter().find(|p| p.uid == uid).cloned(),
		}
	}

	fn processes_for_uid(&self, uid: Uid) -> Vec<ProcessInfo> {
		self.lock().processes.iter().filter(|p| p.uid == uid).cloned().collect()
	}

	fn uid_state(&self, uid: Uid) -> ProcessState {
		self.lock().uid_states.get(&uid).copied().unwrap_or_default()
	}

	fn heavy_weight_process(&self) -> Option<ProcessInfo> {
		self.lock().heavy_weight.clone()
	}
}

impl LockTaskController for FakeSystem {
	fn is_lock_task_mode_violation(&self, task: &Task, _is_clearing: bool) -> bool {
		self.lock().lock_task_violations.contains(&task.id)
	}
}

impl AppLockPolicy for FakeSystem {
	fn is_app_locked(&self, package: &str) -> bool {
		self.lock().locked_packages.contains(package)
	}

	fn is_app_opened(&self, package: &str) -> bool {
		self.lock().opened_packages.contains(package)
	}

	fn is_alarm_or_call_intent(&self, intent: &Intent) -> bool {
		let state = self.lock();
		intent.action.as_deref().is_some_and(|a| state.alarm_or_call_actions.contains(a))
	}

	fn set_app_intent(&self, package: &str, intent: &Intent) {
		self.lock().app_lock_intents.push((package.to_owned(), intent.clone()));
	}

	fn launch_before_activity(&self, package: &str) {
		self.lock().app_lock_screens.push(package.to_owned());
	}
}

impl RecentTasks for FakeSystem {
	fn is_caller_recents(&self, uid: Uid) -> bool {
		self.lock().recents_uid == Some(uid)
	}

	fn add(&self, task: &Task) {
		let mut state = self.lock();
		if !state.recents_added.contains(&task.id) {
			state.recents_added.push(task.id);
		}
	}

	fn is_freeze_task_list_reordering_set(&self) -> bool {
		self.lock().freeze_reordering
	}

	fn set_freeze_task_list_reordering(&self) {
		self.lock().freeze_reordering = true;
	}

	fn reset_freeze_task_list_reordering_on_timeout(&self) {
		let mut state = self.lock();
		state.freeze_reordering = false;
		state.freeze_resets += 1;
	}
}

impl TaskChangeNotifier for FakeSystem {
	fn notify_pinned_activity_restart_attempt(&self, cleared_task: bool) {
		self.lock().pinned_restart_attempts.push(cleared_task);
	}
}

/// Watcher answering every start with a fixed verdict.
#[derive(Debug, Clone, Default)]
pub struct FakeWatcher {
	pub veto: bool,
	pub dead: bool,
	pub seen: Arc<Mutex<Vec<String>>>,
}

impl ActivityController for FakeWatcher {
	fn activity_starting(&self, _intent: &Intent, package: &str) -> std::result::Result<bool, ClientGone> {
		if self.dead {
			return Err(ClientGone);
		}
		self.seen.lock().push(package.to_owned());
		Ok(!self.veto)
	}
}

/// Window side stand-in recording every call.
#[derive(Debug, Default)]
pub struct FakeSurface {
	pub deferred: u32,
	/// Number of times the outermost batch closed.
	pub layouts: usize,
	pub transitions: Vec<Transit>,
	pub executed: usize,
	pub visible_uids: FxHashSet<Uid>,
	pub recents_shown: usize,
	pub config: Configuration,
	pub config_updates: Vec<Configuration>,
}

impl SurfaceHost for FakeSurface {
	fn defer_surface_layout(&mut self) {
		self.deferred += 1;
	}

	fn continue_surface_layout(&mut self) {
		self.deferred = self.deferred.saturating_sub(1);
		if self.deferred == 0 {
			self.layouts += 1;
		}
	}

	fn prepare_app_transition(&mut self, transit: Transit, _always_keep_current: bool) {
		self.transitions.push(transit);
	}

	fn execute_app_transition(&mut self) {
		self.executed += 1;
	}

	fn is_any_non_toast_window_visible_for_uid(&self, uid: Uid) -> bool {
		self.visible_uids.contains(&uid)
	}

	fn show_recent_apps(&mut self) {
		self.recents_shown += 1;
	}

	fn global_configuration(&self) -> Configuration {
		self.config
	}

	fn update_configuration(&mut self, config: Configuration) {
		self.config = config;
		self.config_updates.push(config);
	}
}

/// Hierarchy, controller and fakes wired together.
pub struct LaunchHarness {
	pub h: Hierarchy,
	pub controller: LaunchController,
	pub system: FakeSystem,
	pub surface: FakeSurface,
	pub watcher: Option<Box<dyn ActivityController>>,
	pub clock: ManualClock,
}

impl Default for LaunchHarness {
	fn default() -> Self {
		Self::new(LaunchConfig::default())
	}
}

impl LaunchHarness {
	pub fn new(config: LaunchConfig) -> Self {
		Self {
			h: Hierarchy::new(),
			controller: LaunchController::new(config),
			system: FakeSystem::new(),
			surface: FakeSurface::default(),
			watcher: None,
			clock: ManualClock::new(),
		}
	}

	/// Harness with a resumed launcher in the home stack of the default display.
	pub fn with_home() -> Self {
		let mut harness = Self::default();
		harness.install_home();
		harness
	}

	pub fn install_home(&mut self) -> RecordId {
		let info = activity("com.launcher", "Home", LAUNCHER_UID).with_activity_type(ActivityType::Home);
		self.system.install(info.clone());
		let stack = self
			.h
			.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Fullscreen, ActivityType::Home, true)
			.expect("default display exists");
		let task = self
			.h
			.create_task(stack, None, UserId::SYSTEM, LAUNCHER_UID, None, true)
			.expect("home stack exists");
		let intent = Intent::for_component(info.component.clone());
		let record = self.h.create_record(RecordSpec::new(info, intent, LAUNCHER_UID));
		self.h.add_record_to_task(record, task).expect("home task exists");
		if let Some(t) = self.h.task_mut(task) {
			t.in_recents = true;
		}
		self.h.move_stack_to_front(stack, "test-home").expect("home stack exists");
		self.h.resume_focused_stack_top();
		self.surface.visible_uids.insert(LAUNCHER_UID);
		record
	}

	/// Borrows the collaborators for one call.
	pub fn env(&mut self) -> (&mut Hierarchy, &mut LaunchController, Collaborators<'_>) {
		let env = Collaborators {
			permissions: &self.system,
			packages: &self.system,
			processes: &self.system,
			lock_task: &self.system,
			app_lock: &self.system,
			recents: &self.system,
			task_changes: &self.system,
			controller: &mut self.watcher,
			surface: &mut self.surface,
			clock: &self.clock,
		};
		(&mut self.h, &mut self.controller, env)
	}

	pub fn execute(&mut self, request: StartRequest) -> Result<LaunchOutcome> {
		let (h, controller, mut env) = self.env();
		controller.execute(h, &mut env, request)
	}

	/// Start of `info` from the launcher: resolved, NEW_TASK, user visible.
	pub fn launch(&mut self, info: &ActivityInfo) -> Result<LaunchOutcome> {
		self.execute(self.request_for(info))
	}

	pub fn request_for(&self, info: &ActivityInfo) -> StartRequest {
		let intent = Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK);
		StartRequest::new(intent, LAUNCHER_UID)
			.with_activity_info(info.clone())
			.with_reason("test")
	}
}
