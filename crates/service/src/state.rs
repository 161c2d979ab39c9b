//! Everything the service lock protects.

use std::sync::Arc;

use foyer_launch::collaborators::{
	ActivityController, AppLockPolicy, Collaborators, LockTaskController, PackageResolver, PermissionPolicy, ProcessRegistry, RecentTasks, TaskChangeNotifier,
};
use foyer_launch::LaunchController;
use foyer_tasks::Hierarchy;
use foyer_window::{AppTransitionHost, Compositor, InputMonitor, WindowClients, WindowEnv, WindowManager, WindowPolicy};
use foyer_worker::{Clock, TimerToken};

use crate::bridge::WindowSurface;
use crate::timers::{TimerQueue, WindowTimerPort};
use crate::wait::Waiters;

/// Launch-side collaborators owned by the service.
pub struct LaunchPolicies {
	pub permissions: Box<dyn PermissionPolicy>,
	pub packages: Box<dyn PackageResolver>,
	pub processes: Box<dyn ProcessRegistry>,
	pub lock_task: Box<dyn LockTaskController>,
	pub app_lock: Box<dyn AppLockPolicy>,
	pub recents: Box<dyn RecentTasks>,
	pub task_changes: Box<dyn TaskChangeNotifier>,
}

/// Window-side collaborators. Timers are supplied by the service.
pub struct WindowHosts {
	pub policy: Box<dyn WindowPolicy>,
	pub compositor: Box<dyn Compositor>,
	pub input: Box<dyn InputMonitor>,
	pub clients: Box<dyn WindowClients>,
	pub transitions: Box<dyn AppTransitionHost>,
}

impl WindowHosts {
	pub(crate) fn into_env(self, timers: Arc<TimerQueue>) -> WindowEnv {
		WindowEnv {
			policy: self.policy,
			compositor: self.compositor,
			input: self.input,
			clients: self.clients,
			transitions: self.transitions,
			timers: Box::new(WindowTimerPort(timers)),
		}
	}
}

pub(crate) struct ServiceState {
	pub(crate) hierarchy: Hierarchy,
	pub(crate) launch: LaunchController,
	pub(crate) wm: WindowManager,
	pub(crate) policies: LaunchPolicies,
	pub(crate) watcher: Option<Box<dyn ActivityController>>,
	pub(crate) waiters: Waiters,
	pub(crate) clock: Arc<dyn Clock>,
	pub(crate) timers: Arc<TimerQueue>,
	/// Replay of deferred starts once app switches are allowed again.
	pub(crate) pending_launches_timer: Option<TimerToken>,
}

impl ServiceState {
	/// Runs `f` with the hierarchy, the controller and a full set of launch
	/// collaborators borrowed from this state.
	pub(crate) fn with_launch<R>(&mut self, f: impl FnOnce(&mut LaunchController, &mut Hierarchy, &mut Collaborators<'_>) -> R) -> R {
		let Self {
			hierarchy,
			launch,
			wm,
			policies,
			watcher,
			clock,
			..
		} = self;
		let mut surface = WindowSurface(wm);
		let mut env = Collaborators {
			permissions: policies.permissions.as_ref(),
			packages: policies.packages.as_ref(),
			processes: policies.processes.as_ref(),
			lock_task: policies.lock_task.as_ref(),
			app_lock: policies.app_lock.as_ref(),
			recents: policies.recents.as_ref(),
			task_changes: policies.task_changes.as_ref(),
			controller: watcher,
			surface: &mut surface,
			clock: clock.as_ref(),
		};
		f(launch, hierarchy, &mut env)
	}
}
