use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use foyer_launch::{LaunchController, StartRequest, WaitResult};
use foyer_tasks::Hierarchy;
use foyer_window::WindowManager;
use foyer_worker::{Clock, TimerSink, run_timer_driver};
use parking_lot::{Condvar, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::FoyerConfig;
use crate::error::Result;
use crate::guard::ServiceGuard;
use crate::state::{LaunchPolicies, ServiceState, WindowHosts};
use crate::timers::TimerQueue;
use crate::wait::Waiters;

pub(crate) struct Shared {
	state: Mutex<ServiceState>,
	cond: Condvar,
	timers: Arc<TimerQueue>,
}

impl Shared {
	fn lock(&self) -> ServiceGuard<'_> {
		ServiceGuard {
			state: self.state.lock(),
			cond: &self.cond,
		}
	}
}

impl TimerSink for Shared {
	fn time_to_next(&self) -> Option<Duration> {
		self.timers.time_to_next()
	}

	fn fire_due(&self) -> usize {
		self.lock().fire_due()
	}
}

/// The activity/window service: one lock over the task hierarchy, the
/// launch controller and the window manager.
///
/// Cloning shares the same state.
#[derive(Clone)]
pub struct FoyerService {
	shared: Arc<Shared>,
}

impl FoyerService {
	pub fn new(config: FoyerConfig, policies: LaunchPolicies, hosts: WindowHosts, clock: Arc<dyn Clock>) -> Self {
		let timers = Arc::new(TimerQueue::new(clock.clone()));
		let mut wm = WindowManager::new(config.window, hosts.into_env(timers.clone()));
		wm.arm_boot_timeout();
		let state = ServiceState {
			hierarchy: Hierarchy::new(),
			launch: LaunchController::new(config.launch),
			wm,
			policies,
			watcher: None,
			waiters: Waiters::default(),
			clock,
			timers: timers.clone(),
			pending_launches_timer: None,
		};
		tracing::info!("service: created");
		Self {
			shared: Arc::new(Shared {
				state: Mutex::new(state),
				cond: Condvar::new(),
				timers,
			}),
		}
	}

	/// Service configured from a `foyer.toml` file.
	pub fn from_config_path(path: impl AsRef<Path>, policies: LaunchPolicies, hosts: WindowHosts, clock: Arc<dyn Clock>) -> Result<Self> {
		let config = FoyerConfig::load(path)?;
		Ok(Self::new(config, policies, hosts, clock))
	}

	/// Takes the service lock.
	pub fn lock(&self) -> ServiceGuard<'_> {
		self.shared.lock()
	}

	pub fn timers(&self) -> &Arc<TimerQueue> {
		&self.shared.timers
	}

	/// Fires every due message under the lock.
	pub fn fire_due(&self) -> usize {
		self.shared.fire_due()
	}

	/// Starts an activity and blocks until the caller has something to
	/// report: the new record drew its first window, the task brought to
	/// front became visible, a later start folded into it, or the wait timed
	/// out. The lock is released while blocked.
	pub fn start_activity_and_wait(&self, request: StartRequest) -> Result<WaitResult> {
		let mut guard = self.lock();
		let started = guard.now();
		let outcome = guard.start_activity(request)?;
		let Some(id) = guard.register_waiter(&outcome, started) else {
			return Ok(guard.immediate_result(&outcome));
		};
		loop {
			if let Some(result) = guard.take_wait_result(id) {
				tracing::debug!(%id, result = %result.result, timed_out = result.timed_out, "service.wait: done");
				return Ok(result);
			}
			guard.wait();
		}
	}

	/// Pumps the timer queue on the current tokio runtime until the returned
	/// driver is shut down.
	pub fn spawn_timer_driver(&self) -> TimerDriver {
		let cancel = CancellationToken::new();
		let sink: Arc<dyn TimerSink> = self.shared.clone();
		let handle = tokio::spawn(run_timer_driver(sink, self.shared.timers.wake(), cancel.clone()));
		TimerDriver { cancel, handle }
	}
}

/// A running timer driver.
pub struct TimerDriver {
	cancel: CancellationToken,
	handle: JoinHandle<()>,
}

impl TimerDriver {
	/// Cancels the driver and waits for it to stop.
	pub async fn shutdown(self) {
		self.cancel.cancel();
		if let Err(err) = self.handle.await {
			tracing::warn!(%err, "service.timers: driver task failed");
		}
	}
}
