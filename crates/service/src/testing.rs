//! A whole service over in-memory collaborators.
//!
//! [`ServiceHarness`] wires the launch fakes and the window fakes to one
//! [`FoyerService`] on a manual clock, with a resumed launcher that already
//! drew its window.

use std::sync::Arc;
use std::time::Duration;

use foyer_launch::{LaunchOutcome, StartRequest};
use foyer_primitives::{ActivityInfo, ActivityType, ClientId, DisplayId, Intent, IntentFlags, Pid, RecordId, SessionId, Size, TokenKey, Uid, UserId, WindowId, WindowingMode};
use foyer_tasks::RecordSpec;
use foyer_window::{ClientIdentity, LayoutParams, ViewVisibility, WindowManager, WindowType};
use foyer_worker::ManualClock;

pub use foyer_launch::testing::{APP_UID, FakeSystem, FakeWatcher, LAUNCHER_UID, activity};
pub use foyer_window::testing::{ClientCall, FakeWindowSystem};

use crate::config::FoyerConfig;
use crate::error::Result;
use crate::guard::ServiceGuard;
use crate::service::FoyerService;
use crate::state::{LaunchPolicies, WindowHosts};

pub fn fake_policies(system: &FakeSystem) -> LaunchPolicies {
	LaunchPolicies {
		permissions: Box::new(system.clone()),
		packages: Box::new(system.clone()),
		processes: Box::new(system.clone()),
		lock_task: Box::new(system.clone()),
		app_lock: Box::new(system.clone()),
		recents: Box::new(system.clone()),
		task_changes: Box::new(system.clone()),
	}
}

pub fn fake_hosts(windows: &FakeWindowSystem) -> WindowHosts {
	WindowHosts {
		policy: Box::new(windows.clone()),
		compositor: Box::new(windows.clone()),
		input: Box::new(windows.clone()),
		clients: Box::new(windows.clone()),
		transitions: Box::new(windows.clone()),
	}
}

pub struct ServiceHarness {
	pub service: FoyerService,
	pub system: FakeSystem,
	pub windows: FakeWindowSystem,
	pub clock: ManualClock,
	/// The launcher record, resumed in the home stack.
	pub home: RecordId,
	next_client: u64,
}

impl ServiceHarness {
	pub fn new() -> Self {
		Self::with_config(FoyerConfig::default())
	}

	/// The launcher may start activities at any time, as if the user had
	/// just tapped it.
	pub fn with_config(config: FoyerConfig) -> Self {
		crate::telemetry::init_for_tests();
		let system = FakeSystem::new();
		system.lock().background_start_uids.insert(LAUNCHER_UID);
		let windows = FakeWindowSystem::new();
		let clock = ManualClock::new();
		let service = FoyerService::new(config, fake_policies(&system), fake_hosts(&windows), Arc::new(clock.clone()));
		service.lock().with_windows(WindowManager::enable_screen_after_boot);
		let home = install_home(&service, &system);
		let mut harness = Self {
			service,
			system,
			windows,
			clock,
			home,
			next_client: 100,
		};
		harness.draw(home);
		harness
	}

	pub fn lock(&self) -> ServiceGuard<'_> {
		self.service.lock()
	}

	/// Fresh identity for a new client of `uid`.
	pub fn client(&mut self, uid: Uid) -> ClientIdentity {
		self.next_client += 1;
		let n = self.next_client;
		ClientIdentity {
			session: SessionId(n),
			client: ClientId(n),
			uid,
			pid: Pid(n as u32),
		}
	}

	/// The record's process adds its main window and relayouts it visible.
	pub fn draw(&mut self, record: RecordId) -> (ClientIdentity, WindowId) {
		let (uid, package) = {
			let guard = self.lock();
			let r = guard.hierarchy().record(record).expect("record exists");
			(r.uid(), r.package().to_owned())
		};
		let who = self.client(uid);
		let attrs = LayoutParams::new(WindowType::APPLICATION, package).with_token(TokenKey::from(record));
		let id = self.lock().with_windows(|wm| {
			let id = wm.add_window(who, attrs, ViewVisibility::Visible).expect("app window added");
			wm.relayout_window(who.client, None, Size::new(0, 0), ViewVisibility::Visible).expect("relayout after add");
			id
		});
		(who, id)
	}

	pub fn start(&self, request: StartRequest) -> Result<LaunchOutcome> {
		self.lock().start_activity(request)
	}

	/// Start of `info` from the launcher: resolved, NEW_TASK, user visible.
	pub fn launch(&self, info: &ActivityInfo) -> Result<LaunchOutcome> {
		self.system.install(info.clone());
		self.start(request_for(info))
	}

	/// Advances the clock and fires everything that came due.
	pub fn advance(&self, by: Duration) -> usize {
		self.clock.advance(by);
		self.service.fire_due()
	}

	/// Polls until `pred` holds under the lock. Panics after about two seconds.
	pub fn wait_until(&self, mut pred: impl FnMut(&ServiceGuard<'_>) -> bool) {
		for _ in 0..2_000 {
			if pred(&self.lock()) {
				return;
			}
			std::thread::sleep(Duration::from_millis(1));
		}
		panic!("condition not reached under the service lock");
	}
}

impl Default for ServiceHarness {
	fn default() -> Self {
		Self::new()
	}
}

pub fn request_for(info: &ActivityInfo) -> StartRequest {
	let intent = Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK);
	StartRequest::new(intent, LAUNCHER_UID).with_activity_info(info.clone()).with_reason("test")
}

fn install_home(service: &FoyerService, system: &FakeSystem) -> RecordId {
	let info = activity("com.launcher", "Home", LAUNCHER_UID).with_activity_type(ActivityType::Home);
	system.install(info.clone());
	service.lock().with_hierarchy(|h| {
		let stack = h
			.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Fullscreen, ActivityType::Home, true)
			.expect("default display exists");
		let task = h.create_task(stack, None, UserId::SYSTEM, LAUNCHER_UID, None, true).expect("home stack exists");
		let intent = Intent::for_component(info.component.clone());
		let record = h.create_record(RecordSpec::new(info, intent, LAUNCHER_UID));
		h.add_record_to_task(record, task).expect("home task exists");
		if let Some(t) = h.task_mut(task) {
			t.in_recents = true;
		}
		h.move_stack_to_front(stack, "test-home").expect("home stack exists");
		h.resume_focused_stack_top();
		record
	})
}
