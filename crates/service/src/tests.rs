use std::sync::Arc;
use std::time::Duration;

use foyer_launch::StartRequest;
use foyer_primitives::{ActivityInfo, ComponentName, Intent, IntentFlags, StartResult, TokenKey};
use foyer_tasks::RESULT_CANCELED;
use foyer_window::WindowManager;
use foyer_worker::MonotonicClock;
use pretty_assertions::assert_eq;

use crate::testing::{APP_UID, FakeSystem, FakeWindowSystem, LAUNCHER_UID, ServiceHarness, activity, fake_hosts, fake_policies, request_for};
use crate::{FoyerConfig, FoyerService, ServiceMessage};

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

fn app(class: &str) -> ActivityInfo {
	activity("com.app", class, APP_UID)
}

fn config_with_wait_timeout(ms: u64) -> FoyerConfig {
	let mut config = FoyerConfig::default();
	config.launch.wait_timeout_ms = ms;
	config
}

#[test]
fn launch_registers_an_app_token_and_focuses_it() {
	let mut harness = ServiceHarness::new();
	let info = app("Main");
	let record = harness.launch(&info).unwrap().record.unwrap();
	let key = TokenKey::from(record);
	{
		let guard = harness.lock();
		let token = guard.windows().token(key).expect("app token");
		assert!(!token.kind.as_app().unwrap().hidden_requested);
		assert_eq!(guard.windows().focus().focused_app, Some(key));
		let home = guard.windows().token(TokenKey::from(harness.home)).unwrap();
		assert!(home.kind.as_app().unwrap().hidden_requested);
	}

	let (_, window) = harness.draw(record);
	assert_eq!(harness.lock().windows().focus().current, Some(window));
	assert_eq!(harness.windows.lock().input_focus, Some(window));
}

#[test]
fn finishing_a_record_tears_down_its_windows() {
	let mut harness = ServiceHarness::new();
	let record = harness.launch(&app("Main")).unwrap().record.unwrap();
	let (who, _) = harness.draw(record);

	let finished = harness.lock().with_hierarchy(|h| h.finish_activity(record, RESULT_CANCELED, None, "test"));
	assert!(finished);
	let guard = harness.lock();
	assert!(guard.windows().token(TokenKey::from(record)).is_none());
	assert!(guard.windows().window_for_client(who.client).is_none());
}

#[test]
fn waiting_start_returns_once_the_first_window_draws() {
	let mut harness = ServiceHarness::new();
	let info = app("Main");
	harness.system.install(info.clone());
	let service = harness.service.clone();
	let request = request_for(&info);
	let waiter = std::thread::spawn(move || service.start_activity_and_wait(request));

	harness.wait_until(|g| g.waiters().pending() == 1);
	harness.clock.advance(ms(120));
	let record = harness.lock().hierarchy().resumed_activity().unwrap();
	harness.draw(record);

	let result = waiter.join().unwrap().unwrap();
	assert_eq!(result.result, StartResult::Success);
	assert_eq!(result.who, Some(info.component));
	assert!(!result.timed_out);
	assert_eq!(result.total_time, ms(120));
	let guard = harness.lock();
	assert_eq!(guard.waiters().pending(), 0);
	assert!(!guard.timers().contains(|m| matches!(m, ServiceMessage::WaitTimeout(_))));
}

#[test]
fn waiting_start_times_out_without_a_window() {
	let harness = ServiceHarness::with_config(config_with_wait_timeout(500));
	let info = app("Main");
	harness.system.install(info.clone());
	let service = harness.service.clone();
	let request = request_for(&info);
	let waiter = std::thread::spawn(move || service.start_activity_and_wait(request));

	harness.wait_until(|g| g.waiters().pending() == 1);
	harness.advance(ms(499));
	assert_eq!(harness.lock().waiters().pending(), 1);
	harness.advance(ms(1));

	let result = waiter.join().unwrap().unwrap();
	assert_eq!(result.result, StartResult::Success);
	assert_eq!(result.who, None);
	assert!(result.timed_out);
	assert_eq!(result.total_time, ms(500));
}

#[test]
fn fatal_start_does_not_wait() {
	let harness = ServiceHarness::new();
	let request = StartRequest::new(Intent::for_component(ComponentName::new("com.gone", "com.gone.Main")), LAUNCHER_UID).with_reason("test");

	let result = harness.service.start_activity_and_wait(request).unwrap();
	assert_eq!(result.result, StartResult::ClassNotFound);
	assert_eq!(result.who, None);
	assert_eq!(result.total_time, Duration::ZERO);
	assert_eq!(harness.lock().waiters().pending(), 0);
}

#[test]
fn start_folding_into_the_task_completes_launch_waiters() {
	let harness = ServiceHarness::new();
	let info = app("Main");
	harness.system.install(info.clone());
	let service = harness.service.clone();
	let request = request_for(&info);
	let waiter = std::thread::spawn(move || service.start_activity_and_wait(request));
	harness.wait_until(|g| g.waiters().pending() == 1);

	let again = harness.launch(&info).unwrap();
	assert_eq!(again.result, StartResult::DeliveredToTop);

	let result = waiter.join().unwrap().unwrap();
	assert_eq!(result.result, StartResult::DeliveredToTop);
	assert_eq!(result.who, Some(info.component));
	assert!(!result.timed_out);
}

#[test]
fn deferred_starts_replay_when_the_switch_block_runs_out() {
	let harness = ServiceHarness::new();
	harness.system.lock().background_start_uids.insert(APP_UID);
	let info = app("Main");
	harness.system.install(info.clone());
	harness.lock().stop_app_switches();
	let request = StartRequest::new(Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK), APP_UID)
		.with_activity_info(info.clone())
		.with_reason("test");

	assert_eq!(harness.start(request).unwrap().result, StartResult::SwitchesCanceled);
	let record = harness.lock().launch().pending_launches()[0].record;
	assert!(harness.lock().windows().token(TokenKey::from(record)).is_none());

	let delay = harness.lock().launch().config().app_switch_delay();
	harness.advance(delay);
	let guard = harness.lock();
	assert!(guard.launch().pending_launches().is_empty());
	assert_eq!(guard.hierarchy().resumed_activity(), Some(record));
	assert!(guard.windows().token(TokenKey::from(record)).is_some());
}

#[test]
fn resuming_switches_cancels_the_replay_timer() {
	let harness = ServiceHarness::new();
	harness.lock().stop_app_switches();
	assert!(harness.lock().timers().contains(|m| *m == ServiceMessage::PendingLaunchesDue));
	harness.lock().resume_app_switches().unwrap();
	assert!(!harness.lock().timers().contains(|m| *m == ServiceMessage::PendingLaunchesDue));
}

#[test]
fn missing_reason_is_reported_as_a_launch_error() {
	let harness = ServiceHarness::new();
	let info = app("Main");
	let request = StartRequest::new(Intent::for_component(info.component.clone()), LAUNCHER_UID).with_activity_info(info);
	assert!(matches!(harness.start(request), Err(crate::ServiceError::Launch(foyer_launch::LaunchError::MissingReason))));
}

#[test]
fn dump_covers_both_halves() {
	let harness = ServiceHarness::new();
	harness.launch(&app("Main")).unwrap();
	harness.lock().stop_app_switches();
	let dump = harness.lock().dump();
	assert!(dump.starts_with("FOYER SERVICE"));
	assert!(dump.contains("pending-launches-due"));
	assert!(dump.contains("LAUNCH CONTROLLER"));
	assert!(dump.contains("WINDOW MANAGER"));
	assert!(dump.contains("AppToken"));
}

#[tokio::test]
async fn timer_driver_fires_the_boot_timeout() {
	let mut config = FoyerConfig::default();
	config.window.boot_timeout_ms = 10;
	let system = FakeSystem::new();
	let windows = FakeWindowSystem::new();
	let service = FoyerService::new(config, fake_policies(&system), fake_hosts(&windows), Arc::new(MonotonicClock::new()));
	assert!(!service.lock().windows().boot_state().display_enabled);

	let driver = service.spawn_timer_driver();
	tokio::time::timeout(Duration::from_secs(5), async {
		loop {
			let enabled = service.lock().windows().boot_state().display_enabled;
			if enabled {
				break;
			}
			tokio::time::sleep(ms(5)).await;
		}
	})
	.await
	.unwrap();

	let guard = service.lock();
	assert!(guard.windows().boot_state().force_enabled);
	drop(guard);
	driver.shutdown().await;
}

#[test]
fn screen_enable_is_applied_through_the_guard() {
	let system = FakeSystem::new();
	let windows = FakeWindowSystem::new();
	let clock = foyer_worker::ManualClock::new();
	let service = FoyerService::new(FoyerConfig::default(), fake_policies(&system), fake_hosts(&windows), Arc::new(clock.clone()));
	assert!(service.timers().contains(|m| matches!(m, ServiceMessage::Window(foyer_window::WindowMessage::BootTimeout))));

	service.lock().with_windows(WindowManager::enable_screen_after_boot);
	assert!(service.lock().windows().boot_state().display_enabled);
	assert!(!service.timers().contains(|m| matches!(m, ServiceMessage::Window(foyer_window::WindowMessage::BootTimeout))));
}
