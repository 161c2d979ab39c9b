use foyer_primitives::intent::{ACTION_INSTALL_INSTANT_APP_PACKAGE, ACTION_REVIEW_PERMISSIONS, EXTRA_INTENT, EXTRA_PACKAGE_NAME};
use foyer_primitives::{ActivityInfo, ApplicationInfo, AuxiliaryResolveInfo, ComponentName, Configuration, DisplayId, ExtraValue, Intent, IntentFlags, LaunchMode, Pid, RecordId, StartResult, Uid};
use foyer_tasks::{RESULT_CANCELED, RESULT_OK};
use foyer_worker::Clock;
use pretty_assertions::assert_eq;

use crate::collaborators::ProcessInfo;
use crate::testing::{APP_UID, FakeWatcher, LAUNCHER_UID, LaunchHarness, activity};
use crate::{LaunchConfig, LaunchError, StartFlags, StartRequest, WaitCondition};

fn app(class: &str) -> ActivityInfo {
	activity("com.app", class, APP_UID)
}

/// Start issued by the app from inside `source`.
fn from_record(source: RecordId, info: &ActivityInfo) -> StartRequest {
	StartRequest::new(Intent::for_component(info.component.clone()), APP_UID)
		.with_activity_info(info.clone())
		.with_result(source, None, -1)
		.with_reason("test")
}

fn foreground_app(harness: &mut LaunchHarness) {
	harness.surface.visible_uids.insert(APP_UID);
}

#[test]
fn missing_reason_is_a_caller_error() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	let request = StartRequest::new(Intent::for_component(info.component.clone()), LAUNCHER_UID).with_activity_info(info);
	let tasks_before = harness.h.task_ids().count();

	assert_eq!(harness.execute(request.clone()), Err(LaunchError::MissingReason));
	assert_eq!(harness.execute(request.with_reason("")), Err(LaunchError::MissingReason));
	assert_eq!(harness.h.task_ids().count(), tasks_before);
	assert!(harness.controller.last_start().is_none());
}

#[test]
fn new_task_launch_creates_exactly_one_task() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	let tasks_before = harness.h.task_ids().count();

	let outcome = harness.launch(&info).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = outcome.record.unwrap();
	let task = harness.h.record(record).unwrap().task.unwrap();

	assert_eq!(harness.h.task_ids().count(), tasks_before + 1);
	assert_eq!(harness.h.task(task).unwrap().activities(), &[record]);
	assert_eq!(harness.h.root_activity(task), Some(record));
	assert_eq!(harness.h.stack_of_task(task), outcome.stack);
	assert_eq!(harness.h.focused_stack(), outcome.stack);
	assert_eq!(harness.h.resumed_activity(), Some(record));
	assert!(harness.h.task(task).unwrap().in_recents);
	assert_eq!(harness.system.lock().recents_added, vec![task]);
}

#[test]
fn relaunching_standard_root_folds_into_existing_task() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	let first = harness.launch(&info).unwrap().record.unwrap();
	let tasks = harness.h.task_ids().count();

	let again = harness.launch(&info).unwrap();
	assert_eq!(again.result, StartResult::DeliveredToTop);
	assert_eq!(again.record, Some(first));
	assert_eq!(harness.h.task_ids().count(), tasks);
	assert!(harness.h.record(first).unwrap().new_intents.is_empty());
}

#[test]
fn single_task_clear_top_keeps_one_instance() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	let root = app("Root").with_launch_mode(LaunchMode::SingleTask);
	let detail = app("Detail");

	let root_record = harness.launch(&root).unwrap().record.unwrap();
	let detail_outcome = harness.execute(from_record(root_record, &detail)).unwrap();
	assert_eq!(detail_outcome.result, StartResult::Success);
	let task = harness.h.record(root_record).unwrap().task.unwrap();
	assert_eq!(harness.h.task(task).unwrap().activities().len(), 2);

	let mut request = harness.request_for(&root);
	request.intent.add_flags(IntentFlags::CLEAR_TOP);
	let outcome = harness.execute(request).unwrap();

	assert_eq!(outcome.result, StartResult::DeliveredToTop);
	assert_eq!(outcome.record, Some(root_record));
	assert_eq!(harness.h.task(task).unwrap().activities(), &[root_record]);
	assert_eq!(harness.h.record(root_record).unwrap().new_intents.len(), 1);
	assert!(harness.h.record(detail_outcome.record.unwrap()).is_none());
}

#[test]
fn single_top_relaunch_delivers_new_intent() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Top").with_launch_mode(LaunchMode::SingleTop);
	let record = harness.launch(&info).unwrap().record.unwrap();

	let outcome = harness.launch(&info).unwrap();
	assert_eq!(outcome.result, StartResult::DeliveredToTop);
	assert_eq!(outcome.record, Some(record));
	assert_eq!(harness.h.record(record).unwrap().new_intents.len(), 1);
}

#[test]
fn only_if_needed_returns_intent_to_caller() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	let info = app("Main");
	let record = harness.launch(&info).unwrap().record.unwrap();

	let mut request = from_record(record, &info).with_start_flags(StartFlags::ONLY_IF_NEEDED);
	request.intent.add_flags(IntentFlags::SINGLE_TOP);
	let outcome = harness.execute(request).unwrap();

	assert_eq!(outcome.result, StartResult::ReturnIntentToCaller);
	assert!(harness.h.record(record).unwrap().new_intents.is_empty());
	let task = harness.h.record(record).unwrap().task.unwrap();
	assert_eq!(harness.h.task(task).unwrap().activities(), &[record]);
}

#[test]
fn unresolvable_target_creates_nothing() {
	let mut harness = LaunchHarness::with_home();
	let tasks_before = harness.h.task_ids().count();
	let records_before = harness.h.records().count();

	let implicit = StartRequest::new(Intent::new().with_action("com.app.NOTHING"), LAUNCHER_UID).with_reason("test");
	assert_eq!(harness.execute(implicit).unwrap().result, StartResult::IntentNotResolved);

	let explicit = StartRequest::new(Intent::for_component(ComponentName::new("com.gone", "com.gone.Main")), LAUNCHER_UID).with_reason("test");
	let outcome = harness.execute(explicit).unwrap();
	assert_eq!(outcome.result, StartResult::ClassNotFound);
	assert_eq!(outcome.record, None);

	assert_eq!(harness.h.task_ids().count(), tasks_before);
	assert_eq!(harness.h.records().count(), records_before);
}

#[test]
fn unknown_caller_is_denied() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	let request = harness.request_for(&info).with_caller(Pid(4242));
	assert_eq!(harness.execute(request).unwrap().result, StartResult::PermissionDenied);
}

#[test]
fn known_caller_supplies_identity() {
	let mut harness = LaunchHarness::with_home();
	harness.system.add_process(Pid(77), LAUNCHER_UID, "com.launcher");
	let info = app("Main");
	let request = harness.request_for(&info).with_caller(Pid(77));
	let outcome = harness.execute(request).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = harness.h.record(outcome.record.unwrap()).unwrap();
	assert_eq!(record.launched_from_pid, Some(Pid(77)));
}

#[test]
fn permission_veto_aborts_and_cancels_result() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	let caller = harness.launch(&app("Caller")).unwrap().record.unwrap();
	harness.system.lock().deny_start = true;

	let request = from_record(caller, &app("Target")).with_result(caller, Some("who".into()), 7);
	let outcome = harness.execute(request).unwrap();

	assert_eq!(outcome.result, StartResult::Aborted);
	assert_eq!(outcome.external(), StartResult::Success);
	let results = &harness.h.record(caller).unwrap().results;
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].result_code, RESULT_CANCELED);
	assert_eq!(results[0].request_code, 7);
}

#[test]
fn forward_result_conflicts_with_own_request() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	let source = harness.launch(&app("Main")).unwrap().record.unwrap();

	let mut request = from_record(source, &app("Next")).with_result(source, None, 3);
	request.intent.add_flags(IntentFlags::FORWARD_RESULT);
	assert_eq!(harness.execute(request).unwrap().result, StartResult::ForwardAndRequestConflict);
}

#[test]
fn forward_result_moves_link_to_new_record() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	let origin = harness.launch(&app("Origin")).unwrap().record.unwrap();
	let trampoline = harness
		.execute(from_record(origin, &app("Trampoline")).with_result(origin, Some("pick".into()), 7))
		.unwrap()
		.record
		.unwrap();
	assert_eq!(harness.h.record(trampoline).unwrap().result_to, Some(origin));

	let mut request = from_record(trampoline, &app("Final"));
	request.intent.add_flags(IntentFlags::FORWARD_RESULT);
	let last = harness.execute(request).unwrap().record.unwrap();

	let r = harness.h.record(last).unwrap();
	assert_eq!(r.result_to, Some(origin));
	assert_eq!(r.result_who.as_deref(), Some("pick"));
	assert_eq!(r.request_code, 7);
	assert_eq!(harness.h.record(trampoline).unwrap().result_to, None);

	harness.h.finish_activity(last, RESULT_OK, None, "test");
	let results = &harness.h.record(origin).unwrap().results;
	assert_eq!(results.len(), 1);
	assert_eq!((results[0].result_code, results[0].request_code), (RESULT_OK, 7));
}

#[test]
fn new_task_launch_cancels_requested_result() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	let caller = harness.launch(&app("Caller")).unwrap().record.unwrap();

	let mut request = from_record(caller, &activity("com.other", "Main", Uid(10_099))).with_result(caller, None, 5);
	request.intent.add_flags(IntentFlags::NEW_TASK);
	let outcome = harness.execute(request).unwrap();

	assert_eq!(outcome.result, StartResult::Success);
	assert_eq!(harness.h.record(outcome.record.unwrap()).unwrap().result_to, None);
	let results = &harness.h.record(caller).unwrap().results;
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].result_code, RESULT_CANCELED);
}

#[test]
fn restricted_background_start_proceeds_while_enabled() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Popup");
	let request = StartRequest::new(Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK), APP_UID)
		.with_activity_info(info)
		.with_reason("test");

	let outcome = harness.execute(request).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	assert_eq!(harness.h.resumed_activity(), outcome.record);
}

#[test]
fn restricted_background_start_aborts_when_disabled() {
	let mut harness = LaunchHarness::new(LaunchConfig {
		background_starts_enabled: false,
		..LaunchConfig::default()
	});
	harness.install_home();
	let tasks_before = harness.h.task_ids().count();
	let info = app("Popup");
	let request = StartRequest::new(Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK), APP_UID)
		.with_activity_info(info)
		.with_reason("test");

	let outcome = harness.execute(request).unwrap();
	assert_eq!(outcome.result, StartResult::Aborted);
	assert_eq!(outcome.external(), StartResult::Success);
	assert_eq!(outcome.record, None);
	assert_eq!(harness.h.task_ids().count(), tasks_before);
}

#[test]
fn lock_task_violation_on_reuse() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	let record = harness.launch(&info).unwrap().record.unwrap();
	let task = harness.h.record(record).unwrap().task.unwrap();
	harness.system.lock().lock_task_violations.insert(task);

	assert_eq!(harness.launch(&info).unwrap().result, StartResult::ReturnLockTaskModeViolation);
}

#[test]
fn stopped_app_switches_defer_until_resumed() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	harness.controller.stop_app_switches(harness.clock.now());
	let info = app("Main");
	let request = StartRequest::new(Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK), APP_UID)
		.with_activity_info(info.clone())
		.with_reason("test");
	let tasks_before = harness.h.task_ids().count();

	let outcome = harness.execute(request).unwrap();
	assert_eq!(outcome.result, StartResult::SwitchesCanceled);
	assert_eq!(harness.controller.pending_launches().len(), 1);
	assert_eq!(harness.h.task_ids().count(), tasks_before);

	let (h, controller, mut env) = harness.env();
	controller.resume_app_switches(h, &mut env).unwrap();
	assert!(harness.controller.pending_launches().is_empty());
	assert_eq!(harness.h.task_ids().count(), tasks_before + 1);
	let resumed = harness.h.resumed_activity().and_then(|r| harness.h.record(r)).map(|r| r.component().clone());
	assert_eq!(resumed, Some(info.component));
}

#[test]
fn app_switch_privilege_bypasses_stop() {
	let mut harness = LaunchHarness::with_home();
	foreground_app(&mut harness);
	harness.system.lock().app_switch_uids.insert(APP_UID);
	harness.controller.stop_app_switches(harness.clock.now());
	let info = app("Main");
	let request = StartRequest::new(Intent::for_component(info.component.clone()).with_flags(IntentFlags::NEW_TASK), APP_UID)
		.with_activity_info(info)
		.with_reason("test");

	assert_eq!(harness.execute(request).unwrap().result, StartResult::Success);
}

#[test]
fn watcher_veto_and_death() {
	let mut harness = LaunchHarness::with_home();
	harness.watcher = Some(Box::new(FakeWatcher {
		veto: true,
		..FakeWatcher::default()
	}));
	assert_eq!(harness.launch(&app("Main")).unwrap().result, StartResult::Aborted);

	harness.watcher = Some(Box::new(FakeWatcher {
		dead: true,
		..FakeWatcher::default()
	}));
	assert_eq!(harness.launch(&app("Main")).unwrap().result, StartResult::Success);
	assert!(harness.watcher.is_none());
}

#[test]
fn locked_app_shows_unlock_screen() {
	let mut harness = LaunchHarness::with_home();
	harness.system.lock().locked_packages.insert("com.app".into());

	assert_eq!(harness.launch(&app("Main")).unwrap().result, StartResult::Aborted);
	let state = harness.system.lock();
	assert_eq!(state.app_lock_screens, vec!["com.app".to_owned()]);
	assert_eq!(state.app_lock_intents.len(), 1);
}

#[test]
fn voice_session_requires_voice_capable_target() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	let request = harness.request_for(&info).with_voice_session(foyer_primitives::VoiceSessionId(1));
	assert_eq!(harness.execute(request.clone()).unwrap().result, StartResult::NotVoiceCompatible);

	harness.system.lock().voice_capable.insert(info.component.clone());
	assert_eq!(harness.execute(request).unwrap().result, StartResult::Success);
}

#[test]
fn permission_review_redirects_to_reviewer() {
	let mut harness = LaunchHarness::with_home();
	let reviewer = activity("com.permissions", "Review", Uid::SYSTEM);
	harness.system.install_for_action(ACTION_REVIEW_PERMISSIONS, reviewer.clone());
	harness.system.lock().review_required.insert("com.app".into());

	let outcome = harness.launch(&app("Main")).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = harness.h.record(outcome.record.unwrap()).unwrap();
	assert_eq!(record.component(), &reviewer.component);
	assert!(record.intent.flags.contains(IntentFlags::EXCLUDE_FROM_RECENTS | IntentFlags::MULTIPLE_TASK));
	assert_eq!(record.intent.extras.get(EXTRA_PACKAGE_NAME), Some(&ExtraValue::Str("com.app".into())));
	assert_eq!(harness.system.lock().senders.len(), 1);
}

/// Installs an installer activity and makes `target` reachable only through it.
fn instant_only(harness: &LaunchHarness, target: &ComponentName) -> ActivityInfo {
	let installer = activity("com.installer", "Install", Uid::SYSTEM);
	harness.system.install(installer.clone());
	harness.system.lock().instant_only.insert(
		target.clone(),
		AuxiliaryResolveInfo {
			installer: installer.component.clone(),
			needs_phase_two: true,
			failure_intent: Some(Intent::new().with_action("com.app.INSTALL_FAILED")),
		},
	);
	installer
}

fn waiting_start(target: &ComponentName) -> StartRequest {
	StartRequest::new(Intent::for_component(target.clone()).with_flags(IntentFlags::NEW_TASK), LAUNCHER_UID)
		.with_reason("test")
		.waiting()
}

#[test]
fn instant_app_start_redirects_to_installer() {
	let mut harness = LaunchHarness::with_home();
	let target = app("Instant").component;
	let installer = instant_only(&harness, &target);

	let outcome = harness.execute(waiting_start(&target)).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = harness.h.record(outcome.record.unwrap()).unwrap();
	assert_eq!(record.component(), &installer.component);
	assert_eq!(record.intent.action.as_deref(), Some(ACTION_INSTALL_INSTANT_APP_PACKAGE));
	assert_eq!(record.intent.component.as_ref(), Some(&installer.component));
	assert!(record.intent.flags.contains(IntentFlags::NEW_TASK));
	assert_eq!(record.intent.extras.get(EXTRA_PACKAGE_NAME), Some(&ExtraValue::Str(target.to_string())));
	assert!(matches!(record.intent.extras.get(EXTRA_INTENT), Some(ExtraValue::Sender(_))));
	assert_eq!(harness.h.resumed_activity(), outcome.record);

	let system = harness.system.lock();
	assert_eq!(system.phase_two_requests, vec![installer.component.clone()]);
	assert_eq!(system.senders.len(), 2);
	assert_eq!(system.senders[0].intent.component, None, "the replayed intent resolves again after install");
	assert_eq!(system.senders[1].intent.action.as_deref(), Some("com.app.INSTALL_FAILED"));
}

#[test]
fn permission_review_runs_before_instant_app_redirect() {
	let mut harness = LaunchHarness::with_home();
	let target = app("Instant").component;
	instant_only(&harness, &target);
	let reviewer = activity("com.permissions", "Review", Uid::SYSTEM);
	harness.system.install_for_action(ACTION_REVIEW_PERMISSIONS, reviewer.clone());
	harness.system.lock().review_required.insert("com.installer".into());

	let outcome = harness.execute(waiting_start(&target)).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = harness.h.record(outcome.record.unwrap()).unwrap();
	assert_eq!(record.component(), &reviewer.component);
	assert_eq!(record.intent.action.as_deref(), Some(ACTION_REVIEW_PERMISSIONS));
	assert!(harness.system.lock().phase_two_requests.is_empty());
}

#[test]
fn wait_mode_resolves_implicit_intent() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Viewer");
	harness.system.install_for_action("com.app.VIEW_THING", info.clone());
	let request = StartRequest::new(Intent::new().with_action("com.app.VIEW_THING").with_flags(IntentFlags::NEW_TASK), LAUNCHER_UID)
		.with_reason("test")
		.waiting();

	let outcome = harness.execute(request).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = outcome.record.unwrap();
	assert_eq!(harness.h.record(record).unwrap().component(), &info.component);
	assert_eq!(outcome.wait_condition(&harness.h), WaitCondition::Launched(record));
}

#[test]
fn wait_mode_rejects_file_descriptors() {
	let mut harness = LaunchHarness::with_home();
	let mut intent = Intent::for_component(app("Main").component);
	intent.has_file_descriptors = true;
	let request = StartRequest::new(intent, LAUNCHER_UID).with_reason("test").waiting();
	assert_eq!(harness.execute(request), Err(LaunchError::FileDescriptorsInIntent));
}

#[test]
fn wait_mode_applies_pending_configuration() {
	let mut harness = LaunchHarness::with_home();
	let info = app("Main");
	harness.system.install(info.clone());
	let config = Configuration {
		density_dpi: 320,
		..Configuration::default()
	};
	let request = harness.request_for(&info).waiting().with_global_config(config);

	harness.execute(request).unwrap();
	assert_eq!(harness.surface.config_updates, vec![config]);
}

#[test]
fn wait_mode_switches_heavy_weight_process() {
	let mut harness = LaunchHarness::new(LaunchConfig {
		heavy_weight_feature: true,
		..LaunchConfig::default()
	});
	harness.install_home();
	let switcher = ActivityInfo::new(
		ComponentName::new(crate::HEAVY_WEIGHT_SWITCHER_PACKAGE, crate::HEAVY_WEIGHT_SWITCHER_CLASS),
		ApplicationInfo::new(crate::HEAVY_WEIGHT_SWITCHER_PACKAGE, Uid::SYSTEM),
	);
	harness.system.install(switcher.clone());
	let mut heavy = app("Game");
	heavy.application.cant_save_state = true;
	harness.system.install(heavy.clone());
	harness.system.lock().heavy_weight = Some(ProcessInfo {
		pid: Pid(900),
		uid: Uid(10_077),
		name: "com.other.heavy".into(),
		background_starts_allowed: false,
	});

	let outcome = harness.execute(harness.request_for(&heavy).waiting()).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	let record = harness.h.record(outcome.record.unwrap()).unwrap();
	assert_eq!(record.component(), &switcher.component);
	assert_eq!(record.intent.extras.get("cur_app"), Some(&ExtraValue::Str("com.other.heavy".into())));
	assert_eq!(record.intent.extras.get("new_app"), Some(&ExtraValue::Str("com.app".into())));
}

#[test]
fn surface_layout_batches_balance() {
	let mut harness = LaunchHarness::with_home();
	harness.launch(&app("Main")).unwrap();
	harness.launch(&app("Main")).unwrap();
	assert_eq!(harness.surface.deferred, 0);
	assert_eq!(harness.surface.layouts, 2);
}

#[test]
fn last_start_is_recorded_and_dumped() {
	let mut harness = LaunchHarness::with_home();
	harness.launch(&app("Main")).unwrap();
	assert!(harness.controller.related_to_package("com.app"));
	let mut out = String::new();
	harness.controller.dump(&mut out);
	assert!(out.contains("last start: reason=test"), "{out}");
	assert!(out.contains("package=com.app"), "{out}");
}

#[test]
fn launch_display_option_is_honoured() {
	let mut harness = LaunchHarness::with_home();
	let secondary = DisplayId(3);
	harness.h.add_display(secondary, false, None);
	let info = app("Main");
	let request = harness.request_for(&info).with_options(crate::ActivityOptions::new().with_display(secondary));

	let outcome = harness.execute(request).unwrap();
	assert_eq!(outcome.result, StartResult::Success);
	assert_eq!(harness.h.display_of_record(outcome.record.unwrap()), Some(secondary));
}
