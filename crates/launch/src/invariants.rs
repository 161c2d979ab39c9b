//! Invariant catalog for [`crate::LaunchController`].

use foyer_primitives::{DisplayId, Intent, IntentFlags, LaunchMode, PendingIntentId, StartResult, TaskId, Uid};
use proptest::prelude::*;

use crate::background::{BackgroundFacts, BackgroundStartQuery, evaluate};
use crate::testing::{APP_UID, FakeSurface, FakeSystem, LaunchHarness, activity};
use crate::{LaunchConfig, LaunchError, StartRequest};

fn stack_count(harness: &LaunchHarness) -> usize {
	harness.h.display(DisplayId::DEFAULT).map_or(0, |d| d.stacks().len())
}

/// Must reject a start without a reason before touching any state.
///
/// * Enforced in: `LaunchController::execute`
/// * Failure symptom: Anonymous starts slip into the hierarchy and the last-start dump.
#[cfg_attr(test, test)]
pub(crate) fn test_start_without_reason_mutates_nothing() {
	let mut harness = LaunchHarness::with_home();
	let info = activity("com.app", "Main", APP_UID);
	let records = harness.h.records().count();
	let request = StartRequest::new(Intent::for_component(info.component.clone()), APP_UID).with_activity_info(info);

	assert_eq!(harness.execute(request), Err(LaunchError::MissingReason));
	assert_eq!(harness.h.records().count(), records);
	assert_eq!(harness.controller.last_start(), None);
}

/// Must deliver a reused record's new intent at most once per start.
///
/// * Enforced in: `Starter::start_into_reused`, `Starter::set_task_from_intent_activity`
/// * Failure symptom: The app handles the same intent twice after a CLEAR_TOP relaunch.
#[cfg_attr(test, test)]
pub(crate) fn test_new_intent_delivered_at_most_once() {
	let mut harness = LaunchHarness::with_home();
	let info = activity("com.app", "Root", APP_UID).with_launch_mode(LaunchMode::SingleTask);
	let record = harness.launch(&info).unwrap().record.unwrap();

	for round in 1..=3 {
		let mut request = harness.request_for(&info);
		request.intent.add_flags(IntentFlags::CLEAR_TOP);
		harness.execute(request).unwrap();
		assert_eq!(harness.h.record(record).unwrap().new_intents.len(), round);
	}
}

/// Must report a silently aborted start as a success to the caller.
///
/// * Enforced in: `StartResult::external`, `LaunchOutcome::external`
/// * Failure symptom: Callers retry starts that were dropped on purpose.
#[cfg_attr(test, test)]
pub(crate) fn test_aborted_start_looks_successful() {
	let mut harness = LaunchHarness::with_home();
	harness.system.lock().deny_start = true;
	let outcome = harness.launch(&activity("com.app", "Main", APP_UID)).unwrap();
	assert_eq!(outcome.result, StartResult::Aborted);
	assert_eq!(outcome.external(), StartResult::Success);
	assert!(outcome.reports_to_waiters());
}

/// Must not leave an empty stack behind when placement fails.
///
/// * Enforced in: `Starter::run`
/// * Failure symptom: Invisible empty stacks pile up and steal focus.
#[cfg_attr(test, test)]
pub(crate) fn test_failed_start_leaves_no_empty_stack() {
	let mut harness = LaunchHarness::with_home();
	let stacks = stack_count(&harness);
	let home_task = harness.h.task_ids().next().unwrap();
	harness.system.lock().lock_task_violations.insert(TaskId(home_task.0 + 1));

	let outcome = harness.launch(&activity("com.app", "Main", APP_UID)).unwrap();
	assert_eq!(outcome.result, StartResult::ReturnLockTaskModeViolation);
	assert_eq!(outcome.stack, None);
	assert_eq!(stack_count(&harness), stacks);
	assert_eq!(harness.h.task_ids().count(), 1);
}

/// Must keep surface layout deferral balanced across every start.
///
/// * Enforced in: `Starter::run`
/// * Failure symptom: Window layout stays frozen after a failed start.
#[cfg_attr(test, test)]
pub(crate) fn test_layout_deferral_is_balanced() {
	let mut harness = LaunchHarness::with_home();
	harness.system.lock().lock_task_violations.insert(TaskId(2));
	let _ = harness.launch(&activity("com.app", "Main", APP_UID));
	let _ = harness.launch(&activity("com.app", "Other", APP_UID));
	assert_eq!(harness.surface.deferred, 0);
}

fn intent() -> impl Strategy<Value = Intent> {
	(proptest::option::of("[a-z.]{1,20}"), any::<u32>(), proptest::option::of("[a-z:/]{1,12}")).prop_map(|(action, flags, data)| {
		let mut intent = Intent::new().with_flags(IntentFlags::from_bits_truncate(flags));
		intent.action = action;
		intent.data = data;
		intent
	})
}

proptest! {
	/// Must restrict a start whose callers have no exemption, whatever the intent says.
	///
	/// * Enforced in: `background::evaluate`
	/// * Failure symptom: Apps pop activities over the user from the background.
	#[test]
	fn prop_unexempt_background_start_is_restricted(
		intent in intent(),
		calling in 10_000u32..19_999,
		real in 10_000u32..19_999,
		pending in any::<bool>(),
	) {
		let system = FakeSystem::new();
		let surface = FakeSurface::default();
		let query = BackgroundStartQuery {
			calling_uid: Uid(calling),
			calling_pid: None,
			calling_package: Some("com.app"),
			real_calling_uid: Uid(real),
			real_calling_pid: None,
			caller_app: None,
			originating_pending_intent: pending.then_some(PendingIntentId(1)),
			allowlisted: false,
			intent: &intent,
		};
		let facts = BackgroundFacts {
			permissions: &system,
			processes: &system,
			recents: &system,
			windows: &surface,
		};
		let verdict = evaluate(&query, &facts, &LaunchConfig::default());
		prop_assert!(verdict.should_abort());
	}

	/// The first visible window among the callers lets any intent through.
	#[test]
	fn prop_visible_caller_is_never_restricted(intent in intent(), calling in 10_000u32..19_999) {
		let system = FakeSystem::new();
		let mut surface = FakeSurface::default();
		surface.visible_uids.insert(Uid(calling));
		let query = BackgroundStartQuery {
			calling_uid: Uid(calling),
			calling_pid: None,
			calling_package: None,
			real_calling_uid: Uid(calling),
			real_calling_pid: None,
			caller_app: None,
			originating_pending_intent: None,
			allowlisted: false,
			intent: &intent,
		};
		let facts = BackgroundFacts {
			permissions: &system,
			processes: &system,
			recents: &system,
			windows: &surface,
		};
		prop_assert!(!evaluate(&query, &facts, &LaunchConfig::default()).should_abort());
	}
}
