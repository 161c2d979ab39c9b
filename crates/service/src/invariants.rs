//! Invariant catalog for [`crate::FoyerService`].

use std::time::Duration;

use foyer_primitives::{RecordId, TokenKey};
use foyer_tasks::RESULT_CANCELED;
use proptest::prelude::*;

use crate::FoyerConfig;
use crate::testing::{APP_UID, ServiceHarness, activity, request_for};

/// Must mirror every hierarchy change made under the lock onto the window side.
///
/// * Enforced in: `ServiceGuard::settle`, `bridge::apply_events`
/// * Failure symptom: The screen shows one app while the activity side resumed another.
#[cfg_attr(test, test)]
pub(crate) fn test_hierarchy_changes_reach_the_window_side() {
	let harness = ServiceHarness::new();
	let record = harness.launch(&activity("com.app", "Main", APP_UID)).unwrap().record.unwrap();
	let home_stack = harness.lock().hierarchy().stack_of_record(harness.home).unwrap();

	harness.lock().with_hierarchy(|h| {
		h.move_stack_to_front(home_stack, "test").unwrap();
		h.resume_focused_stack_top();
	});
	let guard = harness.lock();
	assert_eq!(guard.windows().focus().focused_app, Some(TokenKey::from(harness.home)));
	assert!(!guard.windows().token(TokenKey::from(harness.home)).unwrap().kind.as_app().unwrap().hidden_requested);
	assert!(guard.windows().token(TokenKey::from(record)).unwrap().kind.as_app().unwrap().hidden_requested);
}

/// Must release the service lock while a caller waits for its launch.
///
/// * Enforced in: `ServiceGuard::wait`, `FoyerService::start_activity_and_wait`
/// * Failure symptom: The first waiting start freezes every other caller until it times out.
#[cfg_attr(test, test)]
pub(crate) fn test_waiting_caller_releases_the_lock() {
	let mut config = FoyerConfig::default();
	config.launch.wait_timeout_ms = 1_000;
	let harness = ServiceHarness::with_config(config);
	let info = activity("com.app", "Main", APP_UID);
	harness.system.install(info.clone());
	let service = harness.service.clone();
	let request = request_for(&info);
	let waiter = std::thread::spawn(move || service.start_activity_and_wait(request));

	harness.wait_until(|g| g.waiters().pending() == 1);
	harness.launch(&activity("com.other", "Main", APP_UID)).unwrap();
	harness.advance(Duration::from_millis(1_000));

	let result = waiter.join().unwrap().unwrap();
	assert!(result.timed_out);
	assert_eq!(harness.lock().waiters().pending(), 0);
}

#[derive(Debug, Clone)]
enum Op {
	Launch(usize),
	FinishTop,
	DrawTop,
	ResumeTop,
	Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0..3usize).prop_map(Op::Launch),
		Just(Op::FinishTop),
		Just(Op::DrawTop),
		Just(Op::ResumeTop),
		(1..2_000u64).prop_map(Op::Advance),
	]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn prop_app_tokens_follow_attached_records(ops in proptest::collection::vec(op(), 1..24)) {
		let mut harness = ServiceHarness::new();
		let infos = [
			activity("com.app", "Main", APP_UID),
			activity("com.app", "Detail", APP_UID),
			activity("com.other", "Main", APP_UID),
		];
		let mut finished: Vec<RecordId> = Vec::new();
		for op in ops {
			match op {
				Op::Launch(i) => {
					let _ = harness.launch(&infos[i]);
				}
				Op::FinishTop => {
					let top = harness.lock().hierarchy().resumed_activity();
					if let Some(record) = top.filter(|r| *r != harness.home)
						&& harness.lock().with_hierarchy(|h| h.finish_activity(record, RESULT_CANCELED, None, "test"))
					{
						finished.push(record);
					}
				}
				Op::DrawTop => {
					let top = harness.lock().hierarchy().resumed_activity();
					if let Some(record) = top {
						let key = TokenKey::from(record);
						let drawable = {
							let guard = harness.lock();
							guard.windows().token(key).is_some() && !guard.windows().is_app_drawn(key)
						};
						if drawable {
							harness.draw(record);
						}
					}
				}
				Op::ResumeTop => {
					harness.lock().with_hierarchy(|h| h.resume_focused_stack_top());
				}
				Op::Advance(ms) => {
					harness.advance(Duration::from_millis(ms));
				}
			}
		}

		let guard = harness.lock();
		for r in guard.hierarchy().records().filter(|r| r.task.is_some()) {
			prop_assert!(guard.windows().token(TokenKey::from(r.id)).is_some(), "record {} has no app token", r.id);
		}
		for r in &finished {
			prop_assert!(guard.windows().token(TokenKey::from(*r)).is_none(), "finished record {} kept its token", r);
		}
		if let Some(app) = guard.windows().focus().focused_app {
			prop_assert!(guard.windows().token(app).is_some());
		}
	}
}
