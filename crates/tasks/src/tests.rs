use foyer_primitives::{ActivityInfo, ActivityType, ApplicationInfo, ComponentName, DisplayId, Intent, IntentFlags, LaunchMode, RecordId, StackId, TaskId, Uid, UserId, WindowingMode};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::invariants::assert_consistent;
use crate::{FindTaskQuery, Hierarchy, HierarchyError, HierarchyEvent, LaunchStackQuery, MAX_TASK_IDS_PER_USER, RESULT_CANCELED, RESULT_OK, RecordSpec, StackPosition};

pub(crate) const APP_UID: Uid = Uid(10_050);

pub(crate) fn info(package: &str, class: &str, mode: LaunchMode) -> ActivityInfo {
	ActivityInfo::new(ComponentName::new(package, format!("{package}.{class}")), ApplicationInfo::new(package, APP_UID)).with_launch_mode(mode)
}

pub(crate) fn spawn(h: &mut Hierarchy, task: TaskId, info: ActivityInfo) -> RecordId {
	let intent = Intent::for_component(info.component.clone());
	let id = h.create_record(RecordSpec::new(info, intent, APP_UID));
	h.add_record_to_task(id, task).unwrap();
	id
}

pub(crate) fn fullscreen_task(h: &mut Hierarchy) -> (StackId, TaskId) {
	let stack = h
		.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Fullscreen, ActivityType::Standard, true)
		.unwrap();
	let task = h.create_task(stack, None, UserId::SYSTEM, APP_UID, None, true).unwrap();
	(stack, task)
}

#[test]
fn task_ids_stay_inside_user_range() {
	let mut h = Hierarchy::new();
	let user = UserId(10);
	assert_eq!(h.next_task_id_for_user(user), Ok(TaskId(1_000_001)));
	assert_eq!(h.next_task_id_for_user(user), Ok(TaskId(1_000_002)));
	assert_eq!(h.next_task_id_for_user(UserId::SYSTEM), Ok(TaskId(1)));
}

#[test]
fn user_without_a_task_id_range_is_rejected() {
	let mut h = Hierarchy::new();
	let (stack, _) = fullscreen_task(&mut h);
	let huge = UserId(u32::MAX / MAX_TASK_IDS_PER_USER + 1);
	assert_eq!(h.next_task_id_for_user(huge), Err(HierarchyError::UserOutOfRange(huge)));
	assert_eq!(h.create_task(stack, None, huge, APP_UID, None, true), Err(HierarchyError::UserOutOfRange(huge)));

	let last = UserId(u32::MAX / MAX_TASK_IDS_PER_USER - 1);
	assert_eq!(h.next_task_id_for_user(last), Ok(TaskId(last.0 * MAX_TASK_IDS_PER_USER + 1)));
}

#[test]
fn stack_moves_log_through_a_subscriber() {
	let subscriber = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().finish();
	tracing::subscriber::with_default(subscriber, || {
		let mut h = Hierarchy::new();
		let (stack, task) = fullscreen_task(&mut h);
		let (other, _) = fullscreen_task(&mut h);
		h.move_stack_to_front(other, "test").unwrap();
		h.move_stack_to_front(stack, "test").unwrap();
		assert_eq!(h.focused_stack(), Some(stack));
		assert!(h.remove_task_if_empty(task));
		assert!(h.stack(stack).is_none());
		assert_eq!(h.focused_stack(), Some(other));
		assert_consistent(&h);
	});
}

#[test]
fn explicit_task_id_collision_is_rejected() {
	let mut h = Hierarchy::new();
	let (stack, task) = fullscreen_task(&mut h);
	assert_eq!(h.create_task(stack, Some(task), UserId::SYSTEM, APP_UID, None, true), Err(HierarchyError::TaskIdInUse(task)));
}

#[test]
fn first_record_sets_base_intent() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	let root = spawn(&mut h, task, info("com.a", "Main", LaunchMode::Multiple));
	let second = spawn(&mut h, task, info("com.a", "Detail", LaunchMode::Multiple));

	let t = h.task(task).unwrap();
	assert_eq!(t.real_activity.as_ref().map(|c| c.class.as_str()), Some("com.a.Main"));
	assert_eq!(t.affinity.as_deref(), Some("com.a"));
	assert_eq!(h.root_activity(task), Some(root));
	assert_eq!(h.top_activity(task), Some(second));
	assert!(h.record(root).unwrap().front_of_task);
	assert!(!h.record(second).unwrap().front_of_task);
}

#[test]
fn new_records_stay_below_task_overlays() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	let root = spawn(&mut h, task, info("com.a", "Main", LaunchMode::Multiple));
	let overlay_info = info("com.a", "Overlay", LaunchMode::Multiple);
	let overlay = h.create_record(RecordSpec::new(overlay_info.clone(), Intent::for_component(overlay_info.component), APP_UID));
	h.record_mut(overlay).unwrap().task_overlay = true;
	h.add_record_to_task(overlay, task).unwrap();
	let next = spawn(&mut h, task, info("com.a", "Next", LaunchMode::Multiple));
	assert_eq!(h.task(task).unwrap().activities(), &[root, next, overlay]);
}

#[test]
fn clear_to_single_top_instance_keeps_it() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	let a = spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	spawn(&mut h, task, info("com.a", "B", LaunchMode::Multiple));
	spawn(&mut h, task, info("com.a", "C", LaunchMode::Multiple));
	let component = h.record(a).unwrap().component().clone();

	assert_eq!(h.perform_clear_task_to(task, &component, IntentFlags::CLEAR_TOP | IntentFlags::SINGLE_TOP), Some(a));
	assert_eq!(h.task(task).unwrap().activities(), &[a]);
	assert_consistent(&h);
}

#[test]
fn clear_to_standard_instance_finishes_it_too() {
	let mut h = Hierarchy::new();
	let (stack, task) = fullscreen_task(&mut h);
	let a = spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	spawn(&mut h, task, info("com.a", "B", LaunchMode::Multiple));
	let component = h.record(a).unwrap().component().clone();

	assert_eq!(h.perform_clear_task_to(task, &component, IntentFlags::CLEAR_TOP), None);
	assert!(h.task(task).is_none(), "emptied task is removed");
	assert!(h.stack(stack).is_none(), "emptied non-home stack is removed");
	assert_consistent(&h);
}

#[test]
fn clear_for_reuse_keeps_empty_task() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	let a = spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	let component = h.record(a).unwrap().component().clone();

	assert_eq!(h.perform_clear_task_for_reuse(task, &component, IntentFlags::CLEAR_TOP), None);
	assert!(h.task(task).is_some_and(|t| t.is_empty()));

	h.perform_clear_task(task);
	assert!(h.task(task).is_some());
}

#[test]
fn finish_delivers_result_to_requester() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	let caller = spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	let callee_info = info("com.a", "Pick", LaunchMode::Multiple);
	let mut spec = RecordSpec::new(callee_info.clone(), Intent::for_component(callee_info.component), APP_UID);
	spec.result_to = Some(caller);
	spec.request_code = 7;
	let callee = h.create_record(spec);
	h.add_record_to_task(callee, task).unwrap();

	assert!(h.finish_activity(callee, RESULT_OK, None, "test"));
	assert!(!h.finish_activity(callee, RESULT_CANCELED, None, "again"));
	let results = &h.record(caller).unwrap().results;
	assert_eq!(results.len(), 1);
	assert_eq!(results[0].request_code, 7);
	assert_eq!(results[0].result_code, RESULT_OK);
	assert!(h.take_events().contains(&HierarchyEvent::RecordRemoved { record: callee }));
}

#[test]
fn find_task_prefers_exact_component_over_affinity() {
	let mut h = Hierarchy::new();
	let (_, by_affinity) = fullscreen_task(&mut h);
	let other = spawn(&mut h, by_affinity, info("com.a", "Other", LaunchMode::Multiple));
	let (_, exact) = fullscreen_task(&mut h);
	let main = spawn(&mut h, exact, info("com.a", "Main", LaunchMode::Multiple));
	h.move_task_to_front(by_affinity, "test").unwrap();

	let target = info("com.a", "Main", LaunchMode::Multiple);
	let intent = Intent::for_component(target.component.clone());
	let query = FindTaskQuery {
		component: &target.component,
		user: UserId::SYSTEM,
		intent: &intent,
		affinity: Some("com.a"),
		activity_type: ActivityType::Standard,
		preferred_display: DisplayId::DEFAULT,
	};
	let hit = h.find_task(&query).unwrap();
	assert_eq!(hit.record, main);
	assert!(!hit.matched_by_root_affinity);

	h.finish_activity(main, RESULT_CANCELED, None, "test");
	let hit = h.find_task(&query).unwrap();
	assert_eq!(hit.record, other);
	assert!(hit.matched_by_root_affinity);
}

#[test]
fn find_task_skips_single_instance_tops_and_other_users() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	spawn(&mut h, task, info("com.a", "Solo", LaunchMode::SingleInstance));
	let target = info("com.a", "Solo", LaunchMode::SingleInstance);
	let intent = Intent::for_component(target.component.clone());
	let mut query = FindTaskQuery {
		component: &target.component,
		user: UserId::SYSTEM,
		intent: &intent,
		affinity: Some("com.a"),
		activity_type: ActivityType::Standard,
		preferred_display: DisplayId::DEFAULT,
	};
	assert_eq!(h.find_task(&query), None);
	assert!(h.find_activity(&target.component, UserId::SYSTEM, &intent, false).is_some());
	query.user = UserId(10);
	assert_eq!(h.find_task(&query), None);
	assert_eq!(h.find_activity(&target.component, UserId(10), &intent, false), None);
}

#[test]
fn standard_fullscreen_always_gets_fresh_stack_but_home_is_shared() {
	let mut h = Hierarchy::new();
	let a = h.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Fullscreen, ActivityType::Standard, true).unwrap();
	let b = h.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Fullscreen, ActivityType::Standard, true).unwrap();
	assert_ne!(a, b);
	let home = h.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Fullscreen, ActivityType::Home, false).unwrap();
	assert_eq!(h.get_or_create_stack(DisplayId::DEFAULT, WindowingMode::Undefined, ActivityType::Home, true).unwrap(), home);
	assert_eq!(h.home_stack(DisplayId::DEFAULT), Some(home));
	assert_eq!(h.display(DisplayId::DEFAULT).unwrap().stacks()[0], home);
}

#[test]
fn launch_stack_honours_explicit_task_and_home() {
	let mut h = Hierarchy::new();
	let (stack, task) = fullscreen_task(&mut h);
	let mut query = LaunchStackQuery {
		activity_type: ActivityType::Standard,
		supports_picture_in_picture: false,
		candidate_task: None,
		launch_task: Some(task),
		display: None,
		windowing_mode: WindowingMode::Undefined,
		on_top: true,
	};
	assert_eq!(h.launch_stack(&query).unwrap(), stack);

	query.launch_task = None;
	query.candidate_task = Some(task);
	assert_eq!(h.launch_stack(&query).unwrap(), stack);

	query.candidate_task = None;
	query.activity_type = ActivityType::Home;
	let home = h.launch_stack(&query).unwrap();
	assert!(h.is_home_stack(home));
	assert_eq!(h.launch_stack(&query).unwrap(), home);

	query.activity_type = ActivityType::Standard;
	query.windowing_mode = WindowingMode::Pinned;
	let s = h.launch_stack(&query).unwrap();
	assert_eq!(h.stack(s).unwrap().windowing_mode, WindowingMode::Fullscreen, "no PiP support falls back to fullscreen");
}

#[test]
fn resume_pauses_previous_and_hides_occluded() {
	let mut h = Hierarchy::new();
	let (bottom_stack, bottom) = fullscreen_task(&mut h);
	let under = spawn(&mut h, bottom, info("com.a", "A", LaunchMode::Multiple));
	h.move_stack_to_front(bottom_stack, "test").unwrap();
	assert_eq!(h.resume_focused_stack_top(), Some(under));
	assert!(h.record(under).unwrap().visible);

	let (top_stack, top) = fullscreen_task(&mut h);
	let over = spawn(&mut h, top, info("com.b", "B", LaunchMode::Multiple));
	h.move_stack_to_front(top_stack, "test").unwrap();
	assert_eq!(h.resume_focused_stack_top(), Some(over));

	assert_eq!(h.resumed_activity(), Some(over));
	assert!(h.record(over).unwrap().visible);
	assert!(!h.record(under).unwrap().visible);
	assert!(!h.is_stack_visible(bottom_stack));
}

#[test]
fn removing_focused_stack_moves_focus() {
	let mut h = Hierarchy::new();
	let (a_stack, a) = fullscreen_task(&mut h);
	spawn(&mut h, a, info("com.a", "A", LaunchMode::Multiple));
	let (b_stack, b) = fullscreen_task(&mut h);
	let rb = spawn(&mut h, b, info("com.b", "B", LaunchMode::Multiple));
	h.move_stack_to_front(b_stack, "test").unwrap();
	assert_eq!(h.focused_stack(), Some(b_stack));

	h.finish_activity(rb, RESULT_CANCELED, None, "test");
	assert_eq!(h.focused_stack(), Some(a_stack));
}

#[test]
fn dump_lists_every_level() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	spawn(&mut h, task, info("com.a", "Main", LaunchMode::Multiple));
	let mut out = String::new();
	h.dump(&mut out);
	assert!(out.contains("Display display#0"));
	assert!(out.contains("mode=fullscreen"));
	assert!(out.contains(&format!("Task {task}")));
	assert!(out.contains("com.a/.Main"));
}

#[derive(Debug, Clone)]
enum Op {
	NewTask,
	Spawn { task: usize, class: u8 },
	Finish { record: usize },
	Reparent { task: usize, stack: usize },
	Front { task: usize },
	ClearTo { task: usize, class: u8 },
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		Just(Op::NewTask),
		(any::<usize>(), 0u8..4).prop_map(|(task, class)| Op::Spawn { task, class }),
		any::<usize>().prop_map(|record| Op::Finish { record }),
		(any::<usize>(), any::<usize>()).prop_map(|(task, stack)| Op::Reparent { task, stack }),
		any::<usize>().prop_map(|task| Op::Front { task }),
		(any::<usize>(), 0u8..4).prop_map(|(task, class)| Op::ClearTo { task, class }),
	]
}

fn pick<T: Copy>(items: &[T], index: usize) -> Option<T> {
	(!items.is_empty()).then(|| items[index % items.len()])
}

proptest! {
	/// Arbitrary mutation sequences never break back-references or front-of-task.
	#[test]
	fn prop_mutations_keep_hierarchy_consistent(ops in proptest::collection::vec(op(), 1..40)) {
		let mut h = Hierarchy::new();
		for op in ops {
			let mut tasks: Vec<TaskId> = h.task_ids().collect();
			tasks.sort();
			let mut records: Vec<RecordId> = h.records().map(|r| r.id).collect();
			records.sort();
			let mut stacks: Vec<StackId> = h.display(DisplayId::DEFAULT).map(|d| d.stacks().to_vec()).unwrap_or_default();
			stacks.sort();
			match op {
				Op::NewTask => {
					fullscreen_task(&mut h);
				}
				Op::Spawn { task, class } => {
					if let Some(task) = pick(&tasks, task) {
						spawn(&mut h, task, info("com.p", &format!("C{class}"), LaunchMode::Multiple));
					}
				}
				Op::Finish { record } => {
					if let Some(record) = pick(&records, record) {
						h.finish_activity(record, RESULT_CANCELED, None, "prop");
					}
				}
				Op::Reparent { task, stack } => {
					if let (Some(task), Some(stack)) = (pick(&tasks, task), pick(&stacks, stack)) {
						h.reparent_task(task, stack, StackPosition::Top, "prop").unwrap();
					}
				}
				Op::Front { task } => {
					if let Some(task) = pick(&tasks, task) {
						h.move_task_to_front(task, "prop").unwrap();
					}
				}
				Op::ClearTo { task, class } => {
					if let Some(task) = pick(&tasks, task) {
						let component = ComponentName::new("com.p", format!("com.p.C{class}"));
						h.perform_clear_task_to(task, &component, IntentFlags::CLEAR_TOP);
					}
				}
			}
			assert_consistent(&h);
		}
	}
}
