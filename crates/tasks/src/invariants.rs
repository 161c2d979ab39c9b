//! Invariant catalog for [`crate::Hierarchy`].

use foyer_primitives::{ActivityType, DisplayId, IntentFlags, LaunchMode, UserId, WindowingMode};

use crate::tests::{APP_UID, fullscreen_task, info, spawn};
use crate::{Hierarchy, HierarchyError, RESULT_CANCELED, StackPosition};

/// Walks the hierarchy and panics on any broken back-reference.
pub(crate) fn assert_consistent(h: &Hierarchy) {
	assert!(h.display(DisplayId::DEFAULT).is_some(), "default display missing");
	let mut seen_tasks = 0;
	for display in h.display_ids() {
		let d = h.display(*display).expect("listed display exists");
		for stack in d.stacks() {
			let s = h.stack(*stack).expect("listed stack exists");
			assert_eq!(s.display, Some(*display), "stack {stack} back-reference");
			if s.is_pinned() {
				assert!(s.tasks().len() <= 1, "pinned {stack} holds {} tasks", s.tasks().len());
			}
			for task in s.tasks() {
				seen_tasks += 1;
				let t = h.task(*task).expect("listed task exists");
				assert_eq!(t.stack, Some(*stack), "task {task} back-reference");
				let fronts = t.activities().iter().filter(|r| h.record(**r).is_some_and(|r| r.front_of_task)).count();
				if !t.is_empty() {
					assert_eq!(fronts, 1, "task {task} front-of-task count");
				}
				for record in t.activities() {
					let r = h.record(*record).expect("listed record exists");
					assert_eq!(r.task, Some(*task), "record {record} back-reference");
				}
			}
		}
	}
	assert_eq!(seen_tasks, h.task_ids().count(), "every task hangs off a stack");
	for r in h.records() {
		if let Some(task) = r.task {
			assert!(h.task(task).is_some_and(|t| t.contains(r.id)), "record {} outlives task {task}", r.id);
		}
	}
}

/// Must keep exactly one front-of-task record in every non-empty task.
///
/// * Enforced in: `Hierarchy::set_front_of_task`, `Hierarchy::add_record_to_task`, `Hierarchy::detach_record`
/// * Failure symptom: Back navigation and task root queries disagree about the root.
#[cfg_attr(test, test)]
pub(crate) fn test_task_has_single_front_record() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	let root = spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	let next = spawn(&mut h, task, info("com.a", "B", LaunchMode::Multiple));
	h.finish_activity(root, RESULT_CANCELED, None, "test");
	assert!(h.record(next).unwrap().front_of_task);
	assert_consistent(&h);
}

/// Must refuse a second task in a pinned stack.
///
/// * Enforced in: `Hierarchy::create_task`, `Hierarchy::reparent_task`, `Hierarchy::launch_stack`
/// * Failure symptom: Two tasks share one picture-in-picture window.
#[cfg_attr(test, test)]
pub(crate) fn test_pinned_stack_holds_one_task() {
	let mut h = Hierarchy::new();
	let pinned = h.create_stack(DisplayId::DEFAULT, WindowingMode::Pinned, ActivityType::Standard, true).unwrap();
	h.create_task(pinned, None, UserId::SYSTEM, APP_UID, None, true).unwrap();
	assert_eq!(
		h.create_task(pinned, None, UserId::SYSTEM, APP_UID, None, true),
		Err(HierarchyError::PinnedStackOccupied(pinned))
	);
	let (_, other) = fullscreen_task(&mut h);
	assert_eq!(
		h.reparent_task(other, pinned, StackPosition::Top, "test"),
		Err(HierarchyError::PinnedStackOccupied(pinned))
	);
	assert_consistent(&h);
}

/// Must keep the default display alive.
///
/// * Enforced in: `Hierarchy::new`, `Hierarchy::remove_display`
/// * Failure symptom: Launches with no display hint have nowhere to go.
#[cfg_attr(test, test)]
pub(crate) fn test_default_display_always_exists() {
	let mut h = Hierarchy::new();
	h.add_display(DisplayId(2), false, None);
	h.remove_display(DisplayId::DEFAULT).unwrap();
	h.remove_display(DisplayId(2)).unwrap();
	assert_eq!(h.display_ids(), &[DisplayId::DEFAULT]);
}

/// Must move a task's stack membership and back-reference in one step.
///
/// * Enforced in: `Hierarchy::reparent_task`
/// * Failure symptom: A task's windows are visible under two stacks at once.
#[cfg_attr(test, test)]
pub(crate) fn test_reparent_updates_back_reference() {
	let mut h = Hierarchy::new();
	let (from, task) = fullscreen_task(&mut h);
	spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	let to = h.create_stack(DisplayId::DEFAULT, WindowingMode::Freeform, ActivityType::Standard, true).unwrap();
	h.reparent_task(task, to, StackPosition::Bottom, "test").unwrap();
	assert_eq!(h.stack_of_task(task), Some(to));
	assert!(h.stack(from).is_none(), "emptied source stack is removed");
	assert_consistent(&h);
}

/// Must replace, not reuse, a standard-mode instance cleared to without SINGLE_TOP.
///
/// * Enforced in: `Hierarchy::perform_clear_task_to`
/// * Failure symptom: CLEAR_TOP re-delivers to an instance that expects a fresh start.
#[cfg_attr(test, test)]
pub(crate) fn test_clear_top_replaces_standard_instance() {
	let mut h = Hierarchy::new();
	let (_, task) = fullscreen_task(&mut h);
	spawn(&mut h, task, info("com.a", "Root", LaunchMode::Multiple));
	let a = spawn(&mut h, task, info("com.a", "A", LaunchMode::Multiple));
	let component = h.record(a).unwrap().component().clone();
	assert_eq!(h.perform_clear_task_to(task, &component, IntentFlags::CLEAR_TOP), None);
	assert!(h.record(a).is_none());

	let b = spawn(&mut h, task, info("com.a", "B", LaunchMode::SingleTask));
	let component = h.record(b).unwrap().component().clone();
	assert_eq!(h.perform_clear_task_to(task, &component, IntentFlags::CLEAR_TOP), Some(b));
	assert_consistent(&h);
}
