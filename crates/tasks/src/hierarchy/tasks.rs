//! Task creation and record membership.

use foyer_primitives::{ComponentName, IntentFlags, LaunchMode, RecordId, Rect, StackId, TaskId, Uid, UserId, VoiceSessionId};

use super::Hierarchy;
use crate::error::{HierarchyError, Result};
use crate::events::HierarchyEvent;
use crate::record::RESULT_CANCELED;
use crate::task::{MAX_TASK_IDS_PER_USER, Task};

impl Hierarchy {
	/// Allocates the next free task id inside `user`'s range, wrapping within it.
	pub fn next_task_id_for_user(&mut self, user: UserId) -> Result<TaskId> {
		let base = user.0.checked_mul(MAX_TASK_IDS_PER_USER).ok_or(HierarchyError::UserOutOfRange(user))?;
		let end = base.checked_add(MAX_TASK_IDS_PER_USER).ok_or(HierarchyError::UserOutOfRange(user))?;
		let mut current = self.task_counters.get(&user).copied().unwrap_or(base);
		for _ in 0..MAX_TASK_IDS_PER_USER {
			current += 1;
			if current >= end {
				current = base + 1;
			}
			if !self.tasks.contains_key(&TaskId(current)) {
				break;
			}
		}
		self.task_counters.insert(user, current);
		Ok(TaskId(current))
	}

	/// Creates an empty task in `stack`.
	///
	/// When `id` is `None` the next id for `user` is allocated. The task is
	/// placed on top of the stack when `to_top`, at the bottom otherwise.
	pub fn create_task(&mut self, stack: StackId, id: Option<TaskId>, user: UserId, effective_uid: Uid, voice_session: Option<VoiceSessionId>, to_top: bool) -> Result<TaskId> {
		let s = self.try_stack(stack)?;
		if s.is_pinned() && !s.is_empty() {
			return Err(HierarchyError::PinnedStackOccupied(stack));
		}
		let id = match id {
			Some(id) if self.tasks.contains_key(&id) => return Err(HierarchyError::TaskIdInUse(id)),
			Some(id) => id,
			None => self.next_task_id_for_user(user)?,
		};
		let mut task = Task::new(id, user, effective_uid, voice_session);
		task.stack = Some(stack);
		self.tasks.insert(id, task);
		if let Some(s) = self.stacks.get_mut(&stack) {
			if to_top {
				s.tasks.push(id);
			} else {
				s.tasks.insert(0, id);
			}
		}
		tracing::debug!(task = %id, stack = %stack, to_top, "hierarchy.create_task");
		self.emit(HierarchyEvent::TaskCreated { task: id, stack });
		Ok(id)
	}

	/// Puts `record` on top of `task`, below any task-overlay records.
	///
	/// A record that already lives in another task is moved. The first record
	/// of a task becomes its root and supplies the base intent.
	pub fn add_record_to_task(&mut self, record: RecordId, task: TaskId) -> Result<()> {
		self.try_task(task)?;
		let (previous, overlay) = {
			let r = self.try_record(record)?;
			(r.task, r.task_overlay)
		};
		if previous == Some(task) {
			return Ok(());
		}
		if previous.is_some() {
			self.detach_record(record);
		}

		let mut index = self.tasks[&task].activities.len();
		if !overlay {
			while index > 0 && self.records.get(&self.tasks[&task].activities[index - 1]).is_some_and(|r| r.task_overlay) {
				index -= 1;
			}
		}
		let Some(t) = self.tasks.get_mut(&task) else {
			return Err(HierarchyError::UnknownTask(task));
		};
		t.activities.insert(index, record);
		let becomes_root = t.intent.is_none() || t.activities.len() == 1;
		if let Some(r) = self.records.get_mut(&record) {
			r.task = Some(task);
		}
		if becomes_root && let (Some(t), Some(r)) = (self.tasks.get_mut(&task), self.records.get(&record)) {
			t.set_intent(r);
		}
		self.set_front_of_task(task);
		self.emit(HierarchyEvent::RecordAttached { record, task });
		Ok(())
	}

	/// Removes `record` from its task. Empty tasks go away unless being reused.
	pub(crate) fn detach_record(&mut self, record: RecordId) -> Option<TaskId> {
		let task = self.records.get_mut(&record)?.task.take()?;
		let (now_empty, reuse) = {
			let t = self.tasks.get_mut(&task)?;
			t.activities.retain(|r| *r != record);
			(t.activities.is_empty(), t.reuse_task)
		};
		if let Some(r) = self.records.get_mut(&record) {
			r.front_of_task = false;
		}
		if now_empty && !reuse {
			self.remove_task(task);
		} else {
			self.set_front_of_task(task);
		}
		Some(task)
	}

	/// Flags the lowest non-finishing record as the task's front.
	pub fn set_front_of_task(&mut self, task: TaskId) {
		let Some(t) = self.tasks.get(&task) else {
			return;
		};
		let mut found = false;
		for id in &t.activities {
			if let Some(r) = self.records.get_mut(id) {
				if found || r.finishing {
					r.front_of_task = false;
				} else {
					r.front_of_task = true;
					found = true;
				}
			}
		}
		if !found && let Some(first) = t.activities.first() && let Some(r) = self.records.get_mut(first) {
			r.front_of_task = true;
		}
	}

	/// Moves `record` to the top of its own task.
	pub fn move_activity_to_front(&mut self, record: RecordId) -> Result<()> {
		let task = self.try_record(record)?.task.ok_or(HierarchyError::UnknownRecord(record))?;
		if let Some(t) = self.tasks.get_mut(&task) {
			t.activities.retain(|r| *r != record);
			t.activities.push(record);
		}
		self.set_front_of_task(task);
		Ok(())
	}

	/// Topmost non-finishing record of `task` for `component`.
	pub fn find_activity_in_history(&self, task: TaskId, component: &ComponentName) -> Option<RecordId> {
		let t = self.tasks.get(&task)?;
		t.activities.iter().rev().copied().find(|id| self.records.get(id).is_some_and(|r| !r.finishing && r.component() == component))
	}

	/// Lowest non-finishing record.
	pub fn root_activity(&self, task: TaskId) -> Option<RecordId> {
		let t = self.tasks.get(&task)?;
		t.activities.iter().copied().find(|id| self.records.get(id).is_some_and(|r| !r.finishing))
	}

	/// Topmost non-finishing record.
	pub fn top_activity(&self, task: TaskId) -> Option<RecordId> {
		self.top_running_activity(task, None)
	}

	/// Topmost non-finishing record other than `not_top`.
	pub fn top_running_activity(&self, task: TaskId, not_top: Option<RecordId>) -> Option<RecordId> {
		let t = self.tasks.get(&task)?;
		t.activities
			.iter()
			.rev()
			.copied()
			.find(|id| Some(*id) != not_top && self.records.get(id).is_some_and(|r| !r.finishing))
	}

	/// Topmost running record in the top-most task of `stack` that has one.
	pub fn top_running_of_stack(&self, stack: StackId, not_top: Option<RecordId>) -> Option<RecordId> {
		let s = self.stacks.get(&stack)?;
		s.tasks.iter().rev().find_map(|t| self.top_running_activity(*t, not_top))
	}

	/// Returns `true` if any record in `task` runs as `uid`.
	pub fn contains_app_uid(&self, task: TaskId, uid: Uid) -> bool {
		self.tasks
			.get(&task)
			.is_some_and(|t| t.activities.iter().any(|id| self.records.get(id).is_some_and(|r| r.uid() == uid)))
	}

	/// Finishes every record above the topmost instance of `component`.
	///
	/// Returns the surviving instance. A standard-mode instance started
	/// without SINGLE_TOP (and not as a document into an existing task) is
	/// finished as well so a fresh instance can replace it; `None` then.
	pub fn perform_clear_task_to(&mut self, task: TaskId, component: &ComponentName, launch_flags: IntentFlags) -> Option<RecordId> {
		let activities = self.tasks.get(&task)?.activities.clone();
		let index = activities
			.iter()
			.rposition(|id| self.records.get(id).is_some_and(|r| !r.finishing && r.component() == component))?;
		let target = activities[index];
		for above in activities[index + 1..].iter().rev() {
			if self.records.get(above).is_some_and(|r| !r.finishing) {
				self.finish_activity(*above, RESULT_CANCELED, None, "clear-task-stack");
			}
		}
		let multiple = self.records.get(&target).is_some_and(|r| r.launch_mode() == LaunchMode::Multiple);
		if multiple && !launch_flags.contains(IntentFlags::SINGLE_TOP) && !launch_flags.is_document_launch_into_existing() {
			self.finish_activity(target, RESULT_CANCELED, None, "clear-task-top");
			return None;
		}
		Some(target)
	}

	/// [`Self::perform_clear_task_to`] that keeps the task alive even if it empties.
	pub fn perform_clear_task_for_reuse(&mut self, task: TaskId, component: &ComponentName, launch_flags: IntentFlags) -> Option<RecordId> {
		self.tasks.get_mut(&task)?.reuse_task = true;
		let survivor = self.perform_clear_task_to(task, component, launch_flags);
		if let Some(t) = self.tasks.get_mut(&task) {
			t.reuse_task = false;
		}
		survivor
	}

	/// Finishes every record in `task`, keeping the empty task for reuse.
	pub fn perform_clear_task(&mut self, task: TaskId) {
		let Some(t) = self.tasks.get_mut(&task) else {
			return;
		};
		t.reuse_task = true;
		let activities = t.activities.clone();
		for id in activities.into_iter().rev() {
			if self.records.get(&id).is_some_and(|r| !r.finishing) {
				self.finish_activity(id, RESULT_CANCELED, None, "clear-task-all");
			}
		}
		if let Some(t) = self.tasks.get_mut(&task) {
			t.reuse_task = false;
		}
	}

	/// Replaces the base intent with `root`'s.
	pub fn set_task_intent(&mut self, task: TaskId, root: RecordId) -> Result<()> {
		let r = self.records.get(&root).ok_or(HierarchyError::UnknownRecord(root))?;
		let t = self.tasks.get_mut(&task).ok_or(HierarchyError::UnknownTask(task))?;
		t.set_intent(r);
		Ok(())
	}

	/// Affiliates `task` with `with`, as launch-task-behind does.
	pub fn set_task_affiliation(&mut self, task: TaskId, with: TaskId) -> Result<()> {
		self.try_task(with)?;
		let t = self.tasks.get_mut(&task).ok_or(HierarchyError::UnknownTask(task))?;
		t.affiliated_task = with;
		Ok(())
	}

	pub fn set_task_bounds(&mut self, task: TaskId, bounds: Option<Rect>) -> Result<()> {
		let t = self.tasks.get_mut(&task).ok_or(HierarchyError::UnknownTask(task))?;
		t.bounds = bounds;
		Ok(())
	}
}
