//! Folding a start into an instance that already exists.

use foyer_primitives::{ActivityType, DisplayId, IntentFlags, LaunchMode, RecordId, StackId, StartResult, TaskId, WindowingMode};
use foyer_tasks::{FindTaskQuery, StackPosition};

use super::Starter;
use crate::error::Result;
use crate::request::StartFlags;

impl Starter<'_, '_> {
	/// Record whose task should receive this start, if any.
	pub(super) fn reusable_intent_activity(&self) -> Option<RecordId> {
		let put_into_existing = ((self.launch_flags.contains(IntentFlags::NEW_TASK) && !self.launch_flags.contains(IntentFlags::MULTIPLE_TASK))
			|| self.is_launch_mode_one_of(LaunchMode::SingleInstance, LaunchMode::SingleTask))
			&& self.in_task.is_none()
			&& self.result_to().is_none();

		let found = if let Some(task) = self.options.as_ref().and_then(|o| o.launch_task_id) {
			self.h.top_activity(task)
		} else if put_into_existing {
			if self.launch_mode == LaunchMode::SingleInstance {
				self.h.find_activity(&self.info.component, self.user, &self.intent, self.info.activity_type == ActivityType::Home)
			} else if self.launch_flags.contains(IntentFlags::LAUNCH_ADJACENT) {
				self.h.find_activity(&self.info.component, self.user, &self.intent, self.launch_mode != LaunchMode::SingleTask)
			} else {
				let query = FindTaskQuery {
					component: &self.info.component,
					user: self.user,
					intent: &self.intent,
					affinity: self.info.task_affinity.as_deref(),
					activity_type: self.info.activity_type,
					preferred_display: self.preferred_display,
				};
				self.h.find_task(&query).map(|hit| hit.record)
			}
		} else {
			None
		};

		let found = found?;
		let r = self.h.record(found)?;
		if r.is_home() && self.h.display_of_record(found) != Some(self.preferred_display) {
			return None;
		}
		Some(found)
	}

	/// Brings the reused task forward and applies the clear/deliver rules.
	///
	/// `Some(result)` ends the start here; `None` means a new record still
	/// has to be placed, possibly into the reused task.
	pub(super) fn start_into_reused(&mut self, reused: RecordId) -> Result<Option<StartResult>> {
		let Some(task) = self.h.record(reused).and_then(|r| r.task) else {
			return Ok(None);
		};
		let clears_task = self.launch_flags.clears_task();
		if self.h.task(task).is_some_and(|t| self.env.lock_task.is_lock_task_mode_violation(t, clears_task)) {
			tracing::warn!(task = %task, "launch.start: lock task mode violation");
			return Ok(Some(StartResult::ReturnLockTaskModeViolation));
		}

		let clear_top_and_reset_standard = self.launch_flags.contains(IntentFlags::CLEAR_TOP | IntentFlags::RESET_TASK_IF_NEEDED)
			&& self.launch_mode == LaunchMode::Multiple;
		if !clear_top_and_reset_standard {
			self.start_task_hint = Some(task);
		}

		if self.h.task(task).is_some_and(|t| t.intent.is_none()) {
			self.h.set_task_intent(task, self.start)?;
		} else if let Some(t) = self.h.task_mut(task)
			&& let Some(base) = t.intent.as_mut()
		{
			if self.intent.flags.contains(IntentFlags::TASK_ON_HOME) {
				base.add_flags(IntentFlags::TASK_ON_HOME);
			} else {
				base.remove_flags(IntentFlags::TASK_ON_HOME);
			}
		}

		if self.launch_flags.contains(IntentFlags::CLEAR_TOP)
			|| self.launch_flags.is_document_launch_into_existing()
			|| self.is_launch_mode_one_of(LaunchMode::SingleInstance, LaunchMode::SingleTask)
		{
			let top = self.h.perform_clear_task_for_reuse(task, &self.info.component, self.launch_flags);
			if let Some(top) = top {
				if self.h.record(top).is_some_and(|r| r.front_of_task) {
					self.h.set_task_intent(task, self.start)?;
				}
				self.deliver_new_intent(top)?;
			}
		}

		let reused = self.set_target_stack_and_move_to_front_if_needed(reused, task)?;
		let reused = reused.filter(|r| self.h.record(*r).is_some()).or_else(|| self.h.top_activity(task));
		self.outcome_record = reused;

		if self.start_flags.contains(StartFlags::ONLY_IF_NEEDED) {
			self.resume_target_stack_if_needed();
			return Ok(Some(StartResult::ReturnIntentToCaller));
		}

		if let Some(reused) = reused {
			self.set_task_from_intent_activity(reused, task)?;
		}

		if !self.adding_to_task && self.reuse_task.is_none() {
			self.resume_target_stack_if_needed();
			let result = if self.moved_to_front { StartResult::TaskToFront } else { StartResult::DeliveredToTop };
			return Ok(Some(result));
		}
		Ok(None)
	}

	/// Moves the reused task (and its stack) to the front unless it is already
	/// the focused top. Returns the record that should be treated as reused.
	fn set_target_stack_and_move_to_front_if_needed(&mut self, reused: RecordId, task: TaskId) -> Result<Option<RecordId>> {
		self.target_stack = self.h.stack_of_task(task);
		let target_display = self.target_stack.and_then(|s| self.h.display_of_stack(s));

		let different_top_task = if target_display == Some(self.preferred_display) {
			let focused = self.h.focused_stack();
			let focused_top_task = focused.and_then(|f| self.h.top_running_of_stack(f, self.not_top)).and_then(|r| self.h.record(r)).and_then(|r| r.task);
			match focused_top_task {
				Some(t) => t != task,
				None => focused.and_then(|f| self.h.stack(f)).and_then(|s| s.top_task()) != Some(task),
			}
		} else {
			true
		};

		if different_top_task && !self.avoid_move_to_front {
			self.launch_flags |= IntentFlags::BROUGHT_TO_FRONT;
			self.sync_intent();
			let source_on_top = match self.source_stack {
				None => true,
				Some(stack) => {
					let top_task = self.h.top_running_of_stack(stack, None).and_then(|r| self.h.record(r)).and_then(|r| r.task);
					top_task.is_some() && top_task == self.source_task
				}
			};
			if self.source.is_none() || source_on_top {
				if self.launch_task_behind
					&& let Some(source_task) = self.source_task
				{
					self.h.set_task_affiliation(task, source_task)?;
				}
				if !self.launch_flags.clears_task() {
					self.bring_reused_task_to_front(task, target_display)?;
				}
				self.options = None;
			}
		}

		self.target_stack = self.h.stack_of_task(task);
		if !self.moved_to_front
			&& self.do_resume
			&& let Some(stack) = self.target_stack
		{
			tracing::debug!(stack = %stack, "launch.start: bring to front target stack");
			self.h.move_stack_to_front(stack, "intent-activity-existing")?;
		}

		if self.launch_flags.contains(IntentFlags::RESET_TASK_IF_NEEDED) {
			return Ok(self.h.top_running_activity(task, None));
		}
		Ok(Some(reused))
	}

	fn bring_reused_task_to_front(&mut self, task: TaskId, target_display: Option<DisplayId>) -> Result<()> {
		let target = self.target_stack;
		let Some(stack) = self.get_launch_stack_for(Some(task))?.filter(|s| Some(*s) != target) else {
			self.h.move_task_to_front(task, "bring-to-front-target")?;
			self.moved_to_front = true;
			return Ok(());
		};

		let mode = self.h.stack(stack).map(|s| s.windowing_mode).unwrap_or_default();
		let launch_display = self.h.display_of_stack(stack);
		if mode.is_split_screen() {
			if self.launch_flags.contains(IntentFlags::LAUNCH_ADJACENT) {
				self.h.reparent_task(task, stack, StackPosition::Top, "launch-to-side")?;
				self.h.move_stack_to_front(stack, "launch-to-side")?;
			} else {
				self.h.move_task_to_front(task, "bring-to-front-target")?;
			}
			let top_in_mode = launch_display.and_then(|d| self.top_stack_in_mode(d, mode));
			self.moved_to_front = top_in_mode != Some(stack);
		} else if launch_display != target_display {
			self.h.reparent_task(task, stack, StackPosition::Top, "reparent-to-display")?;
			self.h.move_stack_to_front(stack, "reparent-to-display")?;
			self.moved_to_front = true;
		} else if self.h.is_home_stack(stack) && target.is_some_and(|t| !self.h.is_home_stack(t)) {
			self.h.reparent_task(task, stack, StackPosition::Top, "reparent-to-home")?;
			self.moved_to_front = true;
		} else {
			self.h.move_task_to_front(task, "bring-to-front-target")?;
			self.moved_to_front = true;
		}
		self.drop_unused_stack(stack);
		self.target_stack = self.h.stack_of_task(task);
		Ok(())
	}

	/// Decides what happens inside the reused task.
	fn set_task_from_intent_activity(&mut self, reused: RecordId, task: TaskId) -> Result<()> {
		let single = self.is_launch_mode_one_of(LaunchMode::SingleInstance, LaunchMode::SingleTask);

		if self.launch_flags.contains(IntentFlags::NEW_AND_CLEAR_TASK) {
			self.h.perform_clear_task(task);
			self.reuse_task = Some(task);
			self.cleared_task = Some(task);
			self.h.set_task_intent(task, self.start)?;
			return Ok(());
		}

		if self.launch_flags.contains(IntentFlags::CLEAR_TOP) || single {
			let top = self.h.perform_clear_task_for_reuse(task, &self.info.component, self.launch_flags);
			if top.is_none() {
				self.adding_to_task = true;
				self.start_task_hint = None;
				self.source_task = Some(task);
				self.source = self.h.top_activity(task);
				self.cleared_task = Some(task);
			}
			return Ok(());
		}

		let Some(t) = self.h.task(task) else {
			return Ok(());
		};
		if t.real_activity.as_ref() == Some(&self.info.component) {
			let reused_component = self.h.record(reused).map(|r| r.component().clone());
			let single_top = self.launch_flags.contains(IntentFlags::SINGLE_TOP) || self.launch_mode == LaunchMode::SingleTop;
			if single_top && reused_component.as_ref() == Some(&self.info.component) {
				if self.h.record(reused).is_some_and(|r| r.front_of_task) {
					self.h.set_task_intent(task, self.start)?;
				}
				self.deliver_new_intent(reused)?;
			} else {
				let same_filter = self.h.record(self.start).is_some_and(|r| t.is_same_intent_filter(r));
				if !same_filter {
					self.adding_to_task = true;
					self.source = Some(reused);
					self.source_task = Some(task);
				}
			}
		} else if !self.launch_flags.contains(IntentFlags::RESET_TASK_IF_NEEDED) {
			self.adding_to_task = true;
			self.source = Some(reused);
			self.source_task = Some(task);
		} else if !t.root_was_reset {
			self.h.set_task_intent(task, self.start)?;
		}
		Ok(())
	}

	/// Delivers to the focused top instead of starting when it is the same
	/// single-top component.
	pub(super) fn deliver_to_top_if_needed(&mut self) -> Result<Option<StartResult>> {
		let Some(focused) = self.h.focused_stack() else {
			return Ok(None);
		};
		let Some(top) = self.h.top_running_of_stack(focused, self.not_top) else {
			return Ok(None);
		};
		let Some(r) = self.h.record(top) else {
			return Ok(None);
		};
		let single_top = self.launch_flags.contains(IntentFlags::SINGLE_TOP)
			|| self.is_launch_mode_one_of(LaunchMode::SingleTop, LaunchMode::SingleTask);
		let dont_start = self.result_to().is_none()
			&& r.component() == &self.info.component
			&& r.user == self.user
			&& single_top
			&& (!r.is_home() || self.h.display_of_record(top) == Some(self.preferred_display));
		if !dont_start {
			return Ok(None);
		}

		self.target_stack = Some(focused);
		if self.do_resume {
			self.h.resume_focused_stack_top();
		}
		if self.start_flags.contains(StartFlags::ONLY_IF_NEEDED) {
			return Ok(Some(StartResult::ReturnIntentToCaller));
		}
		self.deliver_new_intent(top)?;
		self.outcome_record = Some(top);
		Ok(Some(StartResult::DeliveredToTop))
	}

	/// Front-most stack on `display` in `mode`.
	pub(super) fn top_stack_in_mode(&self, display: DisplayId, mode: WindowingMode) -> Option<StackId> {
		let d = self.h.display(display)?;
		d.stacks().iter().rev().copied().find(|s| self.h.stack(*s).is_some_and(|s| s.windowing_mode == mode))
	}
}
