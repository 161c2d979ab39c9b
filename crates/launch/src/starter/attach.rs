//! Attaching a record that really starts.

use foyer_primitives::{IntentFlags, LaunchMode, StartResult, TaskId, Transit};
use foyer_tasks::StackPosition;

use super::Starter;
use crate::background::handle_background_abort;
use crate::error::Result;
use crate::request::StartFlags;

impl Starter<'_, '_> {
	/// Picks the task for the start record, attaches it and resumes.
	pub(super) fn place_new_record(&mut self) -> Result<StartResult> {
		let task_to_affiliate = if self.launch_task_behind && self.source.is_some() { self.source_task } else { None };

		let mut new_task = false;
		let result = if self.result_to().is_none() && self.in_task.is_none() && !self.adding_to_task && self.launch_flags.contains(IntentFlags::NEW_TASK) {
			new_task = true;
			self.set_task_from_reuse_or_create_new_task(task_to_affiliate)?
		} else if let Some(source_task) = self.source_task {
			self.set_task_from_source_record(source_task)?
		} else if let Some(in_task) = self.in_task {
			self.set_task_from_in_task(in_task)?
		} else {
			self.set_task_to_current_top_or_create_new_task()?
		};
		if result != StartResult::Success {
			return Ok(result);
		}

		let Some(task) = self.h.record(self.start).and_then(|r| r.task) else {
			return Ok(StartResult::Canceled);
		};
		if new_task {
			self.log_start_event("am_create_task", self.start, Some(task));
		}
		self.log_start_event("am_create_activity", self.start, Some(task));
		self.target_stack = self.h.stack_of_task(task);

		let transit = if self.no_animation {
			Transit::None
		} else if new_task {
			if self.launch_task_behind { Transit::TaskOpenBehind } else { Transit::TaskOpen }
		} else {
			Transit::ActivityOpen
		};
		self.env.surface.prepare_app_transition(transit, self.keep_cur_transition);

		if self.do_resume {
			let focusable = self.target_stack.and_then(|s| self.h.stack(s)).is_some_and(|s| s.is_focusable());
			let overlay_on_top = self
				.h
				.top_running_activity(task, None)
				.filter(|top| *top != self.start)
				.and_then(|top| self.h.record(top))
				.is_some_and(|top| top.task_overlay);
			if !focusable || overlay_on_top {
				self.h.ensure_activities_visible();
				self.env.surface.execute_app_transition();
			} else {
				if let Some(stack) = self.target_stack
					&& self.h.focused_stack() != Some(stack)
				{
					self.h.move_stack_to_front(stack, "start-activity-unchecked")?;
				}
				self.h.resume_focused_stack_top();
			}
		} else {
			self.h.ensure_activities_visible();
		}

		if let Some(t) = self.h.task_mut(task) {
			t.in_recents = true;
		}
		if let Some(t) = self.h.task(task) {
			self.env.recents.add(t);
		}
		self.outcome_record = Some(self.start);
		Ok(StartResult::Success)
	}

	fn is_lock_task_violation(&self, task: TaskId) -> bool {
		let violation = self.h.task(task).is_some_and(|t| self.env.lock_task.is_lock_task_mode_violation(t, false));
		if violation {
			tracing::warn!(task = %task, "launch.start: lock task mode violation");
		}
		violation
	}

	fn set_task_from_reuse_or_create_new_task(&mut self, task_to_affiliate: Option<TaskId>) -> Result<StartResult> {
		if self.restricted_bg
			&& self.reuse_task.is_none_or(|t| !self.h.contains_app_uid(t, self.calling_uid))
			&& handle_background_abort(self.h, self.config, self.start)
		{
			return Ok(StartResult::Aborted);
		}

		let stack = self.compute_stack_focus(true)?;
		self.target_stack = Some(stack);
		let task = match self.reuse_task {
			Some(task) => {
				self.h.add_record_to_task(self.start, task)?;
				task
			}
			None => {
				let owner = self.new_task_info.as_ref().unwrap_or(&self.info).uid();
				let to_top = !self.launch_task_behind && !self.avoid_move_to_front;
				let task = self.h.create_task(stack, None, self.user, owner, self.voice_session, to_top)?;
				self.h.add_record_to_task(self.start, task)?;
				self.apply_new_task_overrides(task);
				let bounds = self.options.as_ref().and_then(|o| o.launch_bounds).filter(|b| !b.is_empty());
				if bounds.is_some() {
					self.h.set_task_bounds(task, bounds)?;
				}
				task
			}
		};

		if let Some(with) = task_to_affiliate {
			self.h.set_task_affiliation(task, with)?;
		}
		if self.is_lock_task_violation(task) {
			return Ok(StartResult::ReturnLockTaskModeViolation);
		}
		if self.do_resume {
			self.h.move_stack_to_front(stack, "reuse-or-new-task")?;
		}
		Ok(StartResult::Success)
	}

	/// A task created on behalf of a finishing source takes that source's identity.
	fn apply_new_task_overrides(&mut self, task: TaskId) {
		let intent = self.new_task_intent.clone();
		let affinity = self.new_task_info.as_ref().map(|i| i.task_affinity.clone());
		let Some(t) = self.h.task_mut(task) else {
			return;
		};
		if let Some(intent) = intent {
			t.real_activity = intent.component.clone();
			t.intent = Some(intent);
		}
		if let Some(affinity) = affinity {
			t.root_affinity = affinity.clone();
			t.affinity = affinity;
		}
	}

	fn set_task_from_source_record(&mut self, source_task: TaskId) -> Result<StartResult> {
		if self.is_lock_task_violation(source_task) {
			return Ok(StartResult::ReturnLockTaskModeViolation);
		}
		if self.restricted_bg && !self.h.contains_app_uid(source_task, self.calling_uid) && handle_background_abort(self.h, self.config, self.start) {
			return Ok(StartResult::Aborted);
		}

		let Some(source_stack) = self.h.stack_of_task(source_task) else {
			return Ok(StartResult::Canceled);
		};
		let move_allowed = self.h.stack(source_stack).and_then(|s| s.top_task()) != Some(source_task);
		let mut target = source_stack;
		if move_allowed && let Some(launch) = self.get_launch_stack_for(Some(source_task))? {
			if launch != source_stack {
				self.h.reparent_task(source_task, launch, StackPosition::Top, "launch-from-source")?;
				self.h.move_stack_to_front(launch, "launch-from-source")?;
			}
			target = launch;
		}
		self.target_stack = Some(target);

		let top_task = self.h.stack(target).and_then(|s| s.top_task());
		if top_task != Some(source_task) && !self.avoid_move_to_front {
			self.h.move_task_to_front(source_task, "source-task-to-front")?;
		} else if self.do_resume {
			self.h.move_stack_to_front(target, "source-stack-to-front")?;
		}

		if !self.adding_to_task && self.launch_flags.contains(IntentFlags::CLEAR_TOP) {
			let top = self.h.perform_clear_task_for_reuse(source_task, &self.info.component, self.launch_flags);
			self.keep_cur_transition = true;
			self.cleared_task = Some(source_task);
			if let Some(top) = top {
				self.deliver_new_intent(top)?;
				self.outcome_record = Some(top);
				self.resume_target_stack_if_needed();
				return Ok(StartResult::DeliveredToTop);
			}
		} else if !self.adding_to_task
			&& self.launch_flags.contains(IntentFlags::REORDER_TO_FRONT)
			&& let Some(top) = self.h.find_activity_in_history(source_task, &self.info.component)
		{
			self.h.move_activity_to_front(top)?;
			self.deliver_new_intent(top)?;
			self.outcome_record = Some(top);
			self.resume_target_stack_if_needed();
			return Ok(StartResult::DeliveredToTop);
		}

		if self.h.task(source_task).is_none() {
			return Ok(StartResult::Canceled);
		}
		self.h.add_record_to_task(self.start, source_task)?;
		Ok(StartResult::Success)
	}

	fn set_task_from_in_task(&mut self, in_task: TaskId) -> Result<StartResult> {
		if self.is_lock_task_violation(in_task) {
			return Ok(StartResult::ReturnLockTaskModeViolation);
		}
		self.target_stack = self.h.stack_of_task(in_task);

		if let Some(top) = self.h.top_activity(in_task)
			&& let Some(r) = self.h.record(top)
			&& r.component() == &self.info.component
			&& r.user == self.user
			&& (self.launch_flags.contains(IntentFlags::SINGLE_TOP) || self.is_launch_mode_one_of(LaunchMode::SingleTop, LaunchMode::SingleTask))
		{
			self.h.move_task_to_front(in_task, "in-task-to-front")?;
			if self.start_flags.contains(StartFlags::ONLY_IF_NEEDED) {
				return Ok(StartResult::ReturnIntentToCaller);
			}
			self.deliver_new_intent(top)?;
			self.outcome_record = Some(top);
			return Ok(StartResult::DeliveredToTop);
		}

		if !self.adding_to_task {
			self.h.move_task_to_front(in_task, "in-task-to-front")?;
			self.outcome_record = self.h.top_activity(in_task);
			return Ok(StartResult::TaskToFront);
		}

		if let Some(bounds) = self.options.as_ref().and_then(|o| o.launch_bounds).filter(|b| !b.is_empty()) {
			if let Some(stack) = self.get_launch_stack_for(Some(in_task))?
				&& Some(stack) != self.h.stack_of_task(in_task)
			{
				self.h.reparent_task(in_task, stack, StackPosition::Top, "in-task-bounds")?;
				self.target_stack = Some(stack);
			}
			self.h.set_task_bounds(in_task, Some(bounds))?;
		}

		self.h.move_task_to_front(in_task, "in-task-to-front")?;
		self.h.add_record_to_task(self.start, in_task)?;
		Ok(StartResult::Success)
	}

	fn set_task_to_current_top_or_create_new_task(&mut self) -> Result<StartResult> {
		let stack = self.compute_stack_focus(false)?;
		self.target_stack = Some(stack);
		if self.do_resume {
			self.h.move_stack_to_front(stack, "adding-to-top-task")?;
		}

		let prev_task = self.h.top_running_of_stack(stack, None).and_then(|r| self.h.record(r)).and_then(|r| r.task);
		let abort = match prev_task {
			None => self.restricted_bg,
			Some(task) => self.restricted_bg && !self.h.contains_app_uid(task, self.calling_uid),
		};
		if abort && handle_background_abort(self.h, self.config, self.start) {
			return Ok(StartResult::Aborted);
		}

		let task = match prev_task {
			Some(task) => task,
			None => self.h.create_task(stack, None, self.user, self.info.uid(), self.voice_session, true)?,
		};
		self.h.add_record_to_task(self.start, task)?;
		Ok(StartResult::Success)
	}
}
