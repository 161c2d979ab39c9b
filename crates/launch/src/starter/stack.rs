//! Stack selection.

use foyer_primitives::{ActivityType, DisplayId, IntentFlags, StackId, TaskId, WindowingMode};
use foyer_tasks::LaunchStackQuery;

use super::Starter;
use crate::error::Result;

impl Starter<'_, '_> {
	/// Stack the new record should go into.
	pub(super) fn compute_stack_focus(&mut self, new_task: bool) -> Result<StackId> {
		let hint = self.start_task_hint;
		if let Some(stack) = self.get_launch_stack_for(hint)? {
			return Ok(stack);
		}
		if let Some(current) = hint.and_then(|t| self.h.stack_of_task(t)) {
			if self.h.focused_stack() != Some(current) {
				self.h.move_stack_to_front(current, "compute-stack-focus")?;
			}
			return Ok(current);
		}
		if let Some(focused) = self.h.focused_stack()
			&& self.can_launch_into_focused_stack(focused, new_task)
		{
			return Ok(focused);
		}
		let query = self.launch_stack_query(hint, true);
		Ok(self.h.launch_stack(&query)?)
	}

	/// Launch stack for a record expected to join `candidate`.
	///
	/// Only adjacent launches on the default display can come back empty:
	/// they want the docked stack and there may be none.
	pub(super) fn get_launch_stack_for(&mut self, candidate: Option<TaskId>) -> Result<Option<StackId>> {
		if let Some(stack) = self.reuse_task.and_then(|t| self.h.stack_of_task(t)) {
			return Ok(Some(stack));
		}

		if !self.launch_flags.contains(IntentFlags::LAUNCH_ADJACENT) || self.preferred_display != DisplayId::DEFAULT {
			let query = self.launch_stack_query(candidate, true);
			return Ok(Some(self.h.launch_stack(&query)?));
		}

		let focused = self.h.focused_stack();
		let parent = candidate.and_then(|t| self.h.stack_of_task(t)).or(focused);
		if parent != focused {
			return Ok(parent);
		}
		if let Some(f) = focused
			&& candidate.is_some()
			&& self.h.stack(f).and_then(|s| s.top_task()) == candidate
		{
			return Ok(focused);
		}

		if let Some(parent) = parent
			&& let Some(s) = self.h.stack(parent)
			&& s.is_split_screen_primary()
		{
			let display = s.display.unwrap_or(DisplayId::DEFAULT);
			let activity_type = self.resolved_activity_type();
			return Ok(Some(self.h.get_or_create_stack(display, WindowingMode::SplitScreenSecondary, activity_type, true)?));
		}

		let docked = self.h.split_screen_primary(DisplayId::DEFAULT);
		match docked {
			Some(docked) if !self.h.is_stack_visible(docked) => {
				let query = self.launch_stack_query(candidate, true);
				Ok(Some(self.h.launch_stack(&query)?))
			}
			docked => Ok(docked),
		}
	}

	fn resolved_activity_type(&self) -> ActivityType {
		self.options
			.as_ref()
			.map(|o| o.launch_activity_type)
			.filter(|t| *t != ActivityType::Undefined)
			.unwrap_or(self.info.activity_type)
	}

	fn launch_stack_query(&self, candidate: Option<TaskId>, on_top: bool) -> LaunchStackQuery {
		LaunchStackQuery {
			activity_type: self.resolved_activity_type(),
			supports_picture_in_picture: self.info.supports_picture_in_picture,
			candidate_task: candidate,
			launch_task: self.options.as_ref().and_then(|o| o.launch_task_id),
			display: Some(self.preferred_display),
			windowing_mode: self.preferred_windowing_mode,
			on_top,
		}
	}

	fn can_launch_into_focused_stack(&self, focused: StackId, new_task: bool) -> bool {
		let Some(stack) = self.h.stack(focused) else {
			return false;
		};
		let can_use = if stack.activity_type == ActivityType::Assistant {
			self.info.activity_type == ActivityType::Assistant
		} else {
			match stack.windowing_mode {
				WindowingMode::Fullscreen => true,
				WindowingMode::SplitScreenPrimary | WindowingMode::SplitScreenSecondary | WindowingMode::Freeform => self.info.resizeable,
				WindowingMode::Undefined | WindowingMode::Pinned => false,
			}
		};
		can_use && !new_task && stack.display == Some(self.preferred_display)
	}

	pub(super) fn can_start_home_on_display(&self, display: DisplayId) -> bool {
		self.h.display(display).is_some_and(|d| d.supports_home)
	}

	/// Removes a stack picked for the launch that ended up holding nothing.
	pub(super) fn drop_unused_stack(&mut self, stack: StackId) {
		if self.h.stack(stack).is_some_and(|s| s.is_empty() && !s.is_home()) {
			self.h.remove_stack(stack);
		}
	}
}
