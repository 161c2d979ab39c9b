use foyer_primitives::{ActivityType, DisplayId, StackId, TaskId, WindowingMode};

use super::Hierarchy;
use crate::error::Result;

/// Inputs to [`Hierarchy::launch_stack`].
#[derive(Debug, Clone, Copy)]
pub struct LaunchStackQuery {
	pub activity_type: ActivityType,
	pub supports_picture_in_picture: bool,
	/// Task the record is expected to join, if already known.
	pub candidate_task: Option<TaskId>,
	/// Task named explicitly by the launch options.
	pub launch_task: Option<TaskId>,
	/// Display requested by options or inherited from the source.
	pub display: Option<DisplayId>,
	/// Requested windowing mode; `Undefined` when none was asked for.
	pub windowing_mode: WindowingMode,
	pub on_top: bool,
}

impl Hierarchy {
	/// Picks (or creates) the stack a record should launch into.
	///
	/// Precedence: the stack of an explicitly requested task, then the
	/// home stack for home records, then the candidate task's stack when it is
	/// on the requested display and in the requested mode, then a stack of the
	/// requested mode on the requested display (default display otherwise).
	pub fn launch_stack(&mut self, query: &LaunchStackQuery) -> Result<StackId> {
		if let Some(stack) = query.launch_task.and_then(|t| self.stack_of_task(t)) {
			return Ok(stack);
		}

		let display = query.display.filter(|d| self.displays.contains_key(d)).unwrap_or(DisplayId::DEFAULT);
		if query.activity_type == ActivityType::Home {
			let display = if self.displays.get(&display).is_some_and(|d| d.supports_home) { display } else { DisplayId::DEFAULT };
			return self.get_or_create_stack(display, WindowingMode::Fullscreen, ActivityType::Home, query.on_top);
		}

		let mut mode = query.windowing_mode;
		if mode == WindowingMode::Pinned && (!query.supports_picture_in_picture || self.pinned_stack(display).is_some_and(|s| self.stacks.get(&s).is_some_and(|s| !s.is_empty()))) {
			mode = WindowingMode::Fullscreen;
		}

		if let Some(candidate) = query.candidate_task.and_then(|t| self.stack_of_task(t))
			&& let Some(s) = self.stacks.get(&candidate)
			&& s.display == Some(display)
			&& (mode == WindowingMode::Undefined || s.windowing_mode == mode)
		{
			return Ok(candidate);
		}

		self.get_or_create_stack(display, mode, query.activity_type, query.on_top)
	}
}
