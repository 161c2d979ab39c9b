//! Z-order, focus and reparenting.

use foyer_primitives::{DisplayId, StackId, TaskId};

use super::Hierarchy;
use crate::error::{HierarchyError, Result};
use crate::events::HierarchyEvent;

/// Where a task lands inside its stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPosition {
	Top,
	Bottom,
	/// Index counted from the bottom, clamped to the stack size.
	Index(usize),
}

impl Hierarchy {
	/// Moves `task` into `to` at `position`.
	///
	/// The stack membership and the task's back-reference change together, so
	/// no observer ever sees the task under two stacks. The old stack is
	/// removed when the move leaves it empty and it is not a home stack.
	pub fn reparent_task(&mut self, task: TaskId, to: StackId, position: StackPosition, reason: &str) -> Result<()> {
		let from = self.try_task(task)?.stack;
		let target = self.try_stack(to)?;
		if from != Some(to) && target.is_pinned() && !target.is_empty() {
			return Err(HierarchyError::PinnedStackOccupied(to));
		}

		if let Some(old) = from.and_then(|s| self.stacks.get_mut(&s)) {
			old.tasks.retain(|t| *t != task);
			if old.resumed.is_some_and(|r| self.records.get(&r).is_some_and(|r| r.task == Some(task))) {
				old.resumed = None;
			}
		}
		if let Some(new) = self.stacks.get_mut(&to) {
			let index = match position {
				StackPosition::Top => new.tasks.len(),
				StackPosition::Bottom => 0,
				StackPosition::Index(i) => i.min(new.tasks.len()),
			};
			new.tasks.insert(index, task);
		}
		if let Some(t) = self.tasks.get_mut(&task) {
			t.stack = Some(to);
		}
		tracing::debug!(task = %task, ?from, to = %to, ?position, reason, "hierarchy.reparent_task");
		self.emit(HierarchyEvent::TaskMoved { task, stack: to });

		if let Some(old) = from.filter(|s| *s != to) {
			self.remove_stack_if_empty(old);
		}
		Ok(())
	}

	/// Puts `task` on top of its stack and brings the stack forward.
	pub fn move_task_to_front(&mut self, task: TaskId, reason: &str) -> Result<()> {
		let stack = self.try_task(task)?.stack.ok_or(HierarchyError::UnknownTask(task))?;
		if let Some(s) = self.stacks.get_mut(&stack)
			&& s.tasks.last() != Some(&task)
		{
			s.tasks.retain(|t| *t != task);
			s.tasks.push(task);
			self.emit(HierarchyEvent::TaskMoved { task, stack });
		}
		tracing::debug!(task = %task, stack = %stack, reason, "hierarchy.move_task_to_front");
		self.move_stack_to_front(stack, reason)
	}

	/// Puts `stack` on top of its display, brings the display forward and
	/// focuses the stack when it can take focus.
	pub fn move_stack_to_front(&mut self, stack: StackId, reason: &str) -> Result<()> {
		let s = self.try_stack(stack)?;
		let focusable = s.is_focusable();
		let Some(display_id) = s.display else {
			return Ok(());
		};
		let d = self.displays.get_mut(&display_id).ok_or(HierarchyError::UnknownDisplay(display_id))?;
		let moved = d.top_stack() != Some(stack);
		if moved {
			d.stacks.retain(|s| *s != stack);
			d.stacks.push(stack);
		}
		if self.display_order.last() != Some(&display_id) {
			self.display_order.retain(|d| *d != display_id);
			self.display_order.push(display_id);
		}
		if focusable {
			self.focused_stack = Some(stack);
		}
		if moved {
			tracing::debug!(stack = %stack, display = %display_id, reason, "hierarchy.move_stack_to_front");
			self.emit(HierarchyEvent::StackMovedToFront { stack, display: display_id });
		}
		Ok(())
	}

	/// Moves `task` to the bottom of its stack.
	pub fn move_task_to_back(&mut self, task: TaskId) -> Result<()> {
		let stack = self.try_task(task)?.stack.ok_or(HierarchyError::UnknownTask(task))?;
		if let Some(s) = self.stacks.get_mut(&stack) {
			s.tasks.retain(|t| *t != task);
			s.tasks.insert(0, task);
		}
		self.emit(HierarchyEvent::TaskMoved { task, stack });
		Ok(())
	}

	/// Drops an empty task from its stack and the registry.
	pub(crate) fn remove_task(&mut self, task: TaskId) {
		let Some(t) = self.tasks.remove(&task) else {
			return;
		};
		tracing::debug!(task = %task, stack = ?t.stack, "hierarchy.remove_task");
		self.emit(HierarchyEvent::TaskRemoved { task });
		if let Some(stack) = t.stack {
			if let Some(s) = self.stacks.get_mut(&stack) {
				s.tasks.retain(|id| *id != task);
			}
			self.remove_stack_if_empty(stack);
		}
	}

	/// Removes `task` if it holds no records. Returns `true` if it was removed.
	pub fn remove_task_if_empty(&mut self, task: TaskId) -> bool {
		if self.tasks.get(&task).is_some_and(|t| t.activities.is_empty()) {
			self.remove_task(task);
			return true;
		}
		false
	}

	fn remove_stack_if_empty(&mut self, stack: StackId) {
		if self.stacks.get(&stack).is_some_and(|s| s.is_empty() && !s.is_home()) {
			self.remove_stack(stack);
		}
	}

	/// Detaches and drops an empty stack. Returns `false` if it still holds tasks.
	pub fn remove_stack(&mut self, stack: StackId) -> bool {
		match self.stacks.get(&stack) {
			Some(s) if s.is_empty() => {}
			_ => return false,
		}
		let Some(s) = self.stacks.remove(&stack) else {
			return false;
		};
		let display_id = s.display.unwrap_or(DisplayId::DEFAULT);
		if let Some(d) = self.displays.get_mut(&display_id) {
			d.stacks.retain(|id| *id != stack);
		}
		tracing::debug!(stack = %stack, display = %display_id, "hierarchy.remove_stack");
		self.emit(HierarchyEvent::StackRemoved { stack, display: display_id });
		if self.focused_stack == Some(stack) {
			self.focused_stack = self.top_focusable_stack();
		}
		true
	}

	/// Front-most focusable stack, searching displays front to back.
	pub fn top_focusable_stack(&self) -> Option<StackId> {
		self.display_order.iter().rev().find_map(|d| {
			let display = self.displays.get(d)?;
			display.stacks.iter().rev().copied().find(|s| self.stacks.get(s).is_some_and(|s| s.is_focusable()))
		})
	}

	/// Returns `true` unless a non-empty opaque stack sits above `stack`.
	pub fn is_stack_visible(&self, stack: StackId) -> bool {
		let Some(display) = self.stacks.get(&stack).and_then(|s| s.display).and_then(|d| self.displays.get(&d)) else {
			return false;
		};
		for id in display.stacks.iter().rev() {
			if *id == stack {
				return true;
			}
			if self.stacks.get(id).is_some_and(|s| s.is_opaque() && s.tasks.iter().any(|t| self.top_running_activity(*t, None).is_some())) {
				return false;
			}
		}
		false
	}
}
