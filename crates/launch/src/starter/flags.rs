//! Effective launch flags, source and explicit-task validation.

use foyer_primitives::{DisplayId, DocumentLaunchMode, IntentFlags, LaunchMode, WindowingMode};
use foyer_tasks::LifecycleState;

use super::Starter;
use crate::error::{LaunchError, Result};
use crate::request::StartFlags;

impl Starter<'_, '_> {
	pub(super) fn set_initial_state(&mut self) {
		self.preferred_display = self.initial_preferred_display();

		self.launch_flags = self.adjust_launch_flags_to_document_mode(self.intent.flags);
		let behind_requested = self.h.record(self.start).is_some_and(|r| r.launch_task_behind);
		self.launch_task_behind = behind_requested
			&& !self.is_launch_mode_one_of(LaunchMode::SingleTask, LaunchMode::SingleInstance)
			&& self.launch_flags.contains(IntentFlags::NEW_DOCUMENT);

		self.send_new_task_result_request_if_needed();

		if self.launch_flags.contains(IntentFlags::NEW_DOCUMENT) && self.result_to().is_none() {
			self.launch_flags |= IntentFlags::NEW_TASK;
		}
		if self.launch_flags.contains(IntentFlags::NEW_TASK)
			&& (self.launch_task_behind || self.info.document_launch_mode == DocumentLaunchMode::Always)
		{
			self.launch_flags |= IntentFlags::MULTIPLE_TASK;
		}

		if let Some(options) = &self.options {
			if let Some(task) = options.launch_task_id
				&& options.task_overlay
			{
				let can_resume = options.can_task_overlay_resume;
				if let Some(r) = self.h.record_mut(self.start) {
					r.task_overlay = true;
				}
				let top_paused = self
					.h
					.top_activity(task)
					.and_then(|top| self.h.record(top))
					.is_some_and(|top| !top.is_state(LifecycleState::Resumed));
				if !can_resume && top_paused {
					self.do_resume = false;
					self.avoid_move_to_front = true;
				}
			} else if options.avoid_move_to_front {
				self.do_resume = false;
				self.avoid_move_to_front = true;
			}
		}

		self.not_top = if self.launch_flags.contains(IntentFlags::PREVIOUS_IS_TOP) { self.source } else { None };

		if let Some(task) = self.in_task
			&& !self.h.task(task).is_some_and(|t| t.in_recents)
		{
			tracing::warn!(task = %task, "launch.start: explicit task is not in recents");
			self.in_task = None;
		}

		if self.start_flags.contains(StartFlags::ONLY_IF_NEEDED) {
			let checked_caller = self.source.or_else(|| self.h.top_running_of_focused(self.not_top));
			let same_component = checked_caller
				.and_then(|c| self.h.record(c))
				.is_some_and(|c| c.component() == &self.info.component);
			if !same_component {
				self.start_flags.remove(StartFlags::ONLY_IF_NEEDED);
			}
		}

		self.no_animation = self.launch_flags.contains(IntentFlags::NO_ANIMATION);

		if self.restricted_bg && !self.config.background_starts_enabled {
			self.avoid_move_to_front = true;
			self.do_resume = false;
		}
	}

	/// Launch display before any reuse lookup: options, then source, then explicit task.
	fn initial_preferred_display(&self) -> DisplayId {
		let requested = self
			.options
			.as_ref()
			.and_then(|o| o.launch_display)
			.filter(|d| self.h.display(*d).is_some());
		requested
			.or_else(|| self.source.and_then(|s| self.h.display_of_record(s)))
			.or_else(|| self.in_task.and_then(|t| self.h.stack_of_task(t)).and_then(|s| self.h.display_of_stack(s)))
			.unwrap_or(DisplayId::DEFAULT)
	}

	/// Reconciles the intent's document flags with the manifest; the manifest wins.
	pub(super) fn adjust_launch_flags_to_document_mode(&self, mut flags: IntentFlags) -> IntentFlags {
		let single = self.is_launch_mode_one_of(LaunchMode::SingleInstance, LaunchMode::SingleTask);
		if flags.contains(IntentFlags::NEW_DOCUMENT) && single {
			tracing::info!("launch.start: ignoring NEW_DOCUMENT, launch mode is singleInstance or singleTask");
			flags.remove(IntentFlags::NEW_DOCUMENT | IntentFlags::MULTIPLE_TASK);
			return flags;
		}
		match self.info.document_launch_mode {
			DocumentLaunchMode::None => {}
			DocumentLaunchMode::IntoExisting | DocumentLaunchMode::Always => flags |= IntentFlags::NEW_DOCUMENT,
			DocumentLaunchMode::Never => flags.remove(IntentFlags::MULTIPLE_TASK),
		}
		flags
	}

	/// A record going into a new task cannot keep a result link to its caller.
	fn send_new_task_result_request_if_needed(&mut self) {
		let linked = self.result_to().is_some_and(|to| self.h.stack_of_record(to).is_some());
		if linked && self.launch_flags.contains(IntentFlags::NEW_TASK) {
			tracing::warn!(record = %self.start, "launch.start: launching as a new task, cancelling activity result");
			self.cancel_result_link();
		}
	}

	pub(super) fn compute_launching_task_flags(&mut self) -> Result<()> {
		let explicit_task = self.in_task.filter(|t| self.source.is_none() && self.h.stack_of_task(*t).is_some());
		if let Some(task) = explicit_task {
			let base = self
				.h
				.task(task)
				.and_then(|t| t.intent.clone())
				.ok_or(LaunchError::TaskWithoutBaseIntent(task))?;
			let root = self.h.root_activity(task);

			if self.is_launch_mode_one_of(LaunchMode::SingleInstance, LaunchMode::SingleTask) {
				let component = self.info.component.to_string();
				if base.component != self.intent.component {
					return Err(LaunchError::SingleTaskIntoForeignTask { task, component });
				}
				if root.is_some() {
					return Err(LaunchError::SingleTaskIntoRootedTask { task, component });
				}
			}

			if root.is_none() {
				let interesting = IntentFlags::NEW_TASK | IntentFlags::MULTIPLE_TASK | IntentFlags::NEW_DOCUMENT | IntentFlags::RETAIN_IN_RECENTS;
				self.launch_flags = self.launch_flags.difference(interesting) | base.flags.intersection(interesting);
				self.sync_intent();
				self.h.set_task_intent(task, self.start)?;
				self.adding_to_task = true;
			} else {
				self.adding_to_task = !self.launch_flags.contains(IntentFlags::NEW_TASK);
			}
			self.reuse_task = Some(task);
		} else {
			self.in_task = None;
			let source_in_freeform = self
				.source
				.and_then(|s| self.h.stack_of_record(s))
				.and_then(|s| self.h.stack(s))
				.is_some_and(|s| s.windowing_mode == WindowingMode::Freeform);
			if self.info.no_display && source_in_freeform {
				self.adding_to_task = true;
			}
		}

		if self.in_task.is_none() {
			let source_mode = self.source.and_then(|s| self.h.record(s)).map(|r| r.launch_mode());
			match source_mode {
				None if !self.launch_flags.contains(IntentFlags::NEW_TASK) => {
					tracing::warn!(intent = %self.intent, "launch.start: started from a non-activity context, forcing NEW_TASK");
					self.launch_flags |= IntentFlags::NEW_TASK;
				}
				None => {}
				Some(LaunchMode::SingleInstance) => self.launch_flags |= IntentFlags::NEW_TASK,
				Some(_) if self.is_launch_mode_one_of(LaunchMode::SingleInstance, LaunchMode::SingleTask) => {
					self.launch_flags |= IntentFlags::NEW_TASK;
				}
				Some(_) => {}
			}
		}
		Ok(())
	}

	/// Drops a finishing source; its task may be on its way out.
	pub(super) fn compute_source_stack(&mut self) {
		let Some(source) = self.source else {
			self.source_stack = None;
			return;
		};
		let live = self.h.record(source).filter(|r| !r.finishing).and_then(|r| r.task);
		if let Some(task) = live {
			self.source_task = Some(task);
			self.source_stack = self.h.stack_of_task(task);
			return;
		}

		if !self.launch_flags.contains(IntentFlags::NEW_TASK) {
			tracing::warn!(source = %source, intent = %self.intent, "launch.start: started from a finishing record, forcing NEW_TASK");
			self.launch_flags |= IntentFlags::NEW_TASK;
			if let Some(r) = self.h.record(source) {
				self.new_task_info = Some(r.info.clone());
				self.new_task_intent = r.task.and_then(|t| self.h.task(t)).and_then(|t| t.intent.clone());
			}
		}
		self.source = None;
		self.source_task = None;
		self.source_stack = None;
	}
}
