//! Placement of one accepted start.
//!
//! A [`Starter`] lives for a single invocation and is consumed by
//! [`Starter::run`]. Its `impl` is split by phase: `flags.rs` derives the
//! effective launch flags and source, `reuse.rs` folds a start into an
//! existing instance, `attach.rs` places a record that really starts and
//! `stack.rs` picks stacks.

mod attach;
mod flags;
mod reuse;
mod stack;

use foyer_primitives::{
	ActivityInfo, ActivityType, DisplayId, Intent, IntentFlags, LaunchMode, RecordId, StackId, StartResult, TaskId, Uid, UserId, VoiceSessionId, WindowingMode,
};
use foyer_tasks::{Hierarchy, HierarchyError, RESULT_CANCELED};

use crate::collaborators::Collaborators;
use crate::config::LaunchConfig;
use crate::error::Result;
use crate::outcome::LaunchOutcome;
use crate::request::{ActivityOptions, StartFlags};

/// Inputs of one placement, fixed by the admission stages.
#[derive(Debug, Clone)]
pub(crate) struct StartParams {
	pub record: RecordId,
	pub source: Option<RecordId>,
	pub voice_session: Option<VoiceSessionId>,
	pub start_flags: StartFlags,
	pub do_resume: bool,
	pub options: Option<ActivityOptions>,
	pub in_task: Option<TaskId>,
	/// The background-start policy restricted this start.
	pub restricted_bg: bool,
}

pub(crate) struct Starter<'s, 'c> {
	h: &'s mut Hierarchy,
	env: &'s mut Collaborators<'c>,
	config: &'s LaunchConfig,

	start: RecordId,
	info: ActivityInfo,
	user: UserId,
	/// Working copy of the start record's intent; written back when it changes.
	intent: Intent,
	calling_uid: Uid,
	options: Option<ActivityOptions>,

	launch_flags: IntentFlags,
	launch_mode: LaunchMode,
	start_flags: StartFlags,
	do_resume: bool,
	avoid_move_to_front: bool,
	launch_task_behind: bool,
	restricted_bg: bool,
	no_animation: bool,
	keep_cur_transition: bool,

	source: Option<RecordId>,
	source_task: Option<TaskId>,
	source_stack: Option<StackId>,
	not_top: Option<RecordId>,
	in_task: Option<TaskId>,
	reuse_task: Option<TaskId>,
	adding_to_task: bool,
	new_task_info: Option<ActivityInfo>,
	new_task_intent: Option<Intent>,
	voice_session: Option<VoiceSessionId>,

	/// Task the start record is expected to join before it is attached.
	start_task_hint: Option<TaskId>,
	/// Task emptied for reuse during this start; dropped again if nothing lands in it.
	cleared_task: Option<TaskId>,
	target_stack: Option<StackId>,
	preferred_display: DisplayId,
	preferred_windowing_mode: WindowingMode,

	moved_to_front: bool,
	intent_delivered: bool,
	froze_task_list: bool,
	/// Record reported back to the caller.
	outcome_record: Option<RecordId>,
}

impl<'s, 'c> Starter<'s, 'c> {
	pub(crate) fn new(h: &'s mut Hierarchy, env: &'s mut Collaborators<'c>, config: &'s LaunchConfig, params: StartParams) -> Result<Self> {
		let record = h.record(params.record).ok_or(HierarchyError::UnknownRecord(params.record))?;
		let info = record.info.clone();
		let user = record.user;
		let intent = record.intent.clone();
		let calling_uid = record.launched_from_uid;
		let preferred_windowing_mode = params.options.as_ref().map(|o| o.launch_windowing_mode).unwrap_or_default();
		Ok(Self {
			h,
			env,
			config,
			start: params.record,
			launch_mode: info.launch_mode,
			info,
			user,
			launch_flags: intent.flags,
			intent,
			calling_uid,
			options: params.options,
			start_flags: params.start_flags,
			do_resume: params.do_resume,
			avoid_move_to_front: false,
			launch_task_behind: false,
			restricted_bg: params.restricted_bg,
			no_animation: false,
			keep_cur_transition: false,
			source: params.source,
			source_task: None,
			source_stack: None,
			not_top: None,
			in_task: params.in_task,
			reuse_task: None,
			adding_to_task: false,
			new_task_info: None,
			new_task_intent: None,
			voice_session: params.voice_session,
			start_task_hint: None,
			cleared_task: None,
			target_stack: None,
			preferred_display: DisplayId::DEFAULT,
			preferred_windowing_mode,
			moved_to_front: false,
			intent_delivered: false,
			froze_task_list: false,
			outcome_record: None,
		})
	}

	/// Places the record inside one deferred layout batch and cleans up after failure.
	pub(crate) fn run(mut self) -> Result<LaunchOutcome> {
		self.env.surface.defer_surface_layout();
		let placed = self.start_unchecked();
		let result = match &placed {
			Ok(result) => *result,
			Err(_) => StartResult::Canceled,
		};
		let started_stack = self.h.stack_of_record(self.start).or(self.target_stack);

		if let Some(task) = self.cleared_task {
			self.h.remove_task_if_empty(task);
		}
		if !result.is_successful() {
			if self.h.record(self.start).is_some_and(|r| r.task.is_some()) {
				self.h.finish_activity(self.start, RESULT_CANCELED, None, "start-failed");
			}
			if let Some(stack) = started_stack
				&& self.h.stack(stack).is_some_and(|s| s.is_attached() && s.is_empty() && !s.is_home())
			{
				self.h.remove_stack(stack);
			}
		}
		if self.h.discard_record(self.start).is_some() && self.outcome_record == Some(self.start) {
			self.outcome_record = None;
		}
		self.env.surface.continue_surface_layout();

		let result = placed?;
		self.post_start_processing(result, started_stack);
		tracing::debug!(
			record = %self.start,
			result = %result,
			outcome = ?self.outcome_record,
			stack = ?started_stack,
			"launch.start: placed"
		);
		Ok(LaunchOutcome {
			result,
			record: self.outcome_record,
			stack: started_stack.filter(|s| self.h.stack(*s).is_some()),
		})
	}

	fn start_unchecked(&mut self) -> Result<StartResult> {
		self.set_initial_state();
		self.compute_launching_task_flags()?;
		self.compute_source_stack();
		self.sync_intent();

		let reused = self.reusable_intent_activity();
		if self.options.as_ref().is_none_or(|o| o.launch_display.is_none())
			&& let Some(display) = reused.and_then(|r| self.h.display_of_record(r))
		{
			self.preferred_display = display;
		}

		if self.options.as_ref().is_some_and(|o| o.freeze_recents_reordering)
			&& self.env.recents.is_caller_recents(self.calling_uid)
			&& !self.env.recents.is_freeze_task_list_reordering_set()
		{
			self.froze_task_list = true;
			self.env.recents.set_freeze_task_list_reordering();
		}

		if self.info.activity_type == ActivityType::Home && !self.can_start_home_on_display(self.preferred_display) {
			tracing::warn!(display = %self.preferred_display, "launch.start: cannot launch home on display");
			return Ok(StartResult::Canceled);
		}

		if let Some(reused) = reused
			&& let Some(result) = self.start_into_reused(reused)?
		{
			return Ok(result);
		}

		if self.info.package().is_empty() {
			self.cancel_result_link();
			return Ok(StartResult::ClassNotFound);
		}

		if let Some(result) = self.deliver_to_top_if_needed()? {
			return Ok(result);
		}

		self.place_new_record()
	}

	fn post_start_processing(&mut self, result: StartResult, started_stack: Option<StackId>) {
		if !result.is_successful() && self.froze_task_list {
			self.env.recents.reset_freeze_task_list_reordering_on_timeout();
		}
		if result.is_fatal_error() {
			return;
		}
		let Some(stack) = started_stack.and_then(|s| self.h.stack(s)) else {
			return;
		};
		let cleared_task = self.launch_flags.clears_task() && self.reuse_task.is_some();
		if !(matches!(result, StartResult::TaskToFront | StartResult::DeliveredToTop) || cleared_task) {
			return;
		}
		match stack.windowing_mode {
			WindowingMode::Pinned => self.env.task_changes.notify_pinned_activity_restart_attempt(cleared_task),
			WindowingMode::SplitScreenPrimary => {
				let home_visible = stack
					.display
					.and_then(|d| self.h.home_stack(d))
					.is_some_and(|home| self.h.is_stack_visible(home));
				if home_visible {
					self.env.surface.show_recent_apps();
				}
			}
			_ => {}
		}
	}

	/// Hands the start intent to `record`, at most once per start.
	fn deliver_new_intent(&mut self, record: RecordId) -> Result<()> {
		if self.intent_delivered {
			return Ok(());
		}
		let task = self.h.record(record).and_then(|r| r.task);
		self.log_start_event("am_new_intent", record, task);
		self.h.deliver_new_intent(record, self.intent.clone(), self.calling_uid)?;
		self.intent_delivered = true;
		Ok(())
	}

	fn log_start_event(&self, tag: &'static str, record: RecordId, task: Option<TaskId>) {
		if !self.config.start_logging_enabled {
			return;
		}
		let Some(r) = self.h.record(record) else {
			return;
		};
		tracing::info!(
			target: "foyer::events",
			user = %r.user,
			record = %record,
			task = ?task.map(|t| t.0),
			component = %r.component(),
			action = r.intent.action.as_deref().unwrap_or_default(),
			flags = r.intent.flags.bits(),
			"{tag}"
		);
	}

	/// Sends a cancelled result to the start record's result target and drops the link.
	fn cancel_result_link(&mut self) {
		let link = self
			.h
			.record_mut(self.start)
			.and_then(|r| r.result_to.take().map(|to| (to, r.result_who.clone(), r.request_code)));
		if let Some((to, who, request_code)) = link {
			self.h.send_result(to, None, who, request_code, RESULT_CANCELED, None);
		}
	}

	fn result_to(&self) -> Option<RecordId> {
		self.h.record(self.start).and_then(|r| r.result_to)
	}

	fn is_launch_mode_one_of(&self, a: LaunchMode, b: LaunchMode) -> bool {
		self.launch_mode == a || self.launch_mode == b
	}

	fn sync_intent(&mut self) {
		self.intent.flags = self.launch_flags;
		if let Some(r) = self.h.record_mut(self.start) {
			r.intent = self.intent.clone();
		}
	}

	fn resume_target_stack_if_needed(&mut self) {
		if self.do_resume {
			self.h.resume_focused_stack_top();
		}
	}
}
