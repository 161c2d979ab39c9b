//! Start requests and launch options.
//!
//! A [`StartRequest`] is a plain value built once with the `with_*` methods
//! and then only read by the resolver. Stages that redirect the start (permission
//! review, instant-app install, heavy-weight switch) work on copies.

use foyer_primitives::{
	ActivityInfo, ActivityType, Configuration, DisplayId, Intent, PendingIntentId, Pid, Rect, RecordId, ResolveInfo, TaskId, Uid, UserId, VoiceSessionId,
	WindowingMode,
};

bitflags::bitflags! {
	/// Caller-supplied start flags, distinct from the intent's launch flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct StartFlags: u32 {
		/// Do nothing if the launched component is already the caller on top.
		const ONLY_IF_NEEDED = 1 << 0;
		const DEBUG = 1 << 1;
		const TRACK_ALLOCATION = 1 << 2;
		const NATIVE_DEBUGGING = 1 << 3;
	}
}

/// Placement hints attached to a start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityOptions {
	/// Launch into (or reuse the top of) this task.
	pub launch_task_id: Option<TaskId>,
	/// With `launch_task_id`, the record stays above everything else in the task.
	pub task_overlay: bool,
	/// Overlay may resume even when the task's top is not resumed.
	pub can_task_overlay_resume: bool,
	/// Leave z-order and focus alone.
	pub avoid_move_to_front: bool,
	pub launch_display: Option<DisplayId>,
	pub launch_windowing_mode: WindowingMode,
	pub launch_activity_type: ActivityType,
	pub launch_bounds: Option<Rect>,
	/// Start the task behind the current one.
	pub task_behind: bool,
	/// Keep recents ordering frozen while the recents component switches tasks.
	pub freeze_recents_reordering: bool,
}

impl ActivityOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_launch_task(mut self, task: TaskId) -> Self {
		self.launch_task_id = Some(task);
		self
	}

	pub fn as_task_overlay(mut self, can_resume: bool) -> Self {
		self.task_overlay = true;
		self.can_task_overlay_resume = can_resume;
		self
	}

	pub fn avoiding_move_to_front(mut self) -> Self {
		self.avoid_move_to_front = true;
		self
	}

	pub fn with_display(mut self, display: DisplayId) -> Self {
		self.launch_display = Some(display);
		self
	}

	pub fn with_windowing_mode(mut self, mode: WindowingMode) -> Self {
		self.launch_windowing_mode = mode;
		self
	}

	pub fn with_bounds(mut self, bounds: Rect) -> Self {
		self.launch_bounds = Some(bounds);
		self
	}

	pub fn task_behind(mut self) -> Self {
		self.task_behind = true;
		self
	}

	pub fn freezing_recents_reordering(mut self) -> Self {
		self.freeze_recents_reordering = true;
		self
	}
}

/// One request to start a component.
#[derive(Debug, Clone)]
pub struct StartRequest {
	/// Process of the calling application; must be known to the process registry.
	pub caller: Option<Pid>,
	pub calling_pid: Option<Pid>,
	pub calling_uid: Uid,
	pub calling_package: Option<String>,
	pub real_calling_pid: Option<Pid>,
	pub real_calling_uid: Uid,
	/// Overrides the uid instant-app filtering is computed for.
	pub filter_calling_uid: Option<Uid>,
	pub intent: Intent,
	/// Untouched copy of the intent, handed to the instant-app installer.
	pub ephemeral_intent: Option<Intent>,
	pub resolved_type: Option<String>,
	/// Pre-resolved target. Wait mode resolves this itself.
	pub activity_info: Option<ActivityInfo>,
	pub resolve_info: Option<ResolveInfo>,
	pub user: UserId,
	pub voice_session: Option<VoiceSessionId>,
	pub result_to: Option<RecordId>,
	pub result_who: Option<String>,
	pub request_code: i32,
	pub start_flags: StartFlags,
	pub options: Option<ActivityOptions>,
	pub ignore_target_security: bool,
	pub component_specified: bool,
	/// Explicit task to launch into.
	pub in_task: Option<TaskId>,
	pub reason: Option<String>,
	pub originating_pending_intent: Option<PendingIntentId>,
	/// The sender of the originating pending intent allowlisted this start.
	pub allow_background_start: bool,
	/// Resolve the intent here and let the service block until the launch settles.
	pub may_wait: bool,
	/// Configuration to switch to once the start has been issued.
	pub global_config: Option<Configuration>,
}

impl StartRequest {
	/// Request from `calling_uid` with no result link and no options.
	pub fn new(intent: Intent, calling_uid: Uid) -> Self {
		let component_specified = intent.component.is_some();
		Self {
			caller: None,
			calling_pid: None,
			calling_uid,
			calling_package: None,
			real_calling_pid: None,
			real_calling_uid: calling_uid,
			filter_calling_uid: None,
			intent,
			ephemeral_intent: None,
			resolved_type: None,
			activity_info: None,
			resolve_info: None,
			user: calling_uid.user_id(),
			voice_session: None,
			result_to: None,
			result_who: None,
			request_code: -1,
			start_flags: StartFlags::empty(),
			options: None,
			ignore_target_security: false,
			component_specified,
			in_task: None,
			reason: None,
			originating_pending_intent: None,
			allow_background_start: false,
			may_wait: false,
			global_config: None,
		}
	}

	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	pub fn with_caller(mut self, caller: Pid) -> Self {
		self.caller = Some(caller);
		self
	}

	pub fn with_calling_pid(mut self, pid: Pid) -> Self {
		self.calling_pid = Some(pid);
		self
	}

	pub fn with_calling_package(mut self, package: impl Into<String>) -> Self {
		self.calling_package = Some(package.into());
		self
	}

	/// Sets the process that actually sent the request (pending-intent senders).
	pub fn with_real_caller(mut self, pid: Option<Pid>, uid: Uid) -> Self {
		self.real_calling_pid = pid;
		self.real_calling_uid = uid;
		self
	}

	pub fn with_filter_calling_uid(mut self, uid: Uid) -> Self {
		self.filter_calling_uid = Some(uid);
		self
	}

	/// Supplies the resolved target; the activity info is taken from `resolve`.
	pub fn with_resolved(mut self, resolve: ResolveInfo) -> Self {
		self.user = resolve.activity.uid().user_id();
		self.activity_info = Some(resolve.activity.clone());
		self.resolve_info = Some(resolve);
		self
	}

	pub fn with_activity_info(mut self, info: ActivityInfo) -> Self {
		self.user = info.uid().user_id();
		self.activity_info = Some(info);
		self
	}

	pub fn with_resolved_type(mut self, mime: impl Into<String>) -> Self {
		self.resolved_type = Some(mime.into());
		self
	}

	pub fn with_user(mut self, user: UserId) -> Self {
		self.user = user;
		self
	}

	pub fn with_voice_session(mut self, session: VoiceSessionId) -> Self {
		self.voice_session = Some(session);
		self
	}

	/// Asks for a result to be delivered to `to`.
	pub fn with_result(mut self, to: RecordId, who: Option<String>, request_code: i32) -> Self {
		self.result_to = Some(to);
		self.result_who = who;
		self.request_code = request_code;
		self
	}

	pub fn with_start_flags(mut self, flags: StartFlags) -> Self {
		self.start_flags = flags;
		self
	}

	pub fn with_options(mut self, options: ActivityOptions) -> Self {
		self.options = Some(options);
		self
	}

	pub fn ignoring_target_security(mut self) -> Self {
		self.ignore_target_security = true;
		self
	}

	pub fn with_in_task(mut self, task: TaskId) -> Self {
		self.in_task = Some(task);
		self
	}

	pub fn from_pending_intent(mut self, sender: PendingIntentId, allowlisted: bool) -> Self {
		self.originating_pending_intent = Some(sender);
		self.allow_background_start = allowlisted;
		self
	}

	pub fn allowing_background_start(mut self) -> Self {
		self.allow_background_start = true;
		self
	}

	pub fn waiting(mut self) -> Self {
		self.may_wait = true;
		self
	}

	pub fn with_global_config(mut self, config: Configuration) -> Self {
		self.global_config = Some(config);
		self
	}

	pub(crate) fn has_reason(&self) -> bool {
		self.reason.as_deref().is_some_and(|r| !r.is_empty())
	}
}

/// Uid the package manager should filter instant apps for.
///
/// An explicit `filter` wins, then the uid the call is made on behalf of,
/// then the uid actually making the call.
pub fn compute_resolve_filter_uid(custom: Option<Uid>, actual: Uid, filter: Option<Uid>) -> Uid {
	filter.or(custom).unwrap_or(actual)
}
