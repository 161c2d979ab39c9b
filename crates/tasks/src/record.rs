//! Activity records: one started instance of a component.

use foyer_primitives::{ActivityInfo, ActivityType, ComponentName, Intent, LaunchMode, Pid, RecordId, TaskId, Uid, UserId, VoiceSessionId};

/// Result code delivered when a start or a result link is cancelled.
pub const RESULT_CANCELED: i32 = 0;
/// Result code for a successful result.
pub const RESULT_OK: i32 = -1;

/// Lifecycle position of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
	#[default]
	Initializing,
	Resumed,
	Paused,
	Stopped,
	Finishing,
}

/// Result sent back to a record that started another one for a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityResult {
	pub from: Option<RecordId>,
	pub result_who: Option<String>,
	pub request_code: i32,
	pub result_code: i32,
	pub data: Option<Intent>,
}

/// Everything needed to construct an [`ActivityRecord`].
#[derive(Debug, Clone)]
pub struct RecordSpec {
	pub info: ActivityInfo,
	pub intent: Intent,
	pub launched_from_uid: Uid,
	pub launched_from_pid: Option<Pid>,
	pub launched_from_package: Option<String>,
	pub result_to: Option<RecordId>,
	pub result_who: Option<String>,
	pub request_code: i32,
	/// Caller named the component explicitly.
	pub component_specified: bool,
	pub voice_session: Option<VoiceSessionId>,
}

impl RecordSpec {
	/// Spec for a record launched by `uid` with no result link.
	pub fn new(info: ActivityInfo, intent: Intent, launched_from_uid: Uid) -> Self {
		Self {
			info,
			intent,
			launched_from_uid,
			launched_from_pid: None,
			launched_from_package: None,
			result_to: None,
			result_who: None,
			request_code: -1,
			component_specified: false,
			voice_session: None,
		}
	}
}

/// One instance of a started component.
///
/// Owned by the hierarchy; `task` is `None` until the resolver attaches it.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
	pub id: RecordId,
	pub info: ActivityInfo,
	pub intent: Intent,
	pub user: UserId,
	pub launched_from_uid: Uid,
	pub launched_from_pid: Option<Pid>,
	pub launched_from_package: Option<String>,
	pub state: LifecycleState,
	pub result_to: Option<RecordId>,
	pub result_who: Option<String>,
	pub request_code: i32,
	pub component_specified: bool,
	pub task: Option<TaskId>,
	pub front_of_task: bool,
	pub finishing: bool,
	pub visible: bool,
	pub task_overlay: bool,
	pub launch_task_behind: bool,
	pub voice_session: Option<VoiceSessionId>,
	/// Intents delivered to this instance after creation.
	pub new_intents: Vec<Intent>,
	/// Results delivered to this instance.
	pub results: Vec<ActivityResult>,
}

impl ActivityRecord {
	pub(crate) fn new(id: RecordId, spec: RecordSpec) -> Self {
		let user = spec.info.uid().user_id();
		Self {
			id,
			user,
			info: spec.info,
			intent: spec.intent,
			launched_from_uid: spec.launched_from_uid,
			launched_from_pid: spec.launched_from_pid,
			launched_from_package: spec.launched_from_package,
			state: LifecycleState::Initializing,
			result_to: spec.result_to,
			result_who: spec.result_who,
			request_code: spec.request_code,
			component_specified: spec.component_specified,
			task: None,
			front_of_task: false,
			finishing: false,
			visible: false,
			task_overlay: false,
			launch_task_behind: false,
			voice_session: spec.voice_session,
			new_intents: Vec::new(),
			results: Vec::new(),
		}
	}

	pub fn component(&self) -> &ComponentName {
		&self.info.component
	}

	pub fn launch_mode(&self) -> LaunchMode {
		self.info.launch_mode
	}

	pub fn uid(&self) -> Uid {
		self.info.uid()
	}

	pub fn package(&self) -> &str {
		self.info.package()
	}

	pub fn activity_type(&self) -> ActivityType {
		self.info.activity_type
	}

	pub fn is_home(&self) -> bool {
		self.info.activity_type == ActivityType::Home
	}

	/// Returns `true` when both records have compatible activity types.
	pub fn has_compatible_activity_type(&self, other: ActivityType) -> bool {
		let mine = self.info.activity_type;
		let undefined_or_standard = |t| matches!(t, ActivityType::Undefined | ActivityType::Standard);
		mine == other || (undefined_or_standard(mine) && undefined_or_standard(other))
	}

	pub fn is_state(&self, state: LifecycleState) -> bool {
		self.state == state
	}

	/// Record is not finishing and has not been asked to finish.
	pub fn is_running(&self) -> bool {
		!self.finishing
	}
}
