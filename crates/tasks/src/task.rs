use foyer_primitives::{ComponentName, Intent, IntentFlags, RecordId, Rect, StackId, TaskId, Uid, UserId, VoiceSessionId};

use crate::record::ActivityRecord;

/// Width of the task id range owned by each user.
pub const MAX_TASK_IDS_PER_USER: u32 = 100_000;

/// Ordered group of records sharing a back stack.
///
/// `activities` runs bottom to top. A non-empty task has exactly one record
/// flagged `front_of_task`: the lowest record that is not finishing.
#[derive(Debug, Clone)]
pub struct Task {
	pub id: TaskId,
	pub user: UserId,
	pub effective_uid: Uid,
	pub(crate) activities: Vec<RecordId>,
	/// Base intent, taken from the root record.
	pub intent: Option<Intent>,
	/// Intent of a root that was moved here by affinity.
	pub affinity_intent: Option<Intent>,
	pub real_activity: Option<ComponentName>,
	pub affinity: Option<String>,
	pub root_affinity: Option<String>,
	pub stack: Option<StackId>,
	pub in_recents: bool,
	pub voice_session: Option<VoiceSessionId>,
	pub affiliated_task: TaskId,
	/// Back navigation from this task returns to home.
	pub return_to_home: bool,
	pub bounds: Option<Rect>,
	pub root_was_reset: bool,
	/// Set while the task is cleared for reuse; an empty reused task survives.
	pub(crate) reuse_task: bool,
}

impl Task {
	pub(crate) fn new(id: TaskId, user: UserId, effective_uid: Uid, voice_session: Option<VoiceSessionId>) -> Self {
		Self {
			id,
			user,
			effective_uid,
			activities: Vec::new(),
			intent: None,
			affinity_intent: None,
			real_activity: None,
			affinity: None,
			root_affinity: None,
			stack: None,
			in_recents: false,
			voice_session,
			affiliated_task: id,
			return_to_home: false,
			bounds: None,
			root_was_reset: false,
			reuse_task: false,
		}
	}

	/// Records bottom to top.
	pub fn activities(&self) -> &[RecordId] {
		&self.activities
	}

	pub fn is_empty(&self) -> bool {
		self.activities.is_empty()
	}

	pub fn contains(&self, record: RecordId) -> bool {
		self.activities.contains(&record)
	}

	/// Adopts `root`'s intent as the task's base intent.
	pub(crate) fn set_intent(&mut self, root: &ActivityRecord) {
		let mut intent = root.intent.clone();
		intent.remove_flags(IntentFlags::NEW_TASK | IntentFlags::CLEAR_TASK | IntentFlags::MULTIPLE_TASK | IntentFlags::BROUGHT_TO_FRONT);
		intent.component = Some(root.info.component.clone());
		self.intent = Some(intent);
		self.real_activity = Some(root.info.component.clone());
		self.affinity = root.info.task_affinity.clone();
		if self.root_affinity.is_none() {
			self.root_affinity = self.affinity.clone();
		}
		self.effective_uid = root.uid();
		self.user = root.user;
		self.return_to_home |= root.intent.flags.contains(IntentFlags::TASK_ON_HOME);
		if root.intent.flags.contains(IntentFlags::RESET_TASK_IF_NEEDED) {
			self.root_was_reset = true;
		}
	}

	/// Returns `true` when `record`'s intent, pinned to its resolved component,
	/// matches this task's base intent filter.
	pub fn is_same_intent_filter(&self, record: &ActivityRecord) -> bool {
		let Some(base) = &self.intent else {
			return false;
		};
		let mut intent = record.intent.clone();
		intent.component = Some(record.info.component.clone());
		intent.filter_equals(base)
	}

	/// Task was started as a document (recents entry per document).
	pub fn is_document(&self) -> bool {
		self.intent.as_ref().is_some_and(|i| i.flags.contains(IntentFlags::NEW_DOCUMENT))
	}
}
