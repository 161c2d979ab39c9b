use foyer_primitives::{ActivityType, DisplayId, RecordId, StackId, TaskId, WindowingMode};

/// Ordered group of tasks sharing a windowing mode and a display.
#[derive(Debug, Clone)]
pub struct Stack {
	pub id: StackId,
	pub display: Option<DisplayId>,
	pub windowing_mode: WindowingMode,
	pub activity_type: ActivityType,
	/// Bottom to top.
	pub(crate) tasks: Vec<TaskId>,
	pub resumed: Option<RecordId>,
}

impl Stack {
	pub(crate) fn new(id: StackId, display: DisplayId, windowing_mode: WindowingMode, activity_type: ActivityType) -> Self {
		Self {
			id,
			display: Some(display),
			windowing_mode,
			activity_type,
			tasks: Vec::new(),
			resumed: None,
		}
	}

	/// Tasks bottom to top.
	pub fn tasks(&self) -> &[TaskId] {
		&self.tasks
	}

	pub fn top_task(&self) -> Option<TaskId> {
		self.tasks.last().copied()
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	pub fn is_attached(&self) -> bool {
		self.display.is_some()
	}

	pub fn is_home(&self) -> bool {
		self.activity_type == ActivityType::Home
	}

	pub fn is_pinned(&self) -> bool {
		self.windowing_mode == WindowingMode::Pinned
	}

	pub fn is_split_screen_primary(&self) -> bool {
		self.windowing_mode == WindowingMode::SplitScreenPrimary
	}

	/// Covers everything below it on the display when visible.
	pub fn is_opaque(&self) -> bool {
		matches!(self.windowing_mode, WindowingMode::Fullscreen | WindowingMode::Undefined)
	}

	/// Can hold input focus; pinned stacks never do.
	pub fn is_focusable(&self) -> bool {
		!self.is_pinned()
	}

	/// Returns `true` when a record of `activity_type` may live here.
	pub fn accepts(&self, activity_type: ActivityType) -> bool {
		let standardish = |t| matches!(t, ActivityType::Undefined | ActivityType::Standard);
		self.activity_type == activity_type || (standardish(self.activity_type) && standardish(activity_type))
	}
}
