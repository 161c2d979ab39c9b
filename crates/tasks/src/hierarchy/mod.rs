//! The registry proper.
//!
//! [`Hierarchy`] is split across files by concern, like one `impl` per
//! subsystem: `tasks.rs` (task membership), `order.rs` (z-order and
//! reparenting), `find.rs` (reuse lookups), `lifecycle.rs` (finish, results,
//! resume, visibility), `launch_stack.rs` (stack selection) and `dump.rs`.

mod dump;
mod find;
mod launch_stack;
mod lifecycle;
mod order;
mod tasks;

use foyer_primitives::{ActivityType, DisplayId, RecordId, StackId, TaskId, Uid, UserId, WindowingMode};
use rustc_hash::FxHashMap;

pub use self::find::{FindTaskQuery, FindTaskResult};
pub use self::launch_stack::LaunchStackQuery;
pub use self::order::StackPosition;
use crate::display::Display;
use crate::error::{HierarchyError, Result};
use crate::events::HierarchyEvent;
use crate::record::{ActivityRecord, RecordSpec};
use crate::stack::Stack;
use crate::task::Task;

/// Displays, stacks, tasks and records, with their back-references.
///
/// The default display always exists. `display_order` runs bottom to top;
/// the last display is the focused one.
#[derive(Debug)]
pub struct Hierarchy {
	records: FxHashMap<RecordId, ActivityRecord>,
	tasks: FxHashMap<TaskId, Task>,
	stacks: FxHashMap<StackId, Stack>,
	displays: FxHashMap<DisplayId, Display>,
	display_order: Vec<DisplayId>,
	focused_stack: Option<StackId>,
	next_record: u64,
	next_stack: u32,
	/// Last task id handed out per user.
	task_counters: FxHashMap<UserId, u32>,
	events: Vec<HierarchyEvent>,
}

impl Default for Hierarchy {
	fn default() -> Self {
		Self::new()
	}
}

impl Hierarchy {
	/// Registry with only the default display.
	pub fn new() -> Self {
		let mut displays = FxHashMap::default();
		displays.insert(DisplayId::DEFAULT, Display::new(DisplayId::DEFAULT, true));
		Self {
			records: FxHashMap::default(),
			tasks: FxHashMap::default(),
			stacks: FxHashMap::default(),
			displays,
			display_order: vec![DisplayId::DEFAULT],
			focused_stack: None,
			next_record: 1,
			next_stack: 1,
			task_counters: FxHashMap::default(),
			events: Vec::new(),
		}
	}

	/// Drains pending structural events in emission order.
	pub fn take_events(&mut self) -> Vec<HierarchyEvent> {
		std::mem::take(&mut self.events)
	}

	pub(crate) fn emit(&mut self, event: HierarchyEvent) {
		tracing::trace!(?event, "hierarchy.emit");
		self.events.push(event);
	}

	pub fn record(&self, id: RecordId) -> Option<&ActivityRecord> {
		self.records.get(&id)
	}

	pub fn record_mut(&mut self, id: RecordId) -> Option<&mut ActivityRecord> {
		self.records.get_mut(&id)
	}

	pub fn task(&self, id: TaskId) -> Option<&Task> {
		self.tasks.get(&id)
	}

	pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
		self.tasks.get_mut(&id)
	}

	pub fn stack(&self, id: StackId) -> Option<&Stack> {
		self.stacks.get(&id)
	}

	pub fn display(&self, id: DisplayId) -> Option<&Display> {
		self.displays.get(&id)
	}

	pub(crate) fn try_record(&self, id: RecordId) -> Result<&ActivityRecord> {
		self.records.get(&id).ok_or(HierarchyError::UnknownRecord(id))
	}

	pub(crate) fn try_task(&self, id: TaskId) -> Result<&Task> {
		self.tasks.get(&id).ok_or(HierarchyError::UnknownTask(id))
	}

	pub(crate) fn try_stack(&self, id: StackId) -> Result<&Stack> {
		self.stacks.get(&id).ok_or(HierarchyError::UnknownStack(id))
	}

	pub fn records(&self) -> impl Iterator<Item = &ActivityRecord> {
		self.records.values()
	}

	pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
		self.tasks.keys().copied()
	}

	/// Displays bottom to top.
	pub fn display_ids(&self) -> &[DisplayId] {
		&self.display_order
	}

	/// Displays front-most first, with `preferred` moved ahead of everything.
	pub(crate) fn displays_preferring(&self, preferred: DisplayId) -> Vec<DisplayId> {
		let mut order: Vec<DisplayId> = self.display_order.iter().rev().copied().filter(|d| *d != preferred).collect();
		if self.displays.contains_key(&preferred) {
			order.insert(0, preferred);
		}
		order
	}

	/// Adds a secondary display. Home never runs on displays without system decorations.
	pub fn add_display(&mut self, id: DisplayId, supports_home: bool, owner_uid: Option<Uid>) {
		let mut display = Display::new(id, supports_home);
		display.owner_uid = owner_uid;
		self.displays.insert(id, display);
		if !self.display_order.contains(&id) {
			self.display_order.insert(0, id);
		}
		tracing::debug!(display = %id, supports_home, "hierarchy.add_display");
	}

	/// Removes a secondary display; its stacks move to the default display.
	pub fn remove_display(&mut self, id: DisplayId) -> Result<()> {
		if id == DisplayId::DEFAULT {
			return Ok(());
		}
		let display = self.displays.remove(&id).ok_or(HierarchyError::UnknownDisplay(id))?;
		self.display_order.retain(|d| *d != id);
		for stack in display.stacks {
			if let Some(s) = self.stacks.get_mut(&stack) {
				s.display = Some(DisplayId::DEFAULT);
			}
			if let Some(default) = self.displays.get_mut(&DisplayId::DEFAULT) {
				default.stacks.push(stack);
			}
		}
		Ok(())
	}

	pub fn focused_stack(&self) -> Option<StackId> {
		self.focused_stack
	}

	pub fn focused_display(&self) -> DisplayId {
		self.display_order.last().copied().unwrap_or(DisplayId::DEFAULT)
	}

	pub fn top_stack(&self, display: DisplayId) -> Option<StackId> {
		self.displays.get(&display)?.top_stack()
	}

	pub fn home_stack(&self, display: DisplayId) -> Option<StackId> {
		self.stack_matching(display, |s| s.is_home())
	}

	pub fn split_screen_primary(&self, display: DisplayId) -> Option<StackId> {
		self.stack_matching(display, |s| s.is_split_screen_primary())
	}

	pub fn pinned_stack(&self, display: DisplayId) -> Option<StackId> {
		self.stack_matching(display, |s| s.is_pinned())
	}

	fn stack_matching(&self, display: DisplayId, pred: impl Fn(&Stack) -> bool) -> Option<StackId> {
		let display = self.displays.get(&display)?;
		display.stacks.iter().rev().copied().find(|id| self.stacks.get(id).is_some_and(&pred))
	}

	pub fn stack_of_task(&self, task: TaskId) -> Option<StackId> {
		self.tasks.get(&task)?.stack
	}

	pub fn stack_of_record(&self, record: RecordId) -> Option<StackId> {
		self.stack_of_task(self.records.get(&record)?.task?)
	}

	pub fn display_of_stack(&self, stack: StackId) -> Option<DisplayId> {
		self.stacks.get(&stack)?.display
	}

	pub fn display_of_record(&self, record: RecordId) -> Option<DisplayId> {
		self.display_of_stack(self.stack_of_record(record)?)
	}

	pub fn is_home_stack(&self, stack: StackId) -> bool {
		self.stacks.get(&stack).is_some_and(Stack::is_home)
	}

	/// Builds an unattached record.
	pub fn create_record(&mut self, spec: RecordSpec) -> RecordId {
		let id = RecordId(self.next_record);
		self.next_record += 1;
		let record = ActivityRecord::new(id, spec);
		tracing::trace!(record = %id, component = %record.info.component, "hierarchy.create_record");
		self.records.insert(id, record);
		id
	}

	/// Drops a record that never got attached to a task.
	pub fn discard_record(&mut self, id: RecordId) -> Option<ActivityRecord> {
		match self.records.get(&id) {
			Some(r) if r.task.is_none() => self.records.remove(&id),
			_ => None,
		}
	}

	/// Creates a stack on `display`.
	pub fn create_stack(&mut self, display_id: DisplayId, mode: WindowingMode, activity_type: ActivityType, on_top: bool) -> Result<StackId> {
		let id = StackId(self.next_stack);
		let d = self.displays.get_mut(&display_id).ok_or(HierarchyError::UnknownDisplay(display_id))?;
		self.next_stack += 1;
		if on_top {
			d.stacks.push(id);
		} else {
			d.stacks.insert(0, id);
		}
		self.stacks.insert(id, Stack::new(id, display_id, mode, activity_type));
		tracing::debug!(stack = %id, display = %display_id, mode = mode.as_str(), ?activity_type, "hierarchy.create_stack");
		self.emit(HierarchyEvent::StackCreated { stack: id, display: display_id });
		Ok(id)
	}

	/// Returns an existing stack for `mode`/`activity_type`, or creates one.
	///
	/// Standard activities in fullscreen, freeform and split-screen-secondary
	/// always get a fresh stack.
	pub fn get_or_create_stack(&mut self, display: DisplayId, mode: WindowingMode, activity_type: ActivityType, on_top: bool) -> Result<StackId> {
		let mode = if mode == WindowingMode::Undefined { WindowingMode::Fullscreen } else { mode };
		let activity_type = if activity_type == ActivityType::Undefined {
			ActivityType::Standard
		} else {
			activity_type
		};
		let always_create = activity_type == ActivityType::Standard
			&& matches!(mode, WindowingMode::Fullscreen | WindowingMode::Freeform | WindowingMode::SplitScreenSecondary);
		if !always_create && let Some(existing) = self.stack_matching(display, |s| s.windowing_mode == mode && s.activity_type == activity_type) {
			return Ok(existing);
		}
		self.create_stack(display, mode, activity_type, on_top)
	}
}
