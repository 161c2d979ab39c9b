use foyer_primitives::{DisplayId, RecordId, StackId, TaskId};

/// Structural change with a consequence on the window side.
///
/// Pushed by [`crate::Hierarchy`] mutations in the order they happen and
/// drained in one batch by whoever owns the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyEvent {
	StackCreated { stack: StackId, display: DisplayId },
	StackRemoved { stack: StackId, display: DisplayId },
	StackMovedToFront { stack: StackId, display: DisplayId },
	TaskCreated { task: TaskId, stack: StackId },
	TaskRemoved { task: TaskId },
	/// Task moved between stacks or changed position within its stack.
	TaskMoved { task: TaskId, stack: StackId },
	/// Record attached to a task; the window side should create an app token.
	RecordAttached { record: RecordId, task: TaskId },
	/// Record finished and left the hierarchy; its app token goes away.
	RecordRemoved { record: RecordId },
	RecordResumed { record: RecordId },
	VisibilityChanged { record: RecordId, visible: bool },
	NewIntent { record: RecordId },
}
