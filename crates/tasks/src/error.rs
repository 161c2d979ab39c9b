use foyer_primitives::{DisplayId, RecordId, StackId, TaskId, UserId};

/// Hierarchy lookup and structural errors.
///
/// These are programmer errors from the caller's point of view: every id
/// handed to the registry should have come out of it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
	#[error("unknown display: {0}")]
	UnknownDisplay(DisplayId),
	#[error("unknown stack: {0}")]
	UnknownStack(StackId),
	#[error("unknown task: {0}")]
	UnknownTask(TaskId),
	#[error("unknown record: {0}")]
	UnknownRecord(RecordId),
	/// A pinned stack holds at most one task.
	#[error("pinned {0} already holds a task")]
	PinnedStackOccupied(StackId),
	#[error("task id {0} is already in use")]
	TaskIdInUse(TaskId),
	/// The user's task id range does not fit in a task id.
	#[error("no task id range for user {0}")]
	UserOutOfRange(UserId),
}

pub type Result<T> = std::result::Result<T, HierarchyError>;
