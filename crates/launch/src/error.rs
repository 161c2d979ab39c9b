use foyer_primitives::{DisplayId, TaskId};
use foyer_tasks::HierarchyError;

/// Caller or programmer errors raised by the launch resolver.
///
/// Policy denials never show up here; they are [`foyer_primitives::StartResult`] codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
	#[error("a start reason is required")]
	MissingReason,
	#[error("file descriptors passed in intent")]
	FileDescriptorsInIntent,
	#[error("launching into task {0} which has no base intent")]
	TaskWithoutBaseIntent(TaskId),
	#[error("{component} is single-task/instance but task {task} is rooted at another component")]
	SingleTaskIntoForeignTask { task: TaskId, component: String },
	#[error("{component} is single-task/instance but task {task} already has a root activity")]
	SingleTaskIntoRootedTask { task: TaskId, component: String },
	#[error("unknown display {0}")]
	UnknownDisplay(DisplayId),
	#[error(transparent)]
	Hierarchy(#[from] HierarchyError),
}

pub type Result<T> = std::result::Result<T, LaunchError>;
