#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Task & stack registry.
//!
//! Owns the three-level hierarchy the launch resolver mutates: displays hold
//! an ordered sequence of stacks, stacks hold an ordered sequence of tasks,
//! tasks hold an ordered sequence of activity records. Every ordered sequence
//! runs bottom to top, so the last element is the front-most.
//!
//! The registry never talks to the window side directly. Every change that
//! has a surface consequence is pushed as a [`HierarchyEvent`] and drained by
//! the owner with [`Hierarchy::take_events`].

mod display;
mod error;
mod events;
mod hierarchy;
#[cfg(test)]
mod invariants;
mod record;
mod stack;
mod task;
#[cfg(test)]
mod tests;

pub use display::Display;
pub use error::{HierarchyError, Result};
pub use events::HierarchyEvent;
pub use hierarchy::{FindTaskQuery, FindTaskResult, Hierarchy, LaunchStackQuery, StackPosition};
pub use record::{ActivityRecord, ActivityResult, LifecycleState, RESULT_CANCELED, RESULT_OK, RecordSpec};
pub use stack::Stack;
pub use task::{MAX_TASK_IDS_PER_USER, Task};
