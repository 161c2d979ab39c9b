use std::time::Duration;

use foyer_primitives::{ComponentName, RecordId, StackId, StartResult};
use foyer_tasks::{Hierarchy, LifecycleState};

/// What one start produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
	/// Internal result. `Aborted` stays distinguishable here.
	pub result: StartResult,
	/// The started record, or the existing record the start was folded into.
	pub record: Option<RecordId>,
	/// Stack that ended up hosting the record.
	pub stack: Option<StackId>,
}

impl LaunchOutcome {
	pub(crate) fn bare(result: StartResult) -> Self {
		Self { result, record: None, stack: None }
	}

	/// Result as reported to the caller.
	pub fn external(&self) -> StartResult {
		self.result.external()
	}

	/// Waiting callers should be told about this start.
	pub fn reports_to_waiters(&self) -> bool {
		!self.result.is_fatal_error()
	}

	/// Condition a waiting caller blocks on after this start.
	pub fn wait_condition(&self, h: &Hierarchy) -> WaitCondition {
		match (self.result, self.record) {
			(StartResult::Success, Some(record)) => WaitCondition::Launched(record),
			(StartResult::TaskToFront, Some(record)) => {
				let settled = h.record(record).is_some_and(|r| r.visible && r.is_state(LifecycleState::Resumed));
				if settled { WaitCondition::Settled } else { WaitCondition::Visible(record) }
			}
			_ => WaitCondition::Settled,
		}
	}
}

/// What a waiting start is still waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitCondition {
	/// Nothing: report immediately.
	Settled,
	/// The new record has to report that it launched (resumed).
	Launched(RecordId),
	/// The task brought to front has to become visible.
	Visible(RecordId),
}

impl WaitCondition {
	pub fn record(self) -> Option<RecordId> {
		match self {
			Self::Settled => None,
			Self::Launched(r) | Self::Visible(r) => Some(r),
		}
	}
}

/// Reported to a caller that waited for its start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
	pub result: StartResult,
	/// Component that ended up on screen.
	pub who: Option<ComponentName>,
	pub timed_out: bool,
	/// From the start to the wake-up; zero when nothing had to be waited for.
	pub total_time: Duration,
}
