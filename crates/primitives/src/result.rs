//! Start result codes.
//!
//! Codes are partitioned into three ranges exactly like the platform ABI:
//! fatal errors (-100..=-1), successes (0..=99) and non-fatal errors
//! (100..=199). [`StartResult::Aborted`] is internal-only: callers across the
//! process boundary see it as [`StartResult::Success`] through
//! [`StartResult::external`], while the resolver keeps the distinction for
//! post-processing.

use std::fmt;

/// Outcome of one start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartResult {
	IntentNotResolved,
	ClassNotFound,
	ForwardAndRequestConflict,
	PermissionDenied,
	Canceled,
	NotVoiceCompatible,
	Success,
	ReturnIntentToCaller,
	TaskToFront,
	DeliveredToTop,
	SwitchesCanceled,
	ReturnLockTaskModeViolation,
	Aborted,
}

const FIRST_FATAL: i32 = -100;
const LAST_FATAL: i32 = -1;
const FIRST_SUCCESS: i32 = 0;
const LAST_SUCCESS: i32 = 99;

impl StartResult {
	/// Every code, in ABI order.
	pub const ALL: [StartResult; 13] = [
		StartResult::NotVoiceCompatible,
		StartResult::Canceled,
		StartResult::PermissionDenied,
		StartResult::ForwardAndRequestConflict,
		StartResult::ClassNotFound,
		StartResult::IntentNotResolved,
		StartResult::Success,
		StartResult::ReturnIntentToCaller,
		StartResult::TaskToFront,
		StartResult::DeliveredToTop,
		StartResult::SwitchesCanceled,
		StartResult::ReturnLockTaskModeViolation,
		StartResult::Aborted,
	];

	/// Platform integer for this code.
	pub const fn code(self) -> i32 {
		match self {
			Self::NotVoiceCompatible => -97,
			Self::Canceled => -96,
			Self::PermissionDenied => -94,
			Self::ForwardAndRequestConflict => -93,
			Self::ClassNotFound => -92,
			Self::IntentNotResolved => -91,
			Self::Success => 0,
			Self::ReturnIntentToCaller => 1,
			Self::TaskToFront => 2,
			Self::DeliveredToTop => 3,
			Self::SwitchesCanceled => 100,
			Self::ReturnLockTaskModeViolation => 101,
			Self::Aborted => 102,
		}
	}

	/// Inverse of [`Self::code`].
	pub fn from_code(code: i32) -> Option<Self> {
		Self::ALL.into_iter().find(|r| r.code() == code)
	}

	/// Result as reported across the client boundary.
	///
	/// Aborted starts pretend to have succeeded; everything else passes through.
	pub const fn external(self) -> Self {
		match self {
			Self::Aborted => Self::Success,
			other => other,
		}
	}

	/// Returns `true` for codes in the success range.
	pub const fn is_successful(self) -> bool {
		let code = self.code();
		FIRST_SUCCESS <= code && code <= LAST_SUCCESS
	}

	/// Returns `true` for codes in the fatal-error range.
	pub const fn is_fatal_error(self) -> bool {
		let code = self.code();
		FIRST_FATAL <= code && code <= LAST_FATAL
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::IntentNotResolved => "INTENT_NOT_RESOLVED",
			Self::ClassNotFound => "CLASS_NOT_FOUND",
			Self::ForwardAndRequestConflict => "FORWARD_AND_REQUEST_CONFLICT",
			Self::PermissionDenied => "PERMISSION_DENIED",
			Self::Canceled => "CANCELED",
			Self::NotVoiceCompatible => "NOT_VOICE_COMPATIBLE",
			Self::Success => "SUCCESS",
			Self::ReturnIntentToCaller => "RETURN_INTENT_TO_CALLER",
			Self::TaskToFront => "TASK_TO_FRONT",
			Self::DeliveredToTop => "DELIVERED_TO_TOP",
			Self::SwitchesCanceled => "SWITCHES_CANCELED",
			Self::ReturnLockTaskModeViolation => "RETURN_LOCK_TASK_MODE_VIOLATION",
			Self::Aborted => "ABORTED",
		}
	}
}

impl fmt::Display for StartResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn any_result() -> impl Strategy<Value = StartResult> {
		proptest::sample::select(StartResult::ALL.to_vec())
	}

	#[test]
	fn aborted_is_success_externally() {
		assert_eq!(StartResult::Aborted.external(), StartResult::Success);
		assert!(!StartResult::Aborted.is_successful());
	}

	#[test]
	fn ranges_partition_codes() {
		assert!(StartResult::IntentNotResolved.is_fatal_error());
		assert!(StartResult::NotVoiceCompatible.is_fatal_error());
		assert!(StartResult::DeliveredToTop.is_successful());
		assert!(!StartResult::SwitchesCanceled.is_successful());
		assert!(!StartResult::SwitchesCanceled.is_fatal_error());
	}

	proptest! {
		/// Only `Aborted` is remapped at the boundary.
		#[test]
		fn prop_external_is_identity_except_aborted(result in any_result()) {
			if result == StartResult::Aborted {
				prop_assert_eq!(result.external(), StartResult::Success);
			} else {
				prop_assert_eq!(result.external(), result);
			}
		}

		#[test]
		fn prop_code_round_trips(result in any_result()) {
			prop_assert_eq!(StartResult::from_code(result.code()), Some(result));
		}
	}
}
