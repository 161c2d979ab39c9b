use foyer_primitives::{ClientId, TokenKey, WindowId};

use crate::types::WindowType;

/// Why an add was refused. Returned to the client as an `ADD_*` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AddWindowError {
	#[error("missing or mismatched app token")]
	BadAppToken,
	#[error("sub-window parent is not a window")]
	BadSubwindowToken,
	#[error("token is not an app token")]
	NotAppToken,
	#[error("app token is exiting")]
	AppExiting,
	#[error("client already has a window")]
	DuplicateAdd,
	#[error("starting window not needed")]
	StartingNotNeeded,
	#[error("singleton window type already present")]
	MultipleSingleton,
	#[error("permission denied")]
	PermissionDenied,
	#[error("display missing or not accessible")]
	InvalidDisplay,
	#[error("invalid window type")]
	InvalidType,
}

impl AddWindowError {
	pub const fn code(self) -> i32 {
		match self {
			Self::BadAppToken => -1,
			Self::BadSubwindowToken => -2,
			Self::NotAppToken => -3,
			Self::AppExiting => -4,
			Self::DuplicateAdd => -5,
			Self::StartingNotNeeded => -6,
			Self::MultipleSingleton => -7,
			Self::PermissionDenied => -8,
			Self::InvalidDisplay => -9,
			Self::InvalidType => -10,
		}
	}
}

/// `ADD_OKAY`.
pub const ADD_OKAY: i32 = 0;

/// Client-facing `ADD_*` code of an add result.
pub fn add_result_code<T>(result: &std::result::Result<T, AddWindowError>) -> i32 {
	match result {
		Ok(_) => ADD_OKAY,
		Err(err) => err.code(),
	}
}

/// Caller or programmer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
	#[error("unknown window for client {0}")]
	UnknownClient(ClientId),
	#[error("unknown window {0}")]
	UnknownWindow(WindowId),
	#[error("unknown token {0}")]
	UnknownToken(TokenKey),
	#[error("window type cannot change from {from} to {to}")]
	TypeChanged { from: WindowType, to: WindowType },
	#[error("illegal argument: {0}")]
	IllegalArgument(&'static str),
	#[error("illegal state: {0}")]
	IllegalState(&'static str),
}

pub type Result<T> = std::result::Result<T, WindowError>;

/// A compositor surface could not be created or updated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
	#[error("out of resources allocating surface for {0}")]
	OutOfResources(WindowId),
	#[error("compositor rejected surface for {window}: {reason}")]
	Rejected { window: WindowId, reason: String },
}
