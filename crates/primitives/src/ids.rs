use std::fmt;

macro_rules! define_id {
	($(#[$meta:meta])* $name:ident($inner:ty), $prefix:literal) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(pub $inner);

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!($prefix, "{}"), self.0)
			}
		}
	};
}

define_id!(
	/// Process identifier of a client or caller.
	Pid(u32),
	""
);
define_id!(
	/// User (profile) identifier.
	UserId(u32),
	"u"
);
define_id!(
	/// Linux-style uid combining a user id and an application id.
	Uid(u32),
	""
);
define_id!(
	/// Task identifier; allocated in per-user ranges.
	TaskId(u32),
	"#"
);
define_id!(
	/// Stack identifier.
	StackId(u32),
	"stack#"
);
define_id!(
	/// Display identifier. [`DisplayId::DEFAULT`] always exists.
	DisplayId(u32),
	"display#"
);
define_id!(
	/// Token identifying one launchable component instance (activity record).
	RecordId(u64),
	"r"
);
define_id!(
	/// Binder identity of a window client. Keys the window table.
	ClientId(u64),
	"client#"
);
define_id!(
	/// Window session (one per client process connection).
	SessionId(u64),
	"session#"
);
define_id!(
	/// Binder identity of a window token.
	TokenKey(u64),
	"token#"
);
define_id!(
	/// Internal identity of a window state.
	WindowId(u64),
	"w"
);
define_id!(
	/// Active voice interaction session.
	VoiceSessionId(u64),
	"voice#"
);
define_id!(
	/// Pending intent / intent sender record.
	PendingIntentId(u64),
	"pi#"
);

impl UserId {
	/// The system (owner) user.
	pub const SYSTEM: UserId = UserId(0);
}

impl Uid {
	/// Width of the application-id range owned by each user.
	pub const PER_USER_RANGE: u32 = 100_000;
	/// Superuser.
	pub const ROOT: Uid = Uid(0);
	/// The system server.
	pub const SYSTEM: Uid = Uid(1000);
	/// The NFC service.
	pub const NFC: Uid = Uid(1027);
	/// First uid handed out to installed applications.
	pub const FIRST_APPLICATION: Uid = Uid(10_000);

	/// Builds the uid of `app_id` running as `user`.
	pub const fn of(user: UserId, app_id: u32) -> Self {
		Uid(user.0 * Self::PER_USER_RANGE + app_id % Self::PER_USER_RANGE)
	}

	/// Application id with the user component stripped.
	pub const fn app_id(self) -> u32 {
		self.0 % Self::PER_USER_RANGE
	}

	/// User this uid belongs to.
	pub const fn user_id(self) -> UserId {
		UserId(self.0 / Self::PER_USER_RANGE)
	}
}

impl DisplayId {
	/// The built-in display.
	pub const DEFAULT: DisplayId = DisplayId(0);
}

impl From<RecordId> for TokenKey {
	/// App window tokens are keyed by the record they belong to.
	fn from(id: RecordId) -> Self {
		TokenKey(id.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn uid_splits_into_user_and_app() {
		let uid = Uid::of(UserId(10), 10_057);
		assert_eq!(uid.0, 1_010_057);
		assert_eq!(uid.user_id(), UserId(10));
		assert_eq!(uid.app_id(), 10_057);
		assert_eq!(Uid::of(UserId(3), Uid::SYSTEM.0).app_id(), Uid::SYSTEM.0);
	}

	#[test]
	fn display_uses_prefix() {
		assert_eq!(TaskId(7).to_string(), "#7");
		assert_eq!(DisplayId::DEFAULT.to_string(), "display#0");
		assert_eq!(TokenKey::from(RecordId(42)), TokenKey(42));
	}
}
