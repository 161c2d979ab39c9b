/// Handle to one scheduled message.
///
/// Sequence numbers are never reused within a queue, so cancelling a token
/// whose message already fired or was superseded is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken {
	seq: u64,
}

impl TimerToken {
	pub(crate) const fn new(seq: u64) -> Self {
		Self { seq }
	}

	/// Position of the message in scheduling order, starting at 1.
	pub const fn seq(&self) -> u64 {
		self.seq
	}
}
