use foyer_primitives::{DisplayId, StackId, Uid};

/// Root of one stack ordering.
#[derive(Debug, Clone)]
pub struct Display {
	pub id: DisplayId,
	/// Bottom to top.
	pub(crate) stacks: Vec<StackId>,
	/// Whether home activities may run here.
	pub supports_home: bool,
	/// Private displays only accept starts from their owner.
	pub owner_uid: Option<Uid>,
}

impl Display {
	pub(crate) fn new(id: DisplayId, supports_home: bool) -> Self {
		Self {
			id,
			stacks: Vec::new(),
			supports_home,
			owner_uid: None,
		}
	}

	/// Stacks bottom to top.
	pub fn stacks(&self) -> &[StackId] {
		&self.stacks
	}

	pub fn top_stack(&self) -> Option<StackId> {
		self.stacks.last().copied()
	}

	pub fn is_private(&self) -> bool {
		self.owner_uid.is_some()
	}

	pub(crate) fn position_of(&self, stack: StackId) -> Option<usize> {
		self.stacks.iter().position(|s| *s == stack)
	}
}
