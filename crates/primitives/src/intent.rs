//! Intent model.
//!
//! An [`Intent`] names what should be started and carries the launch flags
//! that steer task placement. Only the parts the launch core inspects are
//! modelled; payload extras are kept as an ordered string map.

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::ids::PendingIntentId;

/// Default action of a task root.
pub const ACTION_MAIN: &str = "android.intent.action.MAIN";
/// Generic view action.
pub const ACTION_VIEW: &str = "android.intent.action.VIEW";
/// Redirect target used when a package needs a permission review.
pub const ACTION_REVIEW_PERMISSIONS: &str = "android.intent.action.REVIEW_PERMISSIONS";
/// Installs an instant app package.
pub const ACTION_INSTALL_INSTANT_APP_PACKAGE: &str = "android.intent.action.INSTALL_INSTANT_APP_PACKAGE";
/// Resolves an instant app package.
pub const ACTION_RESOLVE_INSTANT_APP_PACKAGE: &str = "android.intent.action.RESOLVE_INSTANT_APP_PACKAGE";
/// Voice-interaction capable activities declare this category.
pub const CATEGORY_VOICE: &str = "android.intent.category.VOICE";
/// Home (launcher) activities declare this category.
pub const CATEGORY_HOME: &str = "android.intent.category.HOME";
/// Package whose start was redirected.
pub const EXTRA_PACKAGE_NAME: &str = "android.intent.extra.PACKAGE_NAME";
/// Intent sender that resumes the original start.
pub const EXTRA_INTENT: &str = "android.intent.extra.INTENT";
/// Whether the redirected start expects a result.
pub const EXTRA_RESULT_NEEDED: &str = "android.intent.extra.RESULT_NEEDED";

bitflags! {
	/// Launch flags carried by an [`Intent`]. Values match the platform ABI.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct IntentFlags: u32 {
		const LAUNCH_ADJACENT = 0x0000_1000;
		const RETAIN_IN_RECENTS = 0x0000_2000;
		const TASK_ON_HOME = 0x0000_4000;
		const CLEAR_TASK = 0x0000_8000;
		const NO_ANIMATION = 0x0001_0000;
		const REORDER_TO_FRONT = 0x0002_0000;
		const NO_USER_ACTION = 0x0004_0000;
		const NEW_DOCUMENT = 0x0008_0000;
		const LAUNCHED_FROM_HISTORY = 0x0010_0000;
		const RESET_TASK_IF_NEEDED = 0x0020_0000;
		const BROUGHT_TO_FRONT = 0x0040_0000;
		const EXCLUDE_FROM_RECENTS = 0x0080_0000;
		const PREVIOUS_IS_TOP = 0x0100_0000;
		const FORWARD_RESULT = 0x0200_0000;
		const CLEAR_TOP = 0x0400_0000;
		const MULTIPLE_TASK = 0x0800_0000;
		const NEW_TASK = 0x1000_0000;
		const SINGLE_TOP = 0x2000_0000;
		const NO_HISTORY = 0x4000_0000;
	}
}

impl IntentFlags {
	/// NEW_TASK together with CLEAR_TASK: the reused task is emptied first.
	pub const NEW_AND_CLEAR_TASK: IntentFlags = IntentFlags::NEW_TASK.union(IntentFlags::CLEAR_TASK);

	/// Returns `true` when a document launch should land in an existing task.
	pub fn is_document_launch_into_existing(self) -> bool {
		self.contains(IntentFlags::NEW_DOCUMENT) && !self.contains(IntentFlags::MULTIPLE_TASK)
	}

	/// Returns `true` when both NEW_TASK and CLEAR_TASK are set.
	pub fn clears_task(self) -> bool {
		self.contains(Self::NEW_AND_CLEAR_TASK)
	}
}

/// Fully qualified component name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentName {
	pub package: String,
	pub class: String,
}

impl ComponentName {
	pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
		Self {
			package: package.into(),
			class: class.into(),
		}
	}

	/// Flattens to `package/class`, abbreviating the class when it shares the package prefix.
	pub fn short_string(&self) -> String {
		match self.class.strip_prefix(self.package.as_str()) {
			Some(rest) if rest.starts_with('.') => format!("{}/{}", self.package, rest),
			_ => format!("{}/{}", self.package, self.class),
		}
	}
}

impl fmt::Display for ComponentName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.short_string())
	}
}

/// Value stored in [`Intent::extras`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraValue {
	Bool(bool),
	Int(i64),
	Str(String),
	/// Intent sender handle, used by redirects that resume the original start.
	Sender(PendingIntentId),
}

/// Description of a component start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
	pub action: Option<String>,
	pub data: Option<String>,
	pub mime_type: Option<String>,
	pub component: Option<ComponentName>,
	pub categories: SmallVec<[String; 2]>,
	pub flags: IntentFlags,
	pub extras: BTreeMap<String, ExtraValue>,
	/// Set when the caller attached file descriptors; rejected on the waiting start path.
	pub has_file_descriptors: bool,
}

impl Intent {
	pub fn new() -> Self {
		Self::default()
	}

	/// Explicit intent for `component`.
	pub fn for_component(component: ComponentName) -> Self {
		Self {
			component: Some(component),
			..Self::default()
		}
	}

	pub fn with_action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn with_data(mut self, data: impl Into<String>) -> Self {
		self.data = Some(data.into());
		self
	}

	pub fn with_flags(mut self, flags: IntentFlags) -> Self {
		self.flags = flags;
		self
	}

	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.add_category(category);
		self
	}

	pub fn add_flags(&mut self, flags: IntentFlags) {
		self.flags.insert(flags);
	}

	pub fn remove_flags(&mut self, flags: IntentFlags) {
		self.flags.remove(flags);
	}

	pub fn add_category(&mut self, category: impl Into<String>) {
		let category = category.into();
		if !self.has_category(&category) {
			self.categories.push(category);
		}
	}

	pub fn has_category(&self, category: &str) -> bool {
		self.categories.iter().any(|c| c == category)
	}

	pub fn put_extra(&mut self, key: impl Into<String>, value: ExtraValue) {
		self.extras.insert(key.into(), value);
	}

	/// Returns `true` when both intents match the same intent filter.
	///
	/// Compares action, data, type, component and the category set. Flags and
	/// extras never participate.
	pub fn filter_equals(&self, other: &Intent) -> bool {
		self.action == other.action
			&& self.data == other.data
			&& self.mime_type == other.mime_type
			&& self.component == other.component
			&& self.categories.len() == other.categories.len()
			&& self.categories.iter().all(|c| other.has_category(c))
	}

	/// Copy carrying only the filter-relevant fields (extras stripped).
	pub fn clone_filter(&self) -> Intent {
		Intent {
			action: self.action.clone(),
			data: self.data.clone(),
			mime_type: self.mime_type.clone(),
			component: self.component.clone(),
			categories: self.categories.clone(),
			flags: IntentFlags::empty(),
			extras: BTreeMap::new(),
			has_file_descriptors: false,
		}
	}
}

impl fmt::Display for Intent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		let mut sep = "";
		if let Some(action) = &self.action {
			write!(f, "act={action}")?;
			sep = " ";
		}
		if !self.categories.is_empty() {
			write!(f, "{sep}cat=[{}]", self.categories.join(","))?;
			sep = " ";
		}
		if let Some(data) = &self.data {
			write!(f, "{sep}dat={data}")?;
			sep = " ";
		}
		if !self.flags.is_empty() {
			write!(f, "{sep}flg={:#x}", self.flags.bits())?;
			sep = " ";
		}
		if let Some(component) = &self.component {
			write!(f, "{sep}cmp={component}")?;
		}
		f.write_str("}")
	}
}
