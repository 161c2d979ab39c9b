//! Resolved component descriptors.
//!
//! These mirror what the package resolver hands back for an intent. The
//! launch core treats them as read-only facts about the target.

use crate::ids::Uid;
use crate::intent::{ComponentName, Intent};
use crate::windowing::ScreenOrientation;

/// Manifest-declared instancing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LaunchMode {
	/// A new instance on every start.
	#[default]
	Multiple,
	/// Reuse the instance already on top of the target task.
	SingleTop,
	/// At most one instance, rooting its own task.
	SingleTask,
	/// At most one instance, alone in its task.
	SingleInstance,
}

/// Manifest-declared document (recents entry) policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocumentLaunchMode {
	#[default]
	None,
	IntoExisting,
	Always,
	Never,
}

/// Role of an activity or stack in the system UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActivityType {
	#[default]
	Undefined,
	Standard,
	Home,
	Recents,
	Assistant,
}

/// Application-level facts about the package hosting a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
	pub package: String,
	pub uid: Uid,
	pub target_sdk: u32,
	/// Heavy-weight application that cannot save its state.
	pub cant_save_state: bool,
}

impl ApplicationInfo {
	pub fn new(package: impl Into<String>, uid: Uid) -> Self {
		Self {
			package: package.into(),
			uid,
			target_sdk: ApplicationInfo::SDK_O,
			cant_save_state: false,
		}
	}

	/// First SDK level on which toasts require an explicit token.
	pub const SDK_O: u32 = 26;
}

/// Component-level facts about a resolved activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityInfo {
	pub component: ComponentName,
	pub application: ApplicationInfo,
	pub process_name: String,
	pub launch_mode: LaunchMode,
	pub document_launch_mode: DocumentLaunchMode,
	pub task_affinity: Option<String>,
	pub activity_type: ActivityType,
	pub resizeable: bool,
	pub supports_picture_in_picture: bool,
	/// Activity never shows UI (trampolines, resolvers).
	pub no_display: bool,
	pub screen_orientation: ScreenOrientation,
}

impl ActivityInfo {
	/// Standard activity with defaults derived from the application.
	pub fn new(component: ComponentName, application: ApplicationInfo) -> Self {
		Self {
			process_name: application.package.clone(),
			task_affinity: Some(application.package.clone()),
			component,
			application,
			launch_mode: LaunchMode::Multiple,
			document_launch_mode: DocumentLaunchMode::None,
			activity_type: ActivityType::Standard,
			resizeable: true,
			supports_picture_in_picture: false,
			no_display: false,
			screen_orientation: ScreenOrientation::Unspecified,
		}
	}

	pub fn with_launch_mode(mut self, mode: LaunchMode) -> Self {
		self.launch_mode = mode;
		self
	}

	pub fn with_document_launch_mode(mut self, mode: DocumentLaunchMode) -> Self {
		self.document_launch_mode = mode;
		self
	}

	pub fn with_activity_type(mut self, activity_type: ActivityType) -> Self {
		self.activity_type = activity_type;
		self
	}

	pub fn with_orientation(mut self, orientation: ScreenOrientation) -> Self {
		self.screen_orientation = orientation;
		self
	}

	pub fn package(&self) -> &str {
		&self.application.package
	}

	pub fn uid(&self) -> Uid {
		self.application.uid
	}
}

/// Instant-app resolution data returned alongside an auxiliary match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryResolveInfo {
	/// Installer component that finishes the instant-app flow.
	pub installer: ComponentName,
	/// Phase-two resolution must be requested before launching the installer.
	pub needs_phase_two: bool,
	/// Started by the installer when installation fails.
	pub failure_intent: Option<Intent>,
}

/// Result of resolving an intent against installed packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
	pub activity: ActivityInfo,
	/// Present when only an instant app matched.
	pub auxiliary: Option<AuxiliaryResolveInfo>,
}

impl ResolveInfo {
	pub fn new(activity: ActivityInfo) -> Self {
		Self { activity, auxiliary: None }
	}
}
