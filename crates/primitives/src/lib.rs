#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Core vocabulary shared by the launch resolver and the window state machine.
//!
//! Nothing in this crate owns state. It defines the identifiers, intent
//! model, component descriptors and result codes that flow across the seams
//! between `foyer-tasks`, `foyer-launch`, `foyer-window` and `foyer-service`.

/// Component, application and resolution descriptors.
pub mod component;
/// Global configuration snapshots.
pub mod configuration;
/// Rectangles and sizes.
pub mod geometry;
/// Identifier types for processes, users, tasks, stacks, displays and windows.
pub mod ids;
/// Intent model and launch flags.
pub mod intent;
/// Start result codes and their external mapping.
pub mod result;
/// Windowing modes, rotations and orientation requests.
pub mod windowing;

pub use component::{ActivityInfo, ActivityType, ApplicationInfo, AuxiliaryResolveInfo, DocumentLaunchMode, LaunchMode, ResolveInfo};
pub use configuration::Configuration;
pub use geometry::{Rect, Size};
pub use ids::{ClientId, DisplayId, PendingIntentId, Pid, RecordId, SessionId, StackId, TaskId, TokenKey, Uid, UserId, VoiceSessionId, WindowId};
pub use intent::{ComponentName, ExtraValue, Intent, IntentFlags};
pub use result::StartResult;
pub use windowing::{Rotation, ScreenOrientation, Transit, WindowingMode};
