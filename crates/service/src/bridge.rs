//! Glue between the task hierarchy and the window manager.
//!
//! The launch resolver sees the window side only as a
//! [`SurfaceHost`](foyer_launch::SurfaceHost); [`WindowSurface`] is that view
//! over the live [`WindowManager`]. Structural changes flow the other way
//! as [`HierarchyEvent`]s that [`apply_events`] turns into app-token calls.

use foyer_launch::SurfaceHost;
use foyer_primitives::{Configuration, ScreenOrientation, TokenKey, Transit, Uid};
use foyer_tasks::{Hierarchy, HierarchyEvent};
use foyer_window::WindowManager;

/// The window manager as seen by the launch resolver.
pub(crate) struct WindowSurface<'a>(pub(crate) &'a mut WindowManager);

impl SurfaceHost for WindowSurface<'_> {
	fn defer_surface_layout(&mut self) {
		self.0.defer_surface_layout();
	}

	fn continue_surface_layout(&mut self) {
		self.0.continue_surface_layout();
	}

	fn prepare_app_transition(&mut self, transit: Transit, always_keep_current: bool) {
		self.0.prepare_app_transition(transit, always_keep_current);
	}

	fn execute_app_transition(&mut self) {
		if let Err(err) = self.0.execute_app_transition() {
			tracing::debug!(%err, "service.bridge: nothing to execute");
		}
	}

	fn is_any_non_toast_window_visible_for_uid(&self, uid: Uid) -> bool {
		self.0.is_any_non_toast_window_visible_for_uid(uid)
	}

	fn show_recent_apps(&mut self) {
		self.0.show_recent_apps();
	}

	fn global_configuration(&self) -> Configuration {
		self.0.global_configuration()
	}

	fn update_configuration(&mut self, config: Configuration) {
		self.0.update_configuration(config);
	}
}

/// Replays hierarchy changes on the window side as one layout batch.
pub(crate) fn apply_events(h: &Hierarchy, wm: &mut WindowManager, events: Vec<HierarchyEvent>) {
	wm.defer_surface_layout();
	let mut restack = false;
	for event in events {
		tracing::trace!(?event, "service.bridge: event");
		match event {
			HierarchyEvent::RecordAttached { record, task } => {
				let orientation = h.record(record).map_or(ScreenOrientation::Unspecified, |r| r.info.screen_orientation);
				if wm.token(TokenKey::from(record)).is_none() {
					wm.add_app_token(record, Some(task), orientation);
				}
				restack = true;
			}
			HierarchyEvent::RecordRemoved { record } => {
				let key = TokenKey::from(record);
				if wm.token(key).is_some()
					&& let Err(err) = wm.remove_app_token(key)
				{
					tracing::warn!(token = %key, %err, "service.bridge: app token removal failed");
				}
			}
			HierarchyEvent::VisibilityChanged { record, visible } => {
				let key = TokenKey::from(record);
				if wm.token(key).is_some()
					&& let Err(err) = wm.set_app_visibility(key, visible)
				{
					tracing::warn!(token = %key, %err, "service.bridge: visibility update failed");
				}
			}
			HierarchyEvent::RecordResumed { record } => {
				let key = TokenKey::from(record);
				if wm.token(key).is_some()
					&& let Err(err) = wm.set_focused_app(Some(key), true)
				{
					tracing::warn!(token = %key, %err, "service.bridge: focused app update failed");
				}
			}
			HierarchyEvent::TaskMoved { .. } | HierarchyEvent::StackMovedToFront { .. } | HierarchyEvent::TaskRemoved { .. } | HierarchyEvent::StackRemoved { .. } => {
				restack = true;
			}
			HierarchyEvent::StackCreated { .. } | HierarchyEvent::TaskCreated { .. } | HierarchyEvent::NewIntent { .. } => {}
		}
	}
	if restack {
		wm.reorder_app_tokens(&app_token_order(h));
	}
	wm.continue_surface_layout();
}

/// App tokens of every record, bottom to top across displays.
pub(crate) fn app_token_order(h: &Hierarchy) -> Vec<TokenKey> {
	let mut order = Vec::new();
	for display in h.display_ids() {
		let Some(d) = h.display(*display) else {
			continue;
		};
		for stack in d.stacks() {
			let Some(s) = h.stack(*stack) else {
				continue;
			};
			for task in s.tasks() {
				if let Some(t) = h.task(*task) {
					order.extend(t.activities().iter().map(|r| TokenKey::from(*r)));
				}
			}
		}
	}
	order
}
