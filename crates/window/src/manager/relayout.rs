use foyer_primitives::{ClientId, Configuration, Rect, Size};

use super::{UpdateFocus, WindowManager};
use crate::collaborators::SurfaceHandle;
use crate::error::{Result, WindowError};
use crate::state::SurfaceLifecycle;
use crate::types::{LayoutParams, RelayoutFlags, ViewVisibility, WindowFlags};

/// What a relayout reports back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayoutResult {
	pub flags: RelayoutFlags,
	pub frame: Rect,
	/// Latest merged configuration, reported even when layout was skipped.
	pub config: Configuration,
	pub surface: Option<SurfaceHandle>,
}

impl WindowManager {
	/// Updates requested size, attributes and visibility of the client's
	/// window and returns its frame, surface and configuration.
	///
	/// The window type cannot change. A surface that cannot be allocated
	/// removes the window; the client then sees a result without surface.
	pub fn relayout_window(
		&mut self,
		client: ClientId,
		attrs: Option<LayoutParams>,
		requested: Size,
		visibility: ViewVisibility,
	) -> Result<RelayoutResult> {
		let id = self.try_client(client)?;
		let Some(win) = self.windows.get_mut(&id) else {
			return Err(WindowError::UnknownWindow(id));
		};
		let mut focus_may_change = false;
		let mut ime_may_change = false;
		if let Some(attrs) = attrs {
			if attrs.ty != win.attrs.ty {
				tracing::warn!(window = %id, from = %win.attrs.ty, to = %attrs.ty, "wm.relayout: type change rejected");
				return Err(WindowError::TypeChanged {
					from: win.attrs.ty,
					to: attrs.ty,
				});
			}
			let changed = attrs.flags ^ win.attrs.flags;
			focus_may_change |= changed.contains(WindowFlags::NOT_FOCUSABLE);
			ime_may_change |= changed.intersects(WindowFlags::NOT_FOCUSABLE | WindowFlags::ALT_FOCUSABLE_IM);
			win.attrs = attrs;
		}
		win.requested = requested;
		if win.view_visibility != visibility {
			focus_may_change = true;
			ime_may_change = true;
		}
		win.view_visibility = visibility;
		let display = win.display;
		let was_on_screen = win.is_on_screen();
		let mut flags = RelayoutFlags::empty();

		self.defer_surface_layout();
		if visibility.is_visible() {
			if !self.show_window_surface(id, &mut flags) {
				self.continue_surface_layout();
				let config = self.display_config(display);
				return Ok(RelayoutResult {
					flags,
					frame: Rect::EMPTY,
					config,
					surface: None,
				});
			}
		} else {
			self.hide_window_surface(id, &mut flags);
		}
		if self.windows.get(&id).is_some_and(|w| w.is_on_screen() != was_on_screen) {
			focus_may_change = true;
			ime_may_change = true;
		}

		if focus_may_change && self.update_focused_window(UpdateFocus::WillPlaceSurfaces) {
			ime_may_change = true;
		}
		if ime_may_change {
			self.compute_ime_target();
		}
		self.request_placement();
		self.continue_surface_layout();

		let config = self.display_config(display);
		if self.in_touch_mode {
			flags |= RelayoutFlags::IN_TOUCH_MODE;
		}
		let Some(win) = self.windows.get_mut(&id) else {
			return Err(WindowError::UnknownWindow(id));
		};
		win.relayout_called = true;
		if win.reported_config_seq != config.seq {
			flags |= RelayoutFlags::CONFIG_CHANGED;
			win.reported_config_seq = config.seq;
		}
		tracing::trace!(window = %id, ?flags, lifecycle = win.lifecycle.as_str(), "wm.relayout");
		Ok(RelayoutResult {
			flags,
			frame: win.frame,
			config,
			surface: win.surface,
		})
	}

	/// Visible path. Returns `false` when the window was removed because its
	/// surface could not be created.
	fn show_window_surface(&mut self, id: foyer_primitives::WindowId, flags: &mut RelayoutFlags) -> bool {
		let Some(win) = self.windows.get_mut(&id) else {
			return false;
		};
		match win.lifecycle {
			SurfaceLifecycle::Visible => return true,
			SurfaceLifecycle::AnimatingExit => {
				// Shown again before the exit animation finished.
				win.lifecycle = SurfaceLifecycle::Visible;
				win.remove_on_exit = false;
				return true;
			}
			SurfaceLifecycle::AddedNotVisible | SurfaceLifecycle::RelayoutPending | SurfaceLifecycle::Destroyed => {}
		}
		win.lifecycle = SurfaceLifecycle::RelayoutPending;
		*flags |= RelayoutFlags::FIRST_TIME;
		if let Some(saved) = win.saved_surface.take() {
			win.surface = Some(saved);
			win.lifecycle = SurfaceLifecycle::Visible;
			self.env.compositor.show_surface(saved);
			tracing::debug!(window = %id, surface = %saved, "wm.relayout: restored saved surface");
			return true;
		}
		let size = self.frame_size_for(id);
		let Some(win) = self.windows.get_mut(&id) else {
			return false;
		};
		let secure = win.attrs.flags.contains(WindowFlags::SECURE);
		match self.env.compositor.create_surface(id, size, secure) {
			Ok(surface) => {
				win.surface = Some(surface);
				win.lifecycle = SurfaceLifecycle::Visible;
				*flags |= RelayoutFlags::SURFACE_CHANGED;
				tracing::debug!(window = %id, surface = %surface, "wm.relayout: surface created");
				true
			}
			Err(err) => {
				tracing::warn!(window = %id, error = %err, "wm.relayout: surface allocation failed; removing window");
				self.remove_window_now(id);
				false
			}
		}
	}

	/// Invisible path: animate out, keep a saved surface, or release it.
	fn hide_window_surface(&mut self, id: foyer_primitives::WindowId, flags: &mut RelayoutFlags) {
		let Some(win) = self.windows.get(&id) else {
			return;
		};
		if win.lifecycle != SurfaceLifecycle::Visible {
			return;
		}
		let token = win.token;
		let app_hidden = self.tokens.get(&token).and_then(|t| t.kind.as_app()).is_some_and(|app| app.hidden_requested);
		if self.env.transitions.start_exit_animation(id) {
			if let Some(win) = self.windows.get_mut(&id) {
				win.lifecycle = SurfaceLifecycle::AnimatingExit;
			}
			tracing::debug!(window = %id, "wm.relayout: exit animation started");
			return;
		}
		let Some(win) = self.windows.get_mut(&id) else {
			return;
		};
		let Some(surface) = win.surface.take() else {
			return;
		};
		if self.config.saved_surfaces && app_hidden {
			self.env.compositor.hide_surface(surface);
			win.saved_surface = Some(surface);
			tracing::debug!(window = %id, surface = %surface, "wm.relayout: surface saved");
		} else {
			self.env.compositor.destroy_surface(surface);
			*flags |= RelayoutFlags::SURFACE_CHANGED;
			tracing::debug!(window = %id, surface = %surface, "wm.relayout: surface released");
		}
		win.lifecycle = SurfaceLifecycle::AddedNotVisible;
	}

	/// Requested size clamped to the display, or the full display when unset.
	pub(crate) fn frame_size_for(&self, id: foyer_primitives::WindowId) -> Size {
		let Some(win) = self.windows.get(&id) else {
			return Size::default();
		};
		let bounds = self.displays.get(&win.display).map(|d| d.size()).unwrap_or_default();
		let req = win.requested;
		if req.width <= 0 || req.height <= 0 {
			return bounds;
		}
		Size::new(req.width.min(bounds.width), req.height.min(bounds.height))
	}

	pub(crate) fn display_config(&self, display: foyer_primitives::DisplayId) -> Configuration {
		self.displays.get(&display).map(|d| d.config).unwrap_or_else(|| self.global_configuration())
	}
}
