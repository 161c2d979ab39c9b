use foyer_primitives::{ClientId, DisplayId, Rotation, ScreenOrientation};

use super::WindowManager;
use crate::error::Result;
use crate::freeze::WindowsFreezing;
use crate::messages::WindowMessage;

/// Client asking to hear about rotation changes of one display.
///
/// Watchers are weak: a failed callback or client death drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotationWatcher {
	pub client: ClientId,
	pub display: DisplayId,
}

impl WindowManager {
	/// Registers a watcher and returns the current rotation.
	pub fn watch_rotation(&mut self, client: ClientId, display: DisplayId) -> Rotation {
		let watcher = RotationWatcher { client, display };
		if !self.rotation_watchers.contains(&watcher) {
			self.rotation_watchers.push(watcher);
		}
		self.displays.get(&display).map(|d| d.rotation).unwrap_or_default()
	}

	pub fn remove_rotation_watcher(&mut self, client: ClientId) {
		self.remove_rotation_watchers_of(client);
	}

	pub(crate) fn remove_rotation_watchers_of(&mut self, client: ClientId) -> bool {
		let before = self.rotation_watchers.len();
		self.rotation_watchers.retain(|w| w.client != client);
		before != self.rotation_watchers.len()
	}

	pub fn rotation_watchers(&self) -> &[RotationWatcher] {
		&self.rotation_watchers
	}

	/// Holds rotation updates. Nests with [`resume_rotation`](Self::resume_rotation).
	pub fn pause_rotation(&mut self) {
		self.rotation_paused += 1;
	}

	pub fn resume_rotation(&mut self) {
		if self.rotation_paused == 0 {
			tracing::warn!("wm.rotation: resume without matching pause");
			return;
		}
		self.rotation_paused -= 1;
		if self.rotation_paused == 0 {
			self.run_pending_rotations();
		}
	}

	/// Orientation requested by the top-most visible app token. Recomputes
	/// rotation when it changed.
	pub fn update_orientation_from_app_tokens(&mut self, display_id: DisplayId) -> bool {
		let requested = self
			.app_order
			.iter()
			.rev()
			.filter_map(|k| self.tokens.get(k))
			.filter(|t| t.display == display_id)
			.filter_map(|t| t.kind.as_app())
			.filter(|app| !app.hidden_requested)
			.map(|app| app.orientation)
			.find(|o| !o.is_deferring())
			.unwrap_or(ScreenOrientation::Unspecified);
		let Some(content) = self.displays.get_mut(&display_id) else {
			return false;
		};
		if content.last_orientation == requested {
			return false;
		}
		tracing::debug!(display = %display_id, from = ?content.last_orientation, to = ?requested, "wm.rotation: orientation");
		content.last_orientation = requested;
		self.update_rotation_unchecked(display_id)
	}

	/// Applies the rotation policy picks for the display's orientation.
	///
	/// Deferred while the display is frozen, a seamless rotation runs, or
	/// rotation is paused; the deferred update runs once that clears.
	/// Returns `true` when the rotation changed.
	pub fn update_rotation_unchecked(&mut self, display_id: DisplayId) -> bool {
		let Some(content) = self.displays.get_mut(&display_id) else {
			return false;
		};
		if self.freeze.defers_rotation() || self.rotation_paused > 0 {
			content.pending_rotation_update = true;
			tracing::debug!(display = %display_id, "wm.rotation: deferred");
			return false;
		}
		content.pending_rotation_update = false;
		let from = content.rotation;
		let to = self.env.policy.rotation_for_orientation(content.last_orientation, from);
		if to == from {
			return false;
		}

		let seamless = self
			.windows_top_down(display_id)
			.into_iter()
			.filter_map(|id| self.windows.get(&id))
			.find(|w| w.is_on_screen())
			.is_some_and(|w| w.attrs.seamless_rotation);
		let on_screen: Vec<_> = self.windows.values().filter(|w| w.display == display_id && w.is_on_screen()).map(|w| w.id).collect();

		if seamless {
			for id in &on_screen {
				if let Some(win) = self.windows.get_mut(id) {
					win.seamlessly_rotated = true;
				}
			}
			self.freeze.begin_seamless(on_screen.len() as u32);
			self.env.timers.schedule(self.config.seamless_rotation_timeout(), WindowMessage::SeamlessRotationTimeout(display_id));
		} else if self.start_freezing_display() {
			self.freeze.windows_freezing = WindowsFreezing::Active;
			self.freeze.waiting_for_config = true;
			for id in &on_screen {
				if let Some(win) = self.windows.get_mut(id) {
					win.orientation_changing = true;
				}
			}
			self.env.timers.cancel_where(&mut |m| *m == WindowMessage::WindowFreezeTimeout(display_id));
			self.env.timers.schedule(self.config.window_freeze_timeout(), WindowMessage::WindowFreezeTimeout(display_id));
			self.env.transitions.start_rotation_animation(display_id, from, to);
		}

		if let Some(content) = self.displays.get_mut(&display_id) {
			content.rotation = to;
			content.recompute_config();
		}
		tracing::info!(display = %display_id, from = from.degrees(), to = to.degrees(), seamless, "wm.rotation: rotated");
		self.notify_rotation_watchers(display_id, to);
		self.request_placement();
		true
	}

	fn notify_rotation_watchers(&mut self, display: DisplayId, rotation: Rotation) {
		let watchers: Vec<RotationWatcher> = self.rotation_watchers.iter().copied().filter(|w| w.display == display).collect();
		for watcher in watchers {
			if self.env.clients.rotation_changed(watcher.client, rotation).is_err() {
				tracing::debug!(client = %watcher.client, "wm.rotation: dropping dead watcher");
				self.rotation_watchers.retain(|w| *w != watcher);
			}
		}
	}

	/// The client redrew after a rotation.
	pub fn finish_drawing(&mut self, client: ClientId) -> Result<()> {
		let id = self.try_client(client)?;
		let Some(win) = self.windows.get_mut(&id) else {
			return Ok(());
		};
		let display = win.display;
		let seamless = std::mem::take(&mut win.seamlessly_rotated);
		let changing = std::mem::take(&mut win.orientation_changing);
		if seamless || changing {
			self.window_stopped_rotating(display, seamless);
		}
		Ok(())
	}

	/// A seamlessly rotated window finished without redrawing.
	pub fn finish_seamless_rotation(&mut self, client: ClientId) -> Result<()> {
		let id = self.try_client(client)?;
		let Some(win) = self.windows.get_mut(&id) else {
			return Ok(());
		};
		let display = win.display;
		if std::mem::take(&mut win.seamlessly_rotated) {
			self.window_stopped_rotating(display, true);
		}
		Ok(())
	}

	/// A rotating window finished or went away.
	pub(crate) fn window_stopped_rotating(&mut self, display_id: DisplayId, seamless: bool) {
		if seamless {
			if self.freeze.seamless_window_done() {
				self.env.timers.cancel_where(&mut |m| *m == WindowMessage::SeamlessRotationTimeout(display_id));
				tracing::debug!(display = %display_id, "wm.rotation: seamless rotation done");
				self.run_pending_rotations();
			}
			return;
		}
		let still_changing = self.windows.values().any(|w| w.orientation_changing);
		if !still_changing && self.freeze.windows_freezing == WindowsFreezing::Active {
			self.freeze.windows_freezing = WindowsFreezing::None;
		}
		self.stop_freezing_display();
	}

	pub(crate) fn seamless_rotation_timeout(&mut self, display_id: DisplayId) {
		if !self.freeze.abandon_seamless() {
			return;
		}
		for win in self.windows.values_mut().filter(|w| w.display == display_id) {
			win.seamlessly_rotated = false;
		}
		tracing::warn!(display = %display_id, "wm.rotation: seamless rotation timed out");
		self.run_pending_rotations();
	}

	/// Re-runs rotation updates that arrived while they were deferred.
	pub(crate) fn run_pending_rotations(&mut self) {
		if self.freeze.defers_rotation() || self.rotation_paused > 0 {
			return;
		}
		let pending: Vec<DisplayId> = self.displays.values().filter(|d| d.pending_rotation_update).map(|d| d.id).collect();
		for display in pending {
			self.update_rotation_unchecked(display);
		}
	}
}
