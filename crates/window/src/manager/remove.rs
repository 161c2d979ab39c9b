use foyer_primitives::{ClientId, SessionId, WindowId};

use super::{UpdateFocus, WindowManager};
use crate::error::Result;
use crate::messages::WindowMessage;
use crate::state::SurfaceLifecycle;
use crate::types::WindowType;

impl WindowManager {
	/// Removes the client's window. While an exit animation runs the window
	/// stays until [`exit_animation_finished`](Self::exit_animation_finished).
	pub fn remove_window(&mut self, client: ClientId) -> Result<()> {
		let id = self.try_client(client)?;
		let Some(win) = self.windows.get_mut(&id) else {
			return Ok(());
		};
		if win.lifecycle == SurfaceLifecycle::Visible && self.env.transitions.start_exit_animation(id) {
			win.lifecycle = SurfaceLifecycle::AnimatingExit;
		}
		if win.lifecycle == SurfaceLifecycle::AnimatingExit {
			win.remove_on_exit = true;
			tracing::debug!(window = %id, "wm.remove: deferred until exit animation ends");
			return Ok(());
		}
		self.remove_window_now(id);
		Ok(())
	}

	/// Animation callback: finishes a deferred removal or releases the
	/// surface of a window that was hidden.
	pub fn exit_animation_finished(&mut self, id: WindowId) {
		let Some(win) = self.windows.get_mut(&id) else {
			return;
		};
		if win.lifecycle != SurfaceLifecycle::AnimatingExit {
			return;
		}
		if win.remove_on_exit {
			self.remove_window_now(id);
			return;
		}
		if let Some(surface) = win.surface.take() {
			self.env.compositor.destroy_surface(surface);
		}
		win.lifecycle = SurfaceLifecycle::AddedNotVisible;
		tracing::debug!(window = %id, "wm.remove: exit animation finished");
		self.request_placement();
	}

	/// Tears a window down immediately, children first.
	pub(crate) fn remove_window_now(&mut self, id: WindowId) {
		let Some(mut win) = self.windows.remove(&id) else {
			return;
		};
		for child in std::mem::take(&mut win.children) {
			self.remove_window_now(child);
		}
		self.by_client.remove(&win.client);
		self.env.input.close_input_channel(id);
		for surface in [win.surface.take(), win.saved_surface.take()].into_iter().flatten() {
			self.env.compositor.destroy_surface(surface);
		}
		win.lifecycle = SurfaceLifecycle::Destroyed;

		if let Some(parent) = win.parent.and_then(|p| self.windows.get_mut(&p)) {
			parent.children.retain(|c| *c != id);
		}
		let mut drop_token = false;
		if let Some(token) = self.tokens.get_mut(&win.token) {
			token.windows.retain(|w| *w != id);
			if let Some(app) = token.kind.as_app_mut()
				&& app.starting_window == Some(id)
			{
				app.starting_window = None;
			}
			drop_token = !token.explicit && token.is_empty();
		}
		if drop_token {
			self.tokens.remove(&win.token);
		}
		if win.attrs.ty == WindowType::TOAST {
			self.env.timers.cancel_where(&mut |m| *m == WindowMessage::HideToast(id));
		}
		if win.orientation_changing || win.seamlessly_rotated {
			self.window_stopped_rotating(win.display, win.seamlessly_rotated);
		}
		if self.drag.as_ref().is_some_and(|d| d.source == id) {
			self.end_drag(false);
		}
		self.focus.losing.retain(|w| *w != id);
		if self.focus.ime_target == Some(id) {
			self.focus.ime_target = None;
		}
		tracing::debug!(window = %id, client = %win.client, ty = %win.attrs.ty, "wm.remove: removed");

		if self.focus.current == Some(id) {
			self.update_focused_window(UpdateFocus::Normal);
		}
		self.compute_ime_target();
		self.env.input.update_input_windows();
		self.request_placement();
		self.update_orientation_from_app_tokens(win.display);
	}

	/// Client process death removes its window and its rotation watchers.
	pub fn client_died(&mut self, client: ClientId) {
		let had_watchers = self.remove_rotation_watchers_of(client);
		let window = self.by_client.get(&client).copied();
		tracing::debug!(client = %client, ?window, had_watchers, "wm.client_died");
		if let Some(id) = window {
			self.remove_window_now(id);
		}
	}

	/// Session death removes every window opened through it.
	pub fn session_died(&mut self, session: SessionId) {
		let doomed: Vec<ClientId> = self.windows.values().filter(|w| w.session == session && w.parent.is_none()).map(|w| w.client).collect();
		tracing::debug!(session = %session, windows = doomed.len(), "wm.session_died");
		for client in doomed {
			self.client_died(client);
		}
	}

	/// Toast timeout: the toast goes away even if its client never removes it.
	pub(crate) fn hide_toast(&mut self, id: WindowId) {
		let Some(win) = self.windows.get(&id) else {
			return;
		};
		if win.attrs.ty != WindowType::TOAST {
			return;
		}
		tracing::debug!(window = %id, "wm.toast: hide timeout");
		self.remove_window_now(id);
	}
}
