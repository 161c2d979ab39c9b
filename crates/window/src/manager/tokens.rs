use foyer_primitives::{DisplayId, RecordId, ScreenOrientation, TaskId, TokenKey, WindowId};

use super::{UpdateFocus, WindowManager};
use crate::error::{Result, WindowError};
use crate::messages::WindowMessage;
use crate::state::SurfaceLifecycle;
use crate::token::{AppToken, TokenKind, WindowToken};

impl WindowManager {
	/// Registers the app token of an activity record, on top of the app order.
	pub fn add_app_token(&mut self, record: RecordId, task: Option<TaskId>, orientation: ScreenOrientation) -> TokenKey {
		let key = TokenKey::from(record);
		if self.tokens.contains_key(&key) {
			tracing::warn!(token = %key, "wm.tokens: app token already added");
			return key;
		}
		let mut app = AppToken::new(record, task);
		app.orientation = orientation;
		self.tokens.insert(key, WindowToken::new(key, TokenKind::App(Box::new(app)), true, DisplayId::DEFAULT));
		self.app_order.push(key);
		tracing::debug!(token = %key, ?task, "wm.tokens: app token added");
		key
	}

	/// Removes an app token. Windows still attached are torn down; those that
	/// animate out keep the token, marked exiting, until they finish.
	pub fn remove_app_token(&mut self, key: TokenKey) -> Result<()> {
		let Some(token) = self.tokens.get_mut(&key) else {
			return Err(WindowError::UnknownToken(key));
		};
		let Some(app) = token.kind.as_app_mut() else {
			return Err(WindowError::IllegalArgument("not an app token"));
		};
		app.removed = true;
		let freezing = std::mem::take(&mut app.freezing_screen);
		token.explicit = false;
		let windows = token.windows.clone();
		if freezing {
			self.freeze.apps_freezing = self.freeze.apps_freezing.saturating_sub(1);
		}
		for id in windows {
			let Some(win) = self.windows.get_mut(&id) else {
				continue;
			};
			if win.lifecycle == SurfaceLifecycle::Visible && self.env.transitions.start_exit_animation(id) {
				win.lifecycle = SurfaceLifecycle::AnimatingExit;
			}
			if win.lifecycle == SurfaceLifecycle::AnimatingExit {
				win.remove_on_exit = true;
			} else {
				self.remove_window_now(id);
			}
		}
		if self.tokens.get(&key).is_some_and(|t| t.is_empty()) {
			self.tokens.remove(&key);
		}
		self.app_order.retain(|k| *k != key);
		self.env.timers.cancel_where(&mut |m| *m == WindowMessage::WindowReplacementTimeout(key));
		if self.focus.focused_app == Some(key) {
			self.focus.focused_app = None;
			self.update_focused_window(UpdateFocus::Normal);
		}
		tracing::debug!(token = %key, "wm.tokens: app token removed");
		if freezing {
			self.stop_freezing_display();
		}
		Ok(())
	}

	/// An app window other than the starting window is on screen.
	pub fn is_app_drawn(&self, key: TokenKey) -> bool {
		self.tokens.get(&key).is_some_and(|t| t.kind.is_app() && self.app_has_drawn_window(t))
	}

	/// Restacks app tokens to follow `order`, bottom to top. Tokens missing
	/// from `order` keep their relative order below the listed ones.
	pub fn reorder_app_tokens(&mut self, order: &[TokenKey]) {
		let mut next: Vec<TokenKey> = self.app_order.iter().copied().filter(|k| !order.contains(k)).collect();
		next.extend(order.iter().copied().filter(|k| self.tokens.get(k).is_some_and(|t| t.kind.is_app())));
		if next == self.app_order {
			return;
		}
		self.app_order = next;
		tracing::trace!(tokens = self.app_order.len(), "wm.tokens: reordered");
		self.update_focused_window(UpdateFocus::WillAssignLayers);
		self.request_placement();
	}

	/// Shows or hides every window of an app token.
	pub fn set_app_visibility(&mut self, key: TokenKey, visible: bool) -> Result<()> {
		let Some(token) = self.tokens.get_mut(&key) else {
			return Err(WindowError::UnknownToken(key));
		};
		let display = token.display;
		let Some(app) = token.kind.as_app_mut() else {
			return Err(WindowError::IllegalArgument("not an app token"));
		};
		if app.hidden_requested == !visible {
			return Ok(());
		}
		app.hidden_requested = !visible;
		app.client_hidden = !visible;
		let windows = token.windows.clone();
		tracing::debug!(token = %key, visible, "wm.tokens: visibility");
		if !visible {
			for id in windows {
				self.hide_app_window(id);
			}
		}
		self.update_focused_window(UpdateFocus::Normal);
		self.compute_ime_target();
		self.request_placement();
		self.update_orientation_from_app_tokens(display);
		Ok(())
	}

	fn hide_app_window(&mut self, id: WindowId) {
		let Some(win) = self.windows.get_mut(&id) else {
			return;
		};
		if win.lifecycle != SurfaceLifecycle::Visible {
			return;
		}
		if self.env.transitions.start_exit_animation(id) {
			win.lifecycle = SurfaceLifecycle::AnimatingExit;
			return;
		}
		if let Some(surface) = win.surface.take() {
			if self.config.saved_surfaces {
				self.env.compositor.hide_surface(surface);
				win.saved_surface = Some(surface);
			} else {
				self.env.compositor.destroy_surface(surface);
			}
		}
		win.lifecycle = SurfaceLifecycle::AddedNotVisible;
	}

	/// Sets the focused app; windows above it no longer win focus.
	pub fn set_focused_app(&mut self, key: Option<TokenKey>, move_focus_now: bool) -> Result<()> {
		if let Some(key) = key
			&& !self.tokens.get(&key).is_some_and(|t| t.kind.is_app())
		{
			return Err(WindowError::UnknownToken(key));
		}
		if self.focus.focused_app == key {
			return Ok(());
		}
		self.focus.focused_app = key;
		tracing::debug!(app = ?key, move_focus_now, "wm.focus: focused app");
		if move_focus_now {
			self.update_focused_window(UpdateFocus::Normal);
		}
		Ok(())
	}

	/// Marks the app's windows as about to be replaced by a relaunch.
	pub fn set_will_replace_windows(&mut self, key: TokenKey) -> Result<()> {
		let Some(app) = self.tokens.get_mut(&key).and_then(|t| t.kind.as_app_mut()) else {
			return Err(WindowError::UnknownToken(key));
		};
		app.will_replace_windows = true;
		self.env.timers.cancel_where(&mut |m| *m == WindowMessage::WindowReplacementTimeout(key));
		self.env.timers.schedule(self.config.window_replacement_timeout(), WindowMessage::WindowReplacementTimeout(key));
		tracing::debug!(token = %key, "wm.tokens: windows will be replaced");
		Ok(())
	}

	/// A replacement window arrived: remove the windows it replaces.
	pub(crate) fn replace_old_windows(&mut self, key: TokenKey, replacement: WindowId) {
		let Some(token) = self.tokens.get_mut(&key) else {
			return;
		};
		let Some(app) = token.kind.as_app_mut() else {
			return;
		};
		if !std::mem::take(&mut app.will_replace_windows) {
			return;
		}
		let old: Vec<WindowId> = token.windows.iter().copied().filter(|w| *w != replacement).collect();
		self.env.timers.cancel_where(&mut |m| *m == WindowMessage::WindowReplacementTimeout(key));
		tracing::debug!(token = %key, replaced = old.len(), "wm.tokens: windows replaced");
		for id in old {
			if self.windows.get(&id).is_some_and(|w| w.attrs.ty != crate::types::WindowType::APPLICATION_STARTING) {
				self.remove_window_now(id);
			}
		}
	}

	/// Replacement never showed up; stop waiting.
	pub(crate) fn window_replacement_timeout(&mut self, key: TokenKey) {
		if let Some(app) = self.tokens.get_mut(&key).and_then(|t| t.kind.as_app_mut())
			&& std::mem::take(&mut app.will_replace_windows)
		{
			tracing::debug!(token = %key, "wm.tokens: replacement timed out");
			self.request_placement();
		}
	}

	pub fn set_app_orientation(&mut self, key: TokenKey, orientation: ScreenOrientation) -> Result<()> {
		let Some(token) = self.tokens.get_mut(&key) else {
			return Err(WindowError::UnknownToken(key));
		};
		let display = token.display;
		let Some(app) = token.kind.as_app_mut() else {
			return Err(WindowError::IllegalArgument("not an app token"));
		};
		app.orientation = orientation;
		self.update_orientation_from_app_tokens(display);
		Ok(())
	}

	/// The app's windows count towards the freeze until it stops freezing.
	pub fn start_app_freezing_screen(&mut self, key: TokenKey) -> Result<()> {
		let Some(app) = self.tokens.get_mut(&key).and_then(|t| t.kind.as_app_mut()) else {
			return Err(WindowError::UnknownToken(key));
		};
		if app.freezing_screen {
			return Ok(());
		}
		if !self.start_freezing_display() && !self.freeze.is_frozen() {
			tracing::debug!(token = %key, "wm.freeze: app freeze skipped");
			return Ok(());
		}
		if let Some(app) = self.tokens.get_mut(&key).and_then(|t| t.kind.as_app_mut()) {
			app.freezing_screen = true;
		}
		self.freeze.apps_freezing += 1;
		if self.freeze.apps_freezing == 1 {
			self.env.timers.schedule(self.config.app_freeze_timeout(), WindowMessage::AppFreezeTimeout);
		}
		Ok(())
	}

	pub fn stop_app_freezing_screen(&mut self, key: TokenKey) -> Result<()> {
		let Some(app) = self.tokens.get_mut(&key).and_then(|t| t.kind.as_app_mut()) else {
			return Err(WindowError::UnknownToken(key));
		};
		if !std::mem::take(&mut app.freezing_screen) {
			return Ok(());
		}
		self.freeze.apps_freezing = self.freeze.apps_freezing.saturating_sub(1);
		if self.freeze.apps_freezing == 0 {
			self.env.timers.cancel_where(&mut |m| *m == WindowMessage::AppFreezeTimeout);
		}
		self.stop_freezing_display();
		Ok(())
	}
}
