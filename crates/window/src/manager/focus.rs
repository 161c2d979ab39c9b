//! Focus and input-method target.
//!
//! Focus goes to the top-most on-screen window that can receive keys. When a
//! focused app is set, windows of app tokens ranked below it are never
//! chosen. Clients learn about focus asynchronously: every gain is reported
//! before any loss, and a window both gaining and losing gets no report.

use foyer_primitives::{DisplayId, TokenKey, WindowId};

use super::WindowManager;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
	pub current: Option<WindowId>,
	/// Focus as last reported to clients.
	pub last_reported: Option<WindowId>,
	/// Windows that lost focus but have not been told yet.
	pub losing: Vec<WindowId>,
	pub focused_app: Option<TokenKey>,
	pub ime_target: Option<WindowId>,
}

/// What the caller will do after a focus update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateFocus {
	Normal,
	/// Layers are assigned right after; skip the placement request.
	WillAssignLayers,
	/// Surfaces are placed right after.
	WillPlaceSurfaces,
}

impl WindowManager {
	/// Top-most focusable window on the default display.
	pub fn compute_focused_window(&self) -> Option<WindowId> {
		self.compute_focused_window_on(DisplayId::DEFAULT)
	}

	fn compute_focused_window_on(&self, display: DisplayId) -> Option<WindowId> {
		let focused_rank = self.focus.focused_app.and_then(|k| self.app_order.iter().position(|t| *t == k));
		for id in self.windows_top_down(display) {
			let Some(win) = self.windows.get(&id) else {
				continue;
			};
			if !win.is_on_screen() || !win.attrs.can_receive_keys() || win.attrs.ty.is_input_method() {
				continue;
			}
			if let Some(focused_rank) = focused_rank
				&& win.attrs.ty.is_application()
				&& let Some(rank) = self.app_order.iter().position(|t| *t == win.token)
				&& rank < focused_rank
			{
				tracing::trace!(window = %id, "wm.focus: below focused app");
				return None;
			}
			return Some(id);
		}
		None
	}

	/// Recomputes focus. Returns `true` when it changed.
	pub fn update_focused_window(&mut self, mode: UpdateFocus) -> bool {
		let next = self.compute_focused_window();
		let prev = self.focus.current;
		if next == prev {
			return false;
		}
		self.focus.current = next;
		if let Some(prev) = prev
			&& self.windows.contains_key(&prev)
		{
			self.focus.losing.push(prev);
		}
		tracing::debug!(from = ?prev, to = ?next, ?mode, "wm.focus: changed");
		self.env.input.set_focused_window(next);
		self.compute_ime_target();
		if mode == UpdateFocus::Normal {
			self.request_placement();
		}
		self.report_focus_change();
		true
	}

	/// Delivers pending focus callbacks: gain first, then losses.
	pub(crate) fn report_focus_change(&mut self) {
		let current = self.focus.current;
		let losing = std::mem::take(&mut self.focus.losing);
		if current != self.focus.last_reported
			&& let Some(id) = current
			&& let Some(win) = self.windows.get(&id)
		{
			let client = win.client;
			if self.env.clients.window_focus_changed(client, true).is_err() {
				tracing::debug!(client = %client, "wm.focus: client gone while gaining focus");
			}
		}
		self.focus.last_reported = current;
		for id in losing {
			if Some(id) == current {
				continue;
			}
			let Some(win) = self.windows.get(&id) else {
				continue;
			};
			let client = win.client;
			if self.env.clients.window_focus_changed(client, false).is_err() {
				tracing::debug!(client = %client, "wm.focus: client gone while losing focus");
			}
		}
	}

	/// Input-method target: the top-most on-screen window that may be one.
	pub fn compute_ime_target(&mut self) -> Option<WindowId> {
		let target = self.windows_top_down(DisplayId::DEFAULT).into_iter().find(|id| {
			self.windows
				.get(id)
				.is_some_and(|w| w.is_on_screen() && !w.attrs.ty.is_input_method() && w.attrs.can_be_ime_target())
		});
		if target != self.focus.ime_target {
			tracing::debug!(from = ?self.focus.ime_target, to = ?target, "wm.focus: ime target");
			self.focus.ime_target = target;
			self.env.input.update_input_windows();
		}
		target
	}
}
