use foyer_primitives::{ClientId, DisplayId, Size, WindowId};

use super::WindowManager;
use crate::drag::{DragEvent, DragPhase, DragState, DragToken};
use crate::error::{Result, WindowError};
use crate::messages::WindowMessage;

impl WindowManager {
	/// Creates the drag surface for the client's window.
	///
	/// `None` when a drag is already in progress or the surface could not be
	/// allocated. The client must call [`perform_drag`](Self::perform_drag)
	/// before the start timeout.
	pub fn prepare_drag_surface(&mut self, client: ClientId, size: Size) -> Result<Option<DragToken>> {
		let source = self.try_client(client)?;
		if let Some(drag) = &self.drag {
			tracing::debug!(current = %drag.token, "wm.drag: already in progress");
			return Ok(None);
		}
		let surface = match self.env.compositor.create_surface(source, size, false) {
			Ok(surface) => surface,
			Err(err) => {
				tracing::warn!(window = %source, error = %err, "wm.drag: surface allocation failed");
				return Ok(None);
			}
		};
		let token = DragToken(self.next_drag);
		self.next_drag += 1;
		self.drag = Some(DragState {
			token,
			owner: client,
			source,
			surface,
			input_window: None,
			phase: DragPhase::Prepared,
			drop_target: None,
		});
		self.env.timers.schedule(self.config.drag_start_timeout(), WindowMessage::DragStartTimeout(token));
		tracing::debug!(token = %token, window = %source, "wm.drag: prepared");
		Ok(Some(token))
	}

	/// Starts a prepared drag by moving the touch stream to the drag input
	/// channel. Without a touch in flight the drag is cancelled.
	pub fn perform_drag(&mut self, client: ClientId, token: DragToken) -> Result<bool> {
		let source = match &self.drag {
			Some(d) if d.token == token && d.owner == client && d.phase == DragPhase::Prepared => d.source,
			_ => return Err(WindowError::IllegalState("no prepared drag for this client")),
		};
		self.env.timers.cancel_where(&mut |m| *m == WindowMessage::DragStartTimeout(token));
		let (input, _) = self.next_window_id();
		self.env.input.open_input_channel(input);
		if let Some(drag) = self.drag.as_mut() {
			drag.input_window = Some(input);
		}
		if !self.env.input.transfer_touch_focus(source, input) {
			tracing::debug!(token = %token, "wm.drag: no touch to transfer; cancelling");
			self.end_drag(false);
			return Ok(false);
		}
		if let Some(drag) = self.drag.as_mut() {
			drag.phase = DragPhase::Running;
		}
		let event = DragEvent::Started { token };
		let display = self.drag.as_ref().map_or(DisplayId::DEFAULT, |d| self.drag_display(d));
		for client in self.drag_participants(display) {
			let _ = self.env.clients.dispatch_drag_event(client, &event);
		}
		tracing::debug!(token = %token, "wm.drag: running");
		Ok(true)
	}

	/// Touch released at `(x, y)`. The top window under the point receives
	/// the drop and must report a result before the end timeout.
	pub fn drop_drag(&mut self, x: i32, y: i32) {
		let Some(drag) = self.drag.as_ref().filter(|d| d.phase == DragPhase::Running) else {
			return;
		};
		let token = drag.token;
		let display = self.drag_display(drag);
		let target = self.windows_top_down(display).into_iter().find(|id| {
			self.windows
				.get(id)
				.is_some_and(|w| w.is_on_screen() && x >= w.frame.left && x < w.frame.right && y >= w.frame.top && y < w.frame.bottom)
		});
		let Some(target) = target.and_then(|id| self.windows.get(&id)).map(|w| (w.id, w.client)) else {
			tracing::debug!(token = %token, x, y, "wm.drag: dropped on nothing");
			self.end_drag(false);
			return;
		};
		if let Some(drag) = self.drag.as_mut() {
			drag.phase = DragPhase::Dropped;
			drag.drop_target = Some(target.0);
		}
		if self.env.clients.dispatch_drag_event(target.1, &DragEvent::Drop { token, x, y }).is_err() {
			self.end_drag(false);
			return;
		}
		self.env.timers.schedule(self.config.drag_end_timeout(), WindowMessage::DragEndTimeout(token));
		tracing::debug!(token = %token, target = %target.0, "wm.drag: dropped");
	}

	/// Drop target reports whether it consumed the drop.
	pub fn report_drop_result(&mut self, client: ClientId, token: DragToken, consumed: bool) -> Result<()> {
		let Some(drag) = self.drag.as_ref() else {
			return Err(WindowError::IllegalState("no drag in progress"));
		};
		let target_client = drag.drop_target.and_then(|t| self.windows.get(&t)).map(|w| w.client);
		if drag.token != token || drag.phase != DragPhase::Dropped || target_client != Some(client) {
			return Err(WindowError::IllegalState("drop result from a window that is not the drop target"));
		}
		self.end_drag(consumed);
		Ok(())
	}

	/// Owner cancels its drag.
	pub fn cancel_drag(&mut self, client: ClientId, token: DragToken) -> Result<()> {
		if !self.drag.as_ref().is_some_and(|d| d.token == token && d.owner == client) {
			return Err(WindowError::IllegalState("no matching drag to cancel"));
		}
		tracing::debug!(token = %token, "wm.drag: cancelled");
		self.end_drag(false);
		Ok(())
	}

	pub(crate) fn drag_start_timeout(&mut self, token: DragToken) {
		if self.drag.as_ref().is_some_and(|d| d.token == token && d.phase == DragPhase::Prepared) {
			tracing::warn!(token = %token, "wm.drag: start timed out");
			self.end_drag(false);
		}
	}

	pub(crate) fn drag_end_timeout(&mut self, token: DragToken) {
		if self.drag.as_ref().is_some_and(|d| d.token == token) {
			tracing::warn!(token = %token, "wm.drag: end timed out");
			self.end_drag(false);
		}
	}

	/// Ends the current drag and releases its surface and input channel.
	pub(crate) fn end_drag(&mut self, result: bool) {
		let Some(drag) = self.drag.take() else {
			return;
		};
		let token = drag.token;
		let display = self.drag_display(&drag);
		self.env
			.timers
			.cancel_where(&mut |m| matches!(m, WindowMessage::DragStartTimeout(t) | WindowMessage::DragEndTimeout(t) if *t == token));
		self.env.compositor.destroy_surface(drag.surface);
		if let Some(input) = drag.input_window {
			self.env.input.close_input_channel(input);
		}
		if drag.phase != DragPhase::Prepared {
			let event = DragEvent::Ended { token, result };
			let mut notified = self.drag_participants(display);
			if !notified.contains(&drag.owner) {
				notified.push(drag.owner);
			}
			for client in notified {
				let _ = self.env.clients.dispatch_drag_event(client, &event);
			}
		}
		tracing::debug!(token = %token, result, phase = drag.phase.as_str(), "wm.drag: ended");
	}

	fn drag_display(&self, drag: &DragState) -> DisplayId {
		self.windows.get(&drag.source).map_or(DisplayId::DEFAULT, |w| w.display)
	}

	/// Clients of on-screen windows on `display`.
	fn drag_participants(&self, display: DisplayId) -> Vec<ClientId> {
		let ids: Vec<WindowId> = self.windows_top_down(display);
		ids.into_iter().filter_map(|id| self.windows.get(&id)).filter(|w| w.is_on_screen()).map(|w| w.client).collect()
	}
}
