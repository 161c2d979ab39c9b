use foyer_primitives::{DisplayId, Rect, Transit};

use super::WindowManager;
use crate::error::{Result, WindowError};

impl WindowManager {
	/// Holds surface placement until the matching
	/// [`continue_surface_layout`](Self::continue_surface_layout). Nests.
	pub fn defer_surface_layout(&mut self) {
		self.layout_deferred += 1;
	}

	/// Releases one deferral. Placement requested meanwhile runs once when
	/// the count returns to zero.
	pub fn continue_surface_layout(&mut self) {
		if self.layout_deferred == 0 {
			tracing::warn!("wm.layout: continue without matching defer");
			return;
		}
		self.layout_deferred -= 1;
		if self.layout_deferred == 0 && self.placement_requested {
			self.perform_surface_placement();
		}
	}

	pub fn layout_deferred(&self) -> u32 {
		self.layout_deferred
	}

	/// Completed placement passes.
	pub fn placements(&self) -> u64 {
		self.placements
	}

	/// Asks for a placement pass, immediately unless deferred.
	pub(crate) fn request_placement(&mut self) {
		self.placement_requested = true;
		if self.layout_deferred == 0 {
			self.perform_surface_placement();
		}
	}

	/// One placement pass inside a compositor transaction: layers, frames,
	/// resize reports.
	pub fn perform_surface_placement(&mut self) {
		if self.layout_deferred > 0 {
			self.placement_requested = true;
			return;
		}
		self.placement_requested = false;
		self.placements += 1;
		self.env.compositor.open_transaction();
		let displays: Vec<DisplayId> = self.displays.keys().copied().collect();
		for display in displays {
			self.assign_layers(display);
			self.layout_frames(display);
		}
		self.env.compositor.close_transaction();
		self.stop_freezing_display();
		tracing::trace!(pass = self.placements, "wm.layout: placed");
	}

	/// Layers from the z-order, bottom to top.
	pub(crate) fn assign_layers(&mut self, display: DisplayId) {
		let mut order = self.windows_top_down(display);
		order.reverse();
		for (i, id) in order.into_iter().enumerate() {
			let Some(win) = self.windows.get_mut(&id) else {
				continue;
			};
			let layer = (i as u32 + 1) * 5;
			if win.layer != layer {
				win.layer = layer;
				if let Some(surface) = win.surface {
					self.env.compositor.set_layer(surface, layer);
				}
			}
		}
	}

	/// Frames for visible windows; clients whose frame changed hear about it.
	fn layout_frames(&mut self, display: DisplayId) {
		let Some(content) = self.displays.get(&display) else {
			return;
		};
		let config = content.config;
		let ids: Vec<_> = self.windows.values().filter(|w| w.display == display && w.has_surface()).map(|w| w.id).collect();
		for id in ids {
			let size = self.frame_size_for(id);
			let Some(win) = self.windows.get_mut(&id) else {
				continue;
			};
			let frame = Rect::sized(size);
			if win.frame == frame && win.reported_config_seq == config.seq {
				continue;
			}
			let first = win.frame.is_empty();
			win.frame = frame;
			if first {
				continue;
			}
			win.reported_config_seq = config.seq;
			if self.env.clients.resized(win.client, frame, &config).is_err() {
				tracing::debug!(window = %id, "wm.layout: client gone during resize");
			}
		}
	}

	pub fn prepare_app_transition(&mut self, transit: Transit, always_keep_current: bool) {
		tracing::debug!(transit = transit.as_str(), always_keep_current, "wm.transition: prepare");
		self.env.transitions.prepare(transit, always_keep_current);
	}

	pub fn execute_app_transition(&mut self) -> Result<()> {
		if !self.env.transitions.is_transition_set() {
			return Err(WindowError::IllegalState("no app transition prepared"));
		}
		self.env.transitions.execute();
		self.request_placement();
		Ok(())
	}
}
