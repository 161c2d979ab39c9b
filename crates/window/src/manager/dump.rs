use std::fmt::Write;

use super::WindowManager;

impl WindowManager {
	/// Writes displays, tokens, windows and controller state.
	pub fn dump(&self, out: &mut String) {
		let _ = writeln!(out, "WINDOW MANAGER (windows: {}, tokens: {})", self.windows.len(), self.tokens.len());
		let mut displays: Vec<_> = self.displays.values().collect();
		displays.sort_unstable_by_key(|d| d.id);
		for d in displays {
			let _ = writeln!(
				out,
				"  Display {} size={}x{} rotation={} orientation={:?} dpi={} config_seq={} pending_rotation={}",
				d.id,
				d.size().width,
				d.size().height,
				d.rotation.degrees(),
				d.last_orientation,
				d.density_dpi,
				d.config.seq,
				d.pending_rotation_update
			);
			for id in self.windows_top_down(d.id) {
				let Some(w) = self.windows.get(&id) else {
					continue;
				};
				let _ = writeln!(
					out,
					"    Window {} {} client={} uid={} token={} state={} layer={} frame={:?} surface={:?} parent={:?}",
					w.id,
					w.attrs.ty,
					w.client,
					w.uid,
					w.token,
					w.lifecycle.as_str(),
					w.layer,
					(w.frame.left, w.frame.top, w.frame.right, w.frame.bottom),
					w.surface.map(|s| s.0),
					w.parent.map(|p| p.0)
				);
			}
		}
		for key in self.app_order.iter().rev() {
			let Some(token) = self.tokens.get(key) else {
				continue;
			};
			if let Some(app) = token.kind.as_app() {
				let _ = writeln!(
					out,
					"  AppToken {} record={} hidden={} replacing={} removed={} freezing={} windows={}",
					token.key,
					app.record,
					app.hidden_requested,
					app.will_replace_windows,
					app.removed,
					app.freezing_screen,
					token.windows.len()
				);
			}
		}
		let _ = writeln!(
			out,
			"  Focus current={:?} app={:?} ime={:?}",
			self.focus.current.map(|w| w.0),
			self.focus.focused_app.map(|k| k.0),
			self.focus.ime_target.map(|w| w.0)
		);
		let f = &self.freeze;
		let _ = writeln!(
			out,
			"  Freeze frozen={} waiting_for_config={} apps={} windows={:?} client={} seamless={} freezes={}",
			f.is_frozen(),
			f.waiting_for_config,
			f.apps_freezing,
			f.windows_freezing,
			f.client_freezing,
			f.seamless_pending(),
			f.freezes()
		);
		let _ = writeln!(
			out,
			"  Layout deferred={} placements={} rotation_paused={} watchers={}",
			self.layout_deferred,
			self.placements,
			self.rotation_paused,
			self.rotation_watchers.len()
		);
		if let Some(drag) = &self.drag {
			let _ = writeln!(out, "  Drag {} owner={} phase={}", drag.token, drag.owner, drag.phase.as_str());
		}
		let b = &self.boot;
		let _ = writeln!(
			out,
			"  Boot booted={} enabled={} forced={} polls={}",
			b.system_booted,
			b.display_enabled,
			b.force_enabled,
			b.polls
		);
	}
}
