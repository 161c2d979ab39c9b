//! The window manager proper.
//!
//! [`WindowManager`] is split across files by concern: `add.rs`,
//! `relayout.rs`, `remove.rs` (window lifecycle), `tokens.rs` (app tokens),
//! `focus.rs` (focus and input-method target), `layout.rs` (deferral and
//! placement), `rotation.rs` and `freeze.rs` (display rotation and freeze
//! sources), `drag.rs`, `boot.rs` and `dump.rs`.

mod add;
mod boot;
mod drag;
mod dump;
mod focus;
mod freeze;
mod layout;
mod relayout;
mod remove;
mod rotation;
mod tokens;

use foyer_primitives::{ClientId, Configuration, DisplayId, Pid, SessionId, Size, TokenKey, Uid, WindowId};
use rustc_hash::FxHashMap;

pub use self::add::{ClientIdentity, TOAST_TOKEN_REQUIRED_SDK};
pub use self::boot::BootState;
pub use self::focus::{FocusState, UpdateFocus};
pub use self::relayout::RelayoutResult;
pub use self::rotation::RotationWatcher;
use crate::collaborators::WindowEnv;
use crate::config::WindowConfig;
use crate::display::DisplayContent;
use crate::drag::DragState;
use crate::error::{Result, WindowError};
use crate::freeze::FreezeController;
use crate::messages::WindowMessage;
use crate::state::WindowState;
use crate::token::WindowToken;

/// Natural size of the default display when none is configured.
pub const DEFAULT_DISPLAY_SIZE: Size = Size::new(1080, 1920);
pub const DEFAULT_DENSITY_DPI: u32 = 420;

/// Windows, tokens and displays, plus the rotation/freeze controller.
///
/// The window table is keyed by client identity and is the only record of
/// which windows exist.
pub struct WindowManager {
	config: WindowConfig,
	env: WindowEnv,
	windows: FxHashMap<WindowId, WindowState>,
	by_client: FxHashMap<ClientId, WindowId>,
	tokens: FxHashMap<TokenKey, WindowToken>,
	/// App tokens bottom to top.
	app_order: Vec<TokenKey>,
	displays: FxHashMap<DisplayId, DisplayContent>,
	next_window: u64,
	focus: FocusState,
	freeze: FreezeController,
	rotation_watchers: Vec<RotationWatcher>,
	/// Rotation updates are held while this is non-zero.
	rotation_paused: u32,
	drag: Option<DragState>,
	next_drag: u64,
	boot: BootState,
	layout_deferred: u32,
	placement_requested: bool,
	placements: u64,
	in_touch_mode: bool,
	recents_requests: u64,
}

impl WindowManager {
	/// Manager with only the default display.
	pub fn new(config: WindowConfig, env: WindowEnv) -> Self {
		let mut displays = FxHashMap::default();
		displays.insert(DisplayId::DEFAULT, DisplayContent::new(DisplayId::DEFAULT, DEFAULT_DISPLAY_SIZE, DEFAULT_DENSITY_DPI));
		Self {
			config,
			env,
			windows: FxHashMap::default(),
			by_client: FxHashMap::default(),
			tokens: FxHashMap::default(),
			app_order: Vec::new(),
			displays,
			next_window: 1,
			focus: FocusState::default(),
			freeze: FreezeController::new(),
			rotation_watchers: Vec::new(),
			rotation_paused: 0,
			drag: None,
			next_drag: 1,
			boot: BootState::default(),
			layout_deferred: 0,
			placement_requested: false,
			placements: 0,
			in_touch_mode: true,
			recents_requests: 0,
		}
	}

	pub fn config(&self) -> &WindowConfig {
		&self.config
	}

	pub fn env(&self) -> &WindowEnv {
		&self.env
	}

	pub fn env_mut(&mut self) -> &mut WindowEnv {
		&mut self.env
	}

	pub fn window(&self, id: WindowId) -> Option<&WindowState> {
		self.windows.get(&id)
	}

	pub fn window_for_client(&self, client: ClientId) -> Option<&WindowState> {
		self.by_client.get(&client).and_then(|id| self.windows.get(id))
	}

	pub fn windows(&self) -> impl Iterator<Item = &WindowState> {
		self.windows.values()
	}

	pub fn token(&self, key: TokenKey) -> Option<&WindowToken> {
		self.tokens.get(&key)
	}

	pub fn display(&self, id: DisplayId) -> Option<&DisplayContent> {
		self.displays.get(&id)
	}

	pub fn freeze_state(&self) -> &FreezeController {
		&self.freeze
	}

	pub fn focus(&self) -> &FocusState {
		&self.focus
	}

	pub fn drag_state(&self) -> Option<&DragState> {
		self.drag.as_ref()
	}

	pub fn boot_state(&self) -> &BootState {
		&self.boot
	}

	pub fn is_display_frozen(&self) -> bool {
		self.freeze.is_frozen()
	}

	pub fn set_in_touch_mode(&mut self, in_touch_mode: bool) {
		self.in_touch_mode = in_touch_mode;
	}

	pub(crate) fn try_client(&self, client: ClientId) -> Result<WindowId> {
		self.by_client.get(&client).copied().ok_or(WindowError::UnknownClient(client))
	}

	/// Registers a secondary display. Private displays are only reachable by
	/// their owner.
	pub fn add_display(&mut self, id: DisplayId, base: Size, density_dpi: u32, owner_uid: Option<Uid>) {
		let mut display = DisplayContent::new(id, base, density_dpi);
		display.owner_uid = owner_uid;
		self.displays.insert(id, display);
		tracing::debug!(display = %id, ?base, "wm.display: added");
	}

	/// Removes a secondary display and every window on it.
	pub fn remove_display(&mut self, id: DisplayId) -> Result<()> {
		if id == DisplayId::DEFAULT {
			return Err(WindowError::IllegalArgument("the default display cannot be removed"));
		}
		let doomed: Vec<WindowId> = self.windows.values().filter(|w| w.display == id && w.parent.is_none()).map(|w| w.id).collect();
		for window in doomed {
			self.remove_window_now(window);
		}
		self.displays.remove(&id);
		Ok(())
	}

	/// Global configuration: that of the default display.
	pub fn global_configuration(&self) -> Configuration {
		self.displays.get(&DisplayId::DEFAULT).map(|d| d.config).unwrap_or_default()
	}

	/// Applies a configuration pushed from the activity side. This also
	/// acknowledges a rotation that is waiting for its new configuration.
	pub fn update_configuration(&mut self, config: Configuration) {
		if let Some(display) = self.displays.get_mut(&DisplayId::DEFAULT)
			&& config.differs_from(&display.config)
		{
			display.density_dpi = config.density_dpi;
			display.config = Configuration {
				seq: display.config.seq + 1,
				..config
			};
			let seq = display.config.seq;
			tracing::debug!(seq, "wm.config: updated");
			self.request_placement();
		}
		self.freeze.waiting_for_config = false;
		self.stop_freezing_display();
	}

	/// Any window of `uid` other than a toast is on screen.
	pub fn is_any_non_toast_window_visible_for_uid(&self, uid: Uid) -> bool {
		self.windows.values().any(|w| w.uid == uid && w.is_visible_non_toast())
	}

	pub fn show_recent_apps(&mut self) {
		self.recents_requests += 1;
		tracing::debug!(requests = self.recents_requests, "wm.recents: show requested");
	}

	/// Windows of `display` front-most first.
	pub(crate) fn windows_top_down(&self, display: DisplayId) -> Vec<WindowId> {
		let mut ids: Vec<(ZKey, WindowId)> = self.windows.values().filter(|w| w.display == display).map(|w| (self.z_key(w), w.id)).collect();
		ids.sort_unstable_by(|a, b| b.0.cmp(&a.0));
		ids.into_iter().map(|(_, id)| id).collect()
	}

	fn z_key(&self, w: &WindowState) -> ZKey {
		let (top, child) = match w.parent.and_then(|p| self.windows.get(&p)) {
			Some(parent) => (parent, 1 + w.attrs.ty.0.saturating_sub(crate::types::WindowType::FIRST_SUB_WINDOW)),
			None => (w, 0),
		};
		let rank = self.app_order.iter().position(|k| *k == top.token).unwrap_or(0);
		(top.attrs.ty.base_layer(), rank, top.seq, child, w.seq)
	}

	pub(crate) fn next_window_id(&mut self) -> (WindowId, u64) {
		let seq = self.next_window;
		self.next_window += 1;
		(WindowId(seq), seq)
	}

	/// Runs one delayed message.
	pub fn handle_message(&mut self, message: WindowMessage) {
		tracing::trace!(message = message.as_str(), "wm.message");
		match message {
			WindowMessage::HideToast(window) => self.hide_toast(window),
			WindowMessage::WindowFreezeTimeout(display) => self.window_freeze_timeout(display),
			WindowMessage::AppFreezeTimeout => self.app_freeze_timeout(),
			WindowMessage::SeamlessRotationTimeout(display) => self.seamless_rotation_timeout(display),
			WindowMessage::DragStartTimeout(token) => self.drag_start_timeout(token),
			WindowMessage::DragEndTimeout(token) => self.drag_end_timeout(token),
			WindowMessage::WindowReplacementTimeout(key) => self.window_replacement_timeout(key),
			WindowMessage::BootTimeout => self.boot_timeout(),
			WindowMessage::CheckBootAnimation => self.perform_enable_screen(),
			WindowMessage::ForceGc => self.env.policy.request_gc(),
		}
	}

	/// Identity of a new window's owner, for convenience in callers holding
	/// only raw ids.
	pub fn identity(session: SessionId, client: ClientId, uid: Uid, pid: Pid) -> ClientIdentity {
		ClientIdentity { session, client, uid, pid }
	}
}

/// `(base layer, app token rank, top-level seq, sub-window rank, seq)`.
type ZKey = (u32, usize, u64, u32, u64);
