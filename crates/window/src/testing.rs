//! In-memory collaborators for window tests.
//!
//! [`FakeWindowSystem`] implements every collaborator trait over one shared
//! [`FakeWindowState`]. [`WindowHarness`] wires it to a [`WindowManager`]
//! with a manual clock and a booted screen.

use std::sync::Arc;
use std::time::Duration;

use foyer_primitives::{ClientId, Configuration, DisplayId, Pid, Rect, RecordId, Rotation, ScreenOrientation, SessionId, Size, TokenKey, Transit, Uid, WindowId};
use foyer_worker::{ManualClock, TimerToken};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::collaborators::{AppTransitionHost, ClientGone, Compositor, InputMonitor, LocalTimers, SurfaceHandle, WindowClients, WindowEnv, WindowPolicy, WindowTimers};
use crate::config::WindowConfig;
use crate::drag::DragEvent;
use crate::error::{AddWindowError, SurfaceError};
use crate::manager::{ClientIdentity, WindowManager};
use crate::messages::WindowMessage;
use crate::types::{LayoutParams, ViewVisibility, WindowType};

pub const APP_UID: Uid = Uid(10_050);
pub const SYSTEM_UID: Uid = Uid(1_000);

/// A client callback as seen by the fakes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
	Focus(ClientId, bool),
	Resized(ClientId, Rect, u64),
	Rotation(ClientId, Rotation),
	Drag(ClientId, DragEvent),
}

#[derive(Debug, Default)]
pub struct FakeWindowState {
	pub denied_types: FxHashSet<WindowType>,
	pub target_sdk: u32,
	pub screen_off: bool,
	pub animations_disabled: bool,
	pub boot_animation_running: bool,
	/// Orientation to rotation; unlisted orientations keep the last rotation.
	pub rotations: FxHashMap<ScreenOrientation, Rotation>,
	pub gc_requests: usize,

	pub next_surface: u64,
	pub live_surfaces: FxHashSet<SurfaceHandle>,
	pub hidden_surfaces: FxHashSet<SurfaceHandle>,
	pub fail_surfaces: bool,
	pub transactions_open: u32,
	pub transactions: u32,

	pub input_channels: FxHashSet<WindowId>,
	pub input_focus: Option<WindowId>,
	pub dispatch_frozen: bool,
	pub freeze_dispatch_calls: u32,
	pub touch_in_flight: bool,
	pub touch_transfers: Vec<(WindowId, WindowId)>,

	pub calls: Vec<ClientCall>,
	pub dead_clients: FxHashSet<ClientId>,

	pub transition_set: bool,
	pub prepared: Vec<Transit>,
	pub executed: u32,
	pub opening_apps: usize,
	pub exit_animations: bool,
	pub animating: Vec<WindowId>,
	pub rotation_animations: Vec<(DisplayId, Rotation, Rotation)>,
}

/// One lock-protected [`FakeWindowState`] behind every collaborator.
#[derive(Debug, Default, Clone)]
pub struct FakeWindowSystem {
	state: Arc<Mutex<FakeWindowState>>,
}

impl FakeWindowSystem {
	pub fn new() -> Self {
		let system = Self::default();
		system.lock().target_sdk = 30;
		system
	}

	pub fn lock(&self) -> MutexGuard<'_, FakeWindowState> {
		self.state.lock()
	}

	/// Focus callbacks in delivery order.
	pub fn focus_calls(&self) -> Vec<(ClientId, bool)> {
		self.lock()
			.calls
			.iter()
			.filter_map(|c| match c {
				ClientCall::Focus(client, gained) => Some((*client, *gained)),
				_ => None,
			})
			.collect()
	}

	pub fn take_calls(&self) -> Vec<ClientCall> {
		std::mem::take(&mut self.lock().calls)
	}

	fn call(&self, client: ClientId, call: ClientCall) -> Result<(), ClientGone> {
		let mut state = self.lock();
		if state.dead_clients.contains(&client) {
			return Err(ClientGone);
		}
		state.calls.push(call);
		Ok(())
	}
}

impl WindowPolicy for FakeWindowSystem {
	fn check_add_permission(&self, ty: WindowType, _uid: Uid, _package: &str) -> bool {
		!self.lock().denied_types.contains(&ty)
	}

	fn has_display_access(&self, _display: DisplayId, _uid: Uid) -> bool {
		true
	}

	fn target_sdk(&self, _package: &str, _uid: Uid) -> u32 {
		self.lock().target_sdk
	}

	fn rotation_for_orientation(&self, orientation: ScreenOrientation, last: Rotation) -> Rotation {
		self.lock().rotations.get(&orientation).copied().unwrap_or(last)
	}

	fn is_screen_on(&self) -> bool {
		!self.lock().screen_off
	}

	fn ok_to_animate(&self) -> bool {
		!self.lock().animations_disabled
	}

	fn is_boot_animation_complete(&self) -> bool {
		!self.lock().boot_animation_running
	}

	fn request_gc(&self) {
		self.lock().gc_requests += 1;
	}
}

impl Compositor for FakeWindowSystem {
	fn open_transaction(&mut self) {
		let mut state = self.lock();
		state.transactions_open += 1;
		state.transactions += 1;
	}

	fn close_transaction(&mut self) {
		let mut state = self.lock();
		state.transactions_open = state.transactions_open.saturating_sub(1);
	}

	fn create_surface(&mut self, window: WindowId, _size: Size, _secure: bool) -> Result<SurfaceHandle, SurfaceError> {
		let mut state = self.lock();
		if state.fail_surfaces {
			return Err(SurfaceError::OutOfResources(window));
		}
		state.next_surface += 1;
		let surface = SurfaceHandle(state.next_surface);
		state.live_surfaces.insert(surface);
		Ok(surface)
	}

	fn destroy_surface(&mut self, surface: SurfaceHandle) {
		let mut state = self.lock();
		state.live_surfaces.remove(&surface);
		state.hidden_surfaces.remove(&surface);
	}

	fn show_surface(&mut self, surface: SurfaceHandle) {
		self.lock().hidden_surfaces.remove(&surface);
	}

	fn hide_surface(&mut self, surface: SurfaceHandle) {
		self.lock().hidden_surfaces.insert(surface);
	}

	fn set_layer(&mut self, _surface: SurfaceHandle, _layer: u32) {}
}

impl InputMonitor for FakeWindowSystem {
	fn open_input_channel(&mut self, window: WindowId) {
		self.lock().input_channels.insert(window);
	}

	fn close_input_channel(&mut self, window: WindowId) {
		self.lock().input_channels.remove(&window);
	}

	fn set_focused_window(&mut self, window: Option<WindowId>) {
		self.lock().input_focus = window;
	}

	fn update_input_windows(&mut self) {}

	fn freeze_dispatch(&mut self) {
		let mut state = self.lock();
		state.dispatch_frozen = true;
		state.freeze_dispatch_calls += 1;
	}

	fn thaw_dispatch(&mut self) {
		self.lock().dispatch_frozen = false;
	}

	fn transfer_touch_focus(&mut self, from: WindowId, to: WindowId) -> bool {
		let mut state = self.lock();
		if !state.touch_in_flight {
			return false;
		}
		state.touch_transfers.push((from, to));
		true
	}
}

impl WindowClients for FakeWindowSystem {
	fn window_focus_changed(&mut self, client: ClientId, has_focus: bool) -> Result<(), ClientGone> {
		self.call(client, ClientCall::Focus(client, has_focus))
	}

	fn resized(&mut self, client: ClientId, frame: Rect, config: &Configuration) -> Result<(), ClientGone> {
		self.call(client, ClientCall::Resized(client, frame, config.seq))
	}

	fn rotation_changed(&mut self, watcher: ClientId, rotation: Rotation) -> Result<(), ClientGone> {
		self.call(watcher, ClientCall::Rotation(watcher, rotation))
	}

	fn dispatch_drag_event(&mut self, client: ClientId, event: &DragEvent) -> Result<(), ClientGone> {
		self.call(client, ClientCall::Drag(client, event.clone()))
	}
}

impl AppTransitionHost for FakeWindowSystem {
	fn is_transition_set(&self) -> bool {
		self.lock().transition_set
	}

	fn prepare(&mut self, transit: Transit, _always_keep_current: bool) {
		let mut state = self.lock();
		state.transition_set = true;
		state.prepared.push(transit);
	}

	fn execute(&mut self) {
		let mut state = self.lock();
		state.transition_set = false;
		state.executed += 1;
	}

	fn opening_apps(&self) -> usize {
		self.lock().opening_apps
	}

	fn start_exit_animation(&mut self, window: WindowId) -> bool {
		let mut state = self.lock();
		if state.exit_animations {
			state.animating.push(window);
		}
		state.exit_animations
	}

	fn start_rotation_animation(&mut self, display: DisplayId, from: Rotation, to: Rotation) {
		self.lock().rotation_animations.push((display, from, to));
	}
}

/// [`LocalTimers`] shared between the manager and the test driving it.
#[derive(Clone)]
pub struct SharedTimers(pub Arc<Mutex<LocalTimers>>);

impl WindowTimers for SharedTimers {
	fn now(&self) -> Duration {
		self.0.lock().now()
	}

	fn schedule(&mut self, delay: Duration, message: WindowMessage) -> TimerToken {
		self.0.lock().schedule(delay, message)
	}

	fn cancel(&mut self, token: TimerToken) {
		self.0.lock().cancel(token);
	}

	fn cancel_where(&mut self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> usize {
		self.0.lock().cancel_where(pred)
	}

	fn is_pending(&self, pred: &mut dyn FnMut(&WindowMessage) -> bool) -> bool {
		self.0.lock().is_pending(pred)
	}
}

/// Environment wired to `system` with timers on `clock`.
pub fn fake_env(system: &FakeWindowSystem, timers: SharedTimers) -> WindowEnv {
	WindowEnv {
		policy: Box::new(system.clone()),
		compositor: Box::new(system.clone()),
		input: Box::new(system.clone()),
		clients: Box::new(system.clone()),
		transitions: Box::new(system.clone()),
		timers: Box::new(timers),
	}
}

/// A window manager over fakes with the screen already enabled.
pub struct WindowHarness {
	pub system: FakeWindowSystem,
	pub clock: ManualClock,
	pub timers: SharedTimers,
	pub wm: WindowManager,
	next_client: u64,
}

impl WindowHarness {
	pub fn new() -> Self {
		Self::with_config(WindowConfig::default())
	}

	pub fn with_config(config: WindowConfig) -> Self {
		let mut harness = Self::unbooted(config);
		harness.wm.enable_screen_after_boot();
		harness
	}

	/// Screen not enabled yet; the boot timeout is armed.
	pub fn unbooted(config: WindowConfig) -> Self {
		let system = FakeWindowSystem::new();
		let clock = ManualClock::new();
		let timers = SharedTimers(Arc::new(Mutex::new(LocalTimers::new(Arc::new(clock.clone())))));
		let mut wm = WindowManager::new(config, fake_env(&system, timers.clone()));
		wm.arm_boot_timeout();
		Self {
			system,
			clock,
			timers,
			wm,
			next_client: 100,
		}
	}

	/// Fresh identity for a new client of `uid`.
	pub fn client(&mut self, uid: Uid) -> ClientIdentity {
		self.next_client += 1;
		let n = self.next_client;
		ClientIdentity {
			session: SessionId(n),
			client: ClientId(n),
			uid,
			pid: Pid(n as u32),
		}
	}

	/// Adds an app token for `record` and makes it visible.
	pub fn app_token(&mut self, record: u64) -> TokenKey {
		let key = self.wm.add_app_token(RecordId(record), None, ScreenOrientation::Unspecified);
		self.wm.set_app_visibility(key, true).expect("app token visible");
		key
	}

	/// Adds a window of `ty` and relayouts it visible.
	pub fn add_visible(&mut self, who: ClientIdentity, attrs: LayoutParams) -> Result<WindowId, AddWindowError> {
		let id = self.wm.add_window(who, attrs, ViewVisibility::Visible)?;
		self.wm
			.relayout_window(who.client, None, Size::new(0, 0), ViewVisibility::Visible)
			.expect("relayout after add");
		Ok(id)
	}

	/// Application window on `token` for a new client.
	pub fn app_window(&mut self, token: TokenKey) -> (ClientIdentity, WindowId) {
		let who = self.client(APP_UID);
		let id = self
			.add_visible(who, LayoutParams::new(WindowType::APPLICATION, "com.example.app").with_token(token))
			.expect("app window added");
		(who, id)
	}

	/// Advances the clock and fires every message that came due.
	pub fn advance(&mut self, by: Duration) -> Vec<WindowMessage> {
		self.clock.advance(by);
		let mut fired = Vec::new();
		loop {
			let due = self.timers.0.lock().drain_due();
			if due.is_empty() {
				break;
			}
			for message in due {
				self.wm.handle_message(message);
				fired.push(message);
			}
		}
		fired
	}

	pub fn pending(&self, mut pred: impl FnMut(&WindowMessage) -> bool) -> bool {
		self.timers.0.lock().is_pending(&mut pred)
	}
}

impl Default for WindowHarness {
	fn default() -> Self {
		Self::new()
	}
}
