use foyer_primitives::{ClientId, Pid, SessionId, Size, TokenKey, Uid, WindowId};
use smallvec::SmallVec;

use super::WindowManager;
use crate::error::AddWindowError;
use crate::messages::WindowMessage;
use crate::state::{SurfaceLifecycle, WindowState};
use crate::token::{TokenKind, TokenKindTag, WindowToken};
use crate::types::{LayoutParams, ViewVisibility, WindowFlags, WindowType};

/// Toasts from apps targeting this SDK or later need an explicit token.
pub const TOAST_TOKEN_REQUIRED_SDK: u32 = 26;

/// Who is adding a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
	pub session: SessionId,
	pub client: ClientId,
	pub uid: Uid,
	pub pid: Pid,
}

/// Token a new window will attach to.
enum Attach {
	Existing(TokenKey),
	Implicit(TokenKey, TokenKind),
}

impl WindowManager {
	/// Adds a window for `who`.
	///
	/// Refusals are [`AddWindowError`]s whose [`code`](AddWindowError::code)
	/// is what the client sees.
	pub fn add_window(&mut self, who: ClientIdentity, attrs: LayoutParams, visibility: ViewVisibility) -> Result<WindowId, AddWindowError> {
		let ty = attrs.ty;
		if !ty.is_valid() {
			tracing::warn!(ty = %ty, "wm.add_window: invalid window type");
			return Err(AddWindowError::InvalidType);
		}
		if !self.env.policy.check_add_permission(ty, who.uid, &attrs.package) {
			tracing::warn!(ty = %ty, uid = %who.uid, package = %attrs.package, "wm.add_window: permission denied");
			return Err(AddWindowError::PermissionDenied);
		}
		let display_ok = self
			.displays
			.get(&attrs.display)
			.is_some_and(|d| d.owner_uid.is_none_or(|owner| owner == who.uid) && self.env.policy.has_display_access(attrs.display, who.uid));
		if !display_ok {
			tracing::warn!(display = %attrs.display, uid = %who.uid, "wm.add_window: display missing or not accessible");
			return Err(AddWindowError::InvalidDisplay);
		}
		if self.by_client.contains_key(&who.client) {
			tracing::warn!(client = %who.client, "wm.add_window: window already added");
			return Err(AddWindowError::DuplicateAdd);
		}

		let parent = if ty.is_sub_window() {
			let parent = attrs
				.token
				.and_then(|t| self.by_client.get(&ClientId(t.0)).copied())
				.filter(|p| self.windows.get(p).is_some_and(|w| !w.attrs.ty.is_sub_window()));
			match parent {
				Some(parent) => Some(parent),
				None => {
					tracing::warn!(token = ?attrs.token, "wm.add_window: bad sub-window token");
					return Err(AddWindowError::BadSubwindowToken);
				}
			}
		} else {
			None
		};

		if ty.is_singleton() && self.windows.values().any(|w| w.attrs.ty == ty) {
			tracing::warn!(ty = %ty, "wm.add_window: singleton already present");
			return Err(AddWindowError::MultipleSingleton);
		}

		let attach = match parent {
			Some(parent) => match self.windows.get(&parent) {
				Some(p) => Attach::Existing(p.token),
				None => return Err(AddWindowError::BadSubwindowToken),
			},
			None => self.resolve_token(&who, &attrs)?,
		};

		let mut toast_needs_timeout = false;
		if ty == WindowType::TOAST {
			if !self.can_add_toast(who.uid) {
				tracing::warn!(uid = %who.uid, "wm.add_window: uid already shows a toast");
				return Err(AddWindowError::DuplicateAdd);
			}
			toast_needs_timeout = self.toast_requires_token(&who, &attrs)
				|| !attrs.flags.contains(WindowFlags::NOT_FOCUSABLE)
				|| !self.uid_owns_focus(who.uid);
		}

		let token_key = match attach {
			Attach::Existing(key) => key,
			Attach::Implicit(key, kind) => {
				self.tokens.insert(key, WindowToken::new(key, kind, false, attrs.display));
				key
			}
		};

		let (id, seq) = self.next_window_id();
		let display = attrs.display;
		let requested = attrs.size.unwrap_or(Size::new(0, 0));
		let can_receive_keys = attrs.can_receive_keys();
		let ime_candidate = attrs.can_be_ime_target();
		let package = attrs.package.clone();
		let window = WindowState {
			id,
			seq,
			client: who.client,
			session: who.session,
			uid: who.uid,
			pid: who.pid,
			attrs,
			token: token_key,
			parent,
			children: SmallVec::new(),
			display,
			view_visibility: visibility,
			lifecycle: SurfaceLifecycle::AddedNotVisible,
			surface: None,
			saved_surface: None,
			requested,
			frame: foyer_primitives::Rect::EMPTY,
			layer: 0,
			relayout_called: false,
			remove_on_exit: false,
			orientation_changing: false,
			seamlessly_rotated: false,
			reported_config_seq: 0,
		};
		self.windows.insert(id, window);
		self.by_client.insert(who.client, id);
		match parent.and_then(|p| self.windows.get_mut(&p)) {
			Some(p) => p.children.push(id),
			None => {
				if let Some(token) = self.tokens.get_mut(&token_key) {
					token.windows.push(id);
				}
			}
		}
		self.env.input.open_input_channel(id);

		if ty == WindowType::APPLICATION_STARTING
			&& let Some(app) = self.tokens.get_mut(&token_key).and_then(|t| t.kind.as_app_mut())
		{
			app.starting_window = Some(id);
		}
		if toast_needs_timeout {
			self.env.timers.schedule(self.config.toast_timeout(), WindowMessage::HideToast(id));
		}
		if ty.is_application() && ty != WindowType::APPLICATION_STARTING {
			self.replace_old_windows(token_key, id);
		}

		tracing::debug!(window = %id, client = %who.client, ty = %ty, token = %token_key, package = %package, "wm.add_window: added");

		let mut focus_changed = false;
		if can_receive_keys {
			focus_changed = self.update_focused_window(super::UpdateFocus::WillAssignLayers);
		}
		if ime_candidate || focus_changed {
			self.compute_ime_target();
		}
		self.assign_layers(display);
		self.env.input.update_input_windows();
		if visibility.is_visible() {
			self.update_orientation_from_app_tokens(display);
		}
		Ok(id)
	}

	/// Picks or creates the token a top-level window attaches to.
	fn resolve_token(&self, who: &ClientIdentity, attrs: &LayoutParams) -> Result<Attach, AddWindowError> {
		let ty = attrs.ty;
		let required = TokenKind::required_for(ty);
		let existing = attrs.token.and_then(|key| self.tokens.get(&key));
		let Some(token) = existing else {
			match required {
				Some(TokenKindTag::App) => {
					tracing::warn!(token = ?attrs.token, "wm.add_window: application window without app token");
					return Err(AddWindowError::BadAppToken);
				}
				Some(TokenKindTag::Toast) => {
					if self.toast_requires_token(who, attrs) {
						tracing::warn!(package = %attrs.package, "wm.add_window: toast requires a token");
						return Err(AddWindowError::BadAppToken);
					}
				}
				Some(tag) => {
					tracing::warn!(ty = %ty, ?tag, "wm.add_window: type requires an explicit token");
					return Err(AddWindowError::BadAppToken);
				}
				None => {}
			}
			let key = attrs.token.unwrap_or(TokenKey(who.client.0));
			return Ok(Attach::Implicit(key, TokenKind::implicit_for(ty)));
		};

		match required {
			Some(TokenKindTag::App) => {
				let Some(app) = token.kind.as_app() else {
					tracing::warn!(token = %token.key, "wm.add_window: not an app token");
					return Err(AddWindowError::NotAppToken);
				};
				if app.removed {
					tracing::warn!(token = %token.key, "wm.add_window: app token exiting");
					return Err(AddWindowError::AppExiting);
				}
				if ty == WindowType::APPLICATION_STARTING && self.app_has_drawn_window(token) {
					tracing::debug!(token = %token.key, "wm.add_window: starting window not needed");
					return Err(AddWindowError::StartingNotNeeded);
				}
				Ok(Attach::Existing(token.key))
			}
			Some(TokenKindTag::Toast) if token.kind.tag() != TokenKindTag::Toast && !self.toast_requires_token(who, attrs) => Ok(Attach::Existing(token.key)),
			Some(tag) if token.kind.tag() != tag => {
				tracing::warn!(ty = %ty, token = %token.key, "wm.add_window: token kind mismatch");
				Err(AddWindowError::BadAppToken)
			}
			Some(_) => Ok(Attach::Existing(token.key)),
			// App tokens are not valid for other system types; give the window its own.
			None if token.kind.is_app() => Ok(Attach::Implicit(TokenKey(who.client.0), TokenKind::implicit_for(ty))),
			None => Ok(Attach::Existing(token.key)),
		}
	}

	pub(super) fn app_has_drawn_window(&self, token: &WindowToken) -> bool {
		token
			.windows
			.iter()
			.filter_map(|w| self.windows.get(w))
			.any(|w| w.attrs.ty != WindowType::APPLICATION_STARTING && w.lifecycle == SurfaceLifecycle::Visible)
	}

	/// One toast per uid, unless that uid owns focus.
	fn can_add_toast(&self, uid: Uid) -> bool {
		self.uid_owns_focus(uid) || !self.windows.values().any(|w| w.uid == uid && w.attrs.ty == WindowType::TOAST)
	}

	fn uid_owns_focus(&self, uid: Uid) -> bool {
		self.focus.current.and_then(|f| self.windows.get(&f)).is_some_and(|w| w.uid == uid)
	}

	/// Apps targeting [`TOAST_TOKEN_REQUIRED_SDK`] or later must add toasts on a toast token.
	fn toast_requires_token(&self, who: &ClientIdentity, attrs: &LayoutParams) -> bool {
		self.env.policy.target_sdk(&attrs.package, who.uid) >= TOAST_TOKEN_REQUIRED_SDK
	}
}
