//! Invariant catalog for [`crate::WindowManager`].

use foyer_primitives::{ClientId, DisplayId, Rotation, ScreenOrientation, Size};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

use crate::testing::{APP_UID, WindowHarness};
use crate::{LayoutParams, SurfaceLifecycle, ViewVisibility, WindowType};

/// Must not create a surface before a relayout asks for visibility.
///
/// * Enforced in: `WindowManager::add_window`, `WindowManager::relayout_window`
/// * Failure symptom: Blank surfaces flash on screen before the client has drawn.
#[cfg_attr(test, test)]
pub(crate) fn test_surface_requires_visible_relayout() {
	let mut h = WindowHarness::new();
	let token = h.app_token(1);
	let who = h.client(APP_UID);
	let id = h
		.wm
		.add_window(who, LayoutParams::new(WindowType::APPLICATION, "p").with_token(token), ViewVisibility::Visible)
		.unwrap();
	assert!(h.system.lock().live_surfaces.is_empty());

	let result = h.wm.relayout_window(who.client, None, Size::new(0, 0), ViewVisibility::Invisible).unwrap();
	assert_eq!(result.surface, None);
	assert_eq!(h.wm.window(id).unwrap().lifecycle, SurfaceLifecycle::AddedNotVisible);
	assert!(h.system.lock().live_surfaces.is_empty());
}

/// Must keep a window and its surface while its exit animation runs.
///
/// * Enforced in: `WindowManager::remove_window`, `WindowManager::exit_animation_finished`
/// * Failure symptom: Closing windows vanish mid-animation.
#[cfg_attr(test, test)]
pub(crate) fn test_destroy_waits_for_exit_animation() {
	let mut h = WindowHarness::new();
	let token = h.app_token(1);
	let (who, id) = h.app_window(token);
	h.system.lock().exit_animations = true;

	h.wm.remove_window(who.client).unwrap();
	assert!(h.wm.window(id).unwrap().has_surface());
	assert_eq!(h.system.lock().live_surfaces.len(), 1);
	h.wm.exit_animation_finished(id);
	assert!(h.system.lock().live_surfaces.is_empty());
}

/// Must balance nested layout deferral and ignore an unmatched continue.
///
/// * Enforced in: `WindowManager::defer_surface_layout`, `WindowManager::continue_surface_layout`
/// * Failure symptom: Placement stops forever, or runs mid-sequence.
#[cfg_attr(test, test)]
pub(crate) fn test_layout_deferral_is_balanced() {
	let mut h = WindowHarness::new();
	let before = h.wm.placements();
	h.wm.continue_surface_layout();
	assert_eq!(h.wm.layout_deferred(), 0);
	assert_eq!(h.wm.placements(), before);

	h.wm.defer_surface_layout();
	h.wm.perform_surface_placement();
	assert_eq!(h.wm.placements(), before);
	h.wm.continue_surface_layout();
	assert_eq!(h.wm.placements(), before + 1);
}

/// Must not change rotation while the display is frozen.
///
/// * Enforced in: `WindowManager::update_rotation_unchecked`
/// * Failure symptom: Rotation animations stack up and the screen never unfreezes.
#[cfg_attr(test, test)]
pub(crate) fn test_rotation_waits_for_unfreeze() {
	let mut h = WindowHarness::new();
	h.system.lock().rotations.insert(ScreenOrientation::Landscape, Rotation::Rot90);
	let token = h.app_token(1);
	assert!(h.wm.start_client_freezing());

	h.wm.set_app_orientation(token, ScreenOrientation::Landscape).unwrap();
	assert_eq!(h.wm.display(DisplayId::DEFAULT).unwrap().rotation, Rotation::Rot0);

	h.wm.stop_client_freezing();
	assert_eq!(h.wm.display(DisplayId::DEFAULT).unwrap().rotation, Rotation::Rot90);
}

/// Must leave nothing of a dead client behind.
///
/// * Enforced in: `WindowManager::client_died`
/// * Failure symptom: Ghost windows keep focus and rotation callbacks fail forever.
#[cfg_attr(test, test)]
pub(crate) fn test_dead_client_leaves_nothing() {
	let mut h = WindowHarness::new();
	let token = h.app_token(1);
	let (who, id) = h.app_window(token);
	h.wm.watch_rotation(who.client, DisplayId::DEFAULT);
	h.wm.client_died(who.client);
	h.wm.client_died(ClientId(who.client.0 + 1_000));

	assert!(h.wm.window_for_client(who.client).is_none());
	assert!(h.wm.rotation_watchers().is_empty());
	assert!(!h.system.lock().input_channels.contains(&id));
	assert_eq!(h.wm.focus().current, None);
}

#[derive(Debug, Clone)]
enum Op {
	Add,
	Show(usize),
	Hide(usize),
	Remove(usize),
	Die(usize),
	AppVisible(bool),
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		Just(Op::Add),
		(0..4usize).prop_map(Op::Show),
		(0..4usize).prop_map(Op::Hide),
		(0..4usize).prop_map(Op::Remove),
		(0..4usize).prop_map(Op::Die),
		any::<bool>().prop_map(Op::AppVisible),
	]
}

proptest! {
	#[test]
	fn prop_surfaces_follow_the_window_table(ops in proptest::collection::vec(op(), 1..40)) {
		let mut h = WindowHarness::new();
		let token = h.app_token(1);
		let mut clients = Vec::new();
		for op in ops {
			match op {
				Op::Add => {
					let who = h.client(APP_UID);
					let attrs = LayoutParams::new(WindowType::APPLICATION, "p").with_token(token);
					if h.wm.add_window(who, attrs, ViewVisibility::Visible).is_ok() {
						clients.push(who.client);
					}
				}
				Op::Show(i) | Op::Hide(i) => {
					let visibility = if matches!(op, Op::Show(_)) { ViewVisibility::Visible } else { ViewVisibility::Gone };
					if let Some(client) = clients.get(i) {
						let _ = h.wm.relayout_window(*client, None, Size::new(0, 0), visibility);
					}
				}
				Op::Remove(i) => {
					if let Some(client) = clients.get(i) {
						let _ = h.wm.remove_window(*client);
					}
				}
				Op::Die(i) => {
					if let Some(client) = clients.get(i) {
						h.wm.client_died(*client);
					}
				}
				Op::AppVisible(visible) => {
					h.wm.set_app_visibility(token, visible).unwrap();
				}
			}
		}

		let mut expected = FxHashSet::default();
		for w in h.wm.windows() {
			prop_assert_eq!(h.wm.window_for_client(w.client).map(|x| x.id), Some(w.id));
			prop_assert_eq!(w.has_surface(), w.is_on_screen());
			expected.extend(w.surface);
			expected.extend(w.saved_surface);
		}
		prop_assert_eq!(h.system.lock().live_surfaces.clone(), expected);
	}
}
