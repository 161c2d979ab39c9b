//! Reuse lookups for the launch resolver.

use foyer_primitives::{ActivityType, ComponentName, DisplayId, Intent, IntentFlags, LaunchMode, RecordId, StackId, UserId};

use super::Hierarchy;

/// What the resolver is about to start, as seen by [`Hierarchy::find_task`].
#[derive(Debug, Clone, Copy)]
pub struct FindTaskQuery<'a> {
	pub component: &'a ComponentName,
	pub user: UserId,
	pub intent: &'a Intent,
	pub affinity: Option<&'a str>,
	pub activity_type: ActivityType,
	/// Display searched first. Affinity matches only count here.
	pub preferred_display: DisplayId,
}

/// Match found by [`Hierarchy::find_task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindTaskResult {
	/// Top record of the matching task.
	pub record: RecordId,
	/// Matched on root affinity rather than on the base component.
	pub matched_by_root_affinity: bool,
}

impl Hierarchy {
	/// Best existing task for a start, returned as its top record.
	///
	/// An exact match on the task's base component (and document data for
	/// document launches) on any display wins immediately. Otherwise a task
	/// whose root affinity equals the target's affinity is accepted, but only
	/// on the preferred display. Tasks attached to a voice session, tasks of
	/// other users and tasks topped by a single-instance record never match.
	pub fn find_task(&self, query: &FindTaskQuery<'_>) -> Option<FindTaskResult> {
		let mut affinity_match = None;
		for display in self.displays_preferring(query.preferred_display) {
			let Some(d) = self.displays.get(&display) else {
				continue;
			};
			for stack in d.stacks.iter().rev() {
				let Some(s) = self.stacks.get(stack) else {
					continue;
				};
				if !s.accepts(query.activity_type) {
					continue;
				}
				match self.find_task_in_stack(*stack, query) {
					Some(hit) if !hit.matched_by_root_affinity => return Some(hit),
					Some(hit) if display == query.preferred_display && affinity_match.is_none() => affinity_match = Some(hit),
					_ => {}
				}
			}
		}
		affinity_match
	}

	fn find_task_in_stack(&self, stack: StackId, query: &FindTaskQuery<'_>) -> Option<FindTaskResult> {
		let s = self.stacks.get(&stack)?;
		let is_document = query.intent.flags.contains(IntentFlags::NEW_DOCUMENT);
		let document_data = is_document.then_some(query.intent.data.as_deref()).flatten();
		let mut by_affinity = None;

		for task in s.tasks.iter().rev() {
			let Some(t) = self.tasks.get(task) else {
				continue;
			};
			if t.voice_session.is_some() || t.user != query.user {
				continue;
			}
			let Some(top) = self.top_activity(*task).and_then(|id| self.records.get(&id)) else {
				continue;
			};
			if top.user != query.user || top.launch_mode() == LaunchMode::SingleInstance {
				continue;
			}
			if !top.has_compatible_activity_type(query.activity_type) {
				continue;
			}

			let task_is_document = t.is_document();
			let task_document_data = if task_is_document { t.intent.as_ref().and_then(|i| i.data.as_deref()) } else { None };
			let exact = |intent: Option<&Intent>| intent.and_then(|i| i.component.as_ref()) == Some(query.component) && task_document_data == document_data;

			if exact(t.intent.as_ref()) || exact(t.affinity_intent.as_ref()) {
				return Some(FindTaskResult {
					record: top.id,
					matched_by_root_affinity: false,
				});
			}
			if by_affinity.is_none() && !is_document && !task_is_document && t.root_affinity.is_some() && t.root_affinity.as_deref() == query.affinity {
				by_affinity = Some(FindTaskResult {
					record: top.id,
					matched_by_root_affinity: true,
				});
			}
		}
		by_affinity
	}

	/// Topmost running instance of `component` for `user` on any display.
	///
	/// With `compare_filters` the whole intent filter must match instead of
	/// just the component.
	pub fn find_activity(&self, component: &ComponentName, user: UserId, intent: &Intent, compare_filters: bool) -> Option<RecordId> {
		for display in self.display_order.iter().rev() {
			let Some(d) = self.displays.get(display) else {
				continue;
			};
			for stack in d.stacks.iter().rev() {
				let Some(s) = self.stacks.get(stack) else {
					continue;
				};
				for task in s.tasks.iter().rev() {
					let Some(t) = self.tasks.get(task) else {
						continue;
					};
					for id in t.activities.iter().rev() {
						let Some(r) = self.records.get(id) else {
							continue;
						};
						if r.finishing || r.user != user {
							continue;
						}
						let hit = if compare_filters {
							r.intent.filter_equals(intent)
						} else {
							r.intent.component.as_ref().unwrap_or(&r.info.component) == component
						};
						if hit {
							return Some(*id);
						}
					}
				}
			}
		}
		None
	}
}
