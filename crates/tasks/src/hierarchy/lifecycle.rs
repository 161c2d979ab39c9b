//! Finishing, result delivery, resume and visibility.

use foyer_primitives::{Intent, RecordId, StackId, Uid};

use super::Hierarchy;
use crate::error::{HierarchyError, Result};
use crate::events::HierarchyEvent;
use crate::record::{ActivityResult, LifecycleState};

impl Hierarchy {
	/// Finishes `record`, delivering `result_code` to its result target.
	///
	/// The record leaves its task (and the registry) immediately; an emptied
	/// task is removed unless it is being cleared for reuse. Returns `false`
	/// when the record is unknown or already finishing.
	pub fn finish_activity(&mut self, record: RecordId, result_code: i32, data: Option<Intent>, reason: &str) -> bool {
		let (result_to, who, request_code) = match self.records.get_mut(&record) {
			Some(r) if !r.finishing => {
				r.finishing = true;
				r.state = LifecycleState::Finishing;
				(r.result_to.take(), r.result_who.take(), r.request_code)
			}
			_ => return false,
		};
		if let Some(to) = result_to {
			self.send_result(to, Some(record), who, request_code, result_code, data);
		}
		for stack in self.stacks.values_mut() {
			if stack.resumed == Some(record) {
				stack.resumed = None;
			}
		}
		let task = self.detach_record(record);
		self.records.remove(&record);
		tracing::debug!(record = %record, ?task, result_code, reason, "hierarchy.finish_activity");
		self.emit(HierarchyEvent::RecordRemoved { record });
		true
	}

	/// Queues a result on `to`. Unknown targets are ignored.
	pub fn send_result(&mut self, to: RecordId, from: Option<RecordId>, result_who: Option<String>, request_code: i32, result_code: i32, data: Option<Intent>) {
		let Some(target) = self.records.get_mut(&to) else {
			tracing::debug!(to = %to, "hierarchy.send_result: target gone");
			return;
		};
		target.results.push(ActivityResult {
			from,
			result_who,
			request_code,
			result_code,
			data,
		});
	}

	/// Withdraws results `from` sent to `to` under `result_who`/`request_code`.
	pub fn remove_results(&mut self, to: RecordId, from: RecordId, result_who: Option<&str>, request_code: i32) {
		if let Some(target) = self.records.get_mut(&to) {
			target
				.results
				.retain(|r| !(r.from == Some(from) && r.result_who.as_deref() == result_who && r.request_code == request_code));
		}
	}

	/// Hands `intent` to an existing instance instead of starting a new one.
	pub fn deliver_new_intent(&mut self, record: RecordId, intent: Intent, from_uid: Uid) -> Result<()> {
		let r = self.records.get_mut(&record).ok_or(HierarchyError::UnknownRecord(record))?;
		r.new_intents.push(intent);
		tracing::trace!(record = %record, from_uid = %from_uid, "hierarchy.deliver_new_intent");
		self.emit(HierarchyEvent::NewIntent { record });
		Ok(())
	}

	/// Resumed record of the focused stack.
	pub fn resumed_activity(&self) -> Option<RecordId> {
		self.stacks.get(&self.focused_stack?)?.resumed
	}

	/// Top running record of the focused stack.
	pub fn top_running_of_focused(&self, not_top: Option<RecordId>) -> Option<RecordId> {
		self.top_running_of_stack(self.focused_stack?, not_top)
	}

	/// Resumes the top running record of the focused stack, pausing whatever
	/// was resumed elsewhere. Returns the resumed record.
	pub fn resume_focused_stack_top(&mut self) -> Option<RecordId> {
		let focused = self.focused_stack?;
		let top = self.top_running_of_stack(focused, None)?;
		let stale: Vec<(StackId, RecordId)> = self
			.stacks
			.values()
			.filter_map(|s| s.resumed.filter(|r| *r != top).map(|r| (s.id, r)))
			.collect();
		for (stack, record) in stale {
			if let Some(r) = self.records.get_mut(&record) {
				r.state = LifecycleState::Paused;
			}
			if let Some(s) = self.stacks.get_mut(&stack) {
				s.resumed = None;
			}
		}
		if let Some(s) = self.stacks.get_mut(&focused) {
			s.resumed = Some(top);
		}
		let newly_resumed = match self.records.get_mut(&top) {
			Some(r) if r.state != LifecycleState::Resumed => {
				r.state = LifecycleState::Resumed;
				true
			}
			_ => false,
		};
		if newly_resumed {
			tracing::debug!(record = %top, stack = %focused, "hierarchy.resume_focused_stack_top");
			self.emit(HierarchyEvent::RecordResumed { record: top });
		}
		self.ensure_activities_visible();
		Some(top)
	}

	/// Recomputes record visibility front to back on every display.
	///
	/// In each stack only the top running record of each task can be
	/// visible, and in opaque stacks only the top task shows. Everything
	/// behind a showing opaque stack is hidden, except records launched
	/// behind on purpose.
	pub fn ensure_activities_visible(&mut self) {
		let mut changes = Vec::new();
		for display in self.display_order.iter().rev() {
			let Some(d) = self.displays.get(display) else {
				continue;
			};
			let mut behind_opaque = false;
			for stack in d.stacks.iter().rev() {
				let Some(s) = self.stacks.get(stack) else {
					continue;
				};
				let mut stack_showed = false;
				for task in s.tasks.iter().rev() {
					let Some(t) = self.tasks.get(task) else {
						continue;
					};
					let top = self.top_running_activity(*task, None);
					for id in t.activities.iter().rev() {
						let Some(r) = self.records.get(id) else {
							continue;
						};
						let eligible = Some(*id) == top && !behind_opaque && !(s.is_opaque() && stack_showed);
						let visible = (eligible || r.launch_task_behind) && !r.finishing;
						if visible != r.visible {
							changes.push((*id, visible));
						}
					}
					if top.is_some() {
						stack_showed = true;
					}
				}
				if stack_showed && s.is_opaque() {
					behind_opaque = true;
				}
			}
		}
		for (record, visible) in changes {
			if let Some(r) = self.records.get_mut(&record) {
				r.visible = visible;
				if !visible && r.state == LifecycleState::Paused {
					r.state = LifecycleState::Stopped;
				}
			}
			self.emit(HierarchyEvent::VisibilityChanged { record, visible });
		}
	}
}
