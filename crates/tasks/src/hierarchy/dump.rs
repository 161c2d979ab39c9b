use std::fmt::Write;

use super::Hierarchy;

impl Hierarchy {
	/// Writes the whole hierarchy, front-most display first.
	pub fn dump(&self, out: &mut String) {
		let _ = writeln!(out, "ACTIVITY HIERARCHY (focused stack: {:?})", self.focused_stack.map(|s| s.0));
		for display in self.display_order.iter().rev() {
			let Some(d) = self.displays.get(display) else {
				continue;
			};
			let _ = writeln!(out, "  Display {} supports_home={} private={}", d.id, d.supports_home, d.is_private());
			for stack in d.stacks.iter().rev() {
				let Some(s) = self.stacks.get(stack) else {
					continue;
				};
				let _ = writeln!(
					out,
					"    Stack {} mode={} type={:?} resumed={:?}",
					s.id,
					s.windowing_mode.as_str(),
					s.activity_type,
					s.resumed.map(|r| r.0)
				);
				for task in s.tasks.iter().rev() {
					let Some(t) = self.tasks.get(task) else {
						continue;
					};
					let _ = writeln!(
						out,
						"      Task {} user={} affinity={:?} real={} return_to_home={} affiliated={}",
						t.id,
						t.user,
						t.affinity,
						t.real_activity.as_ref().map(|c| c.short_string()).unwrap_or_default(),
						t.return_to_home,
						t.affiliated_task
					);
					for id in t.activities.iter().rev() {
						let Some(r) = self.records.get(id) else {
							continue;
						};
						let _ = writeln!(
							out,
							"        Record {} {} state={:?} visible={} front={} finishing={} new_intents={} results={}",
							r.id,
							r.component(),
							r.state,
							r.visible,
							r.front_of_task,
							r.finishing,
							r.new_intents.len(),
							r.results.len()
						);
					}
				}
			}
		}
		let unattached = self.records.values().filter(|r| r.task.is_none()).count();
		if unattached > 0 {
			let _ = writeln!(out, "  unattached records: {unattached}");
		}
	}
}
