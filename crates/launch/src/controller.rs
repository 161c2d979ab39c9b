//! Entry point of the launch resolver.

use std::fmt::Write as _;
use std::time::Duration;

use foyer_primitives::{RecordId, StartResult, TaskId};
use foyer_tasks::Hierarchy;

use crate::collaborators::Collaborators;
use crate::config::LaunchConfig;
use crate::error::{LaunchError, Result};
use crate::outcome::LaunchOutcome;
use crate::pending::{AppSwitchState, PendingActivityLaunch};
use crate::request::{ActivityOptions, StartFlags, StartRequest};
use crate::starter::{StartParams, Starter};

/// Bookkeeping about the most recent start, kept for dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastStart {
	pub reason: String,
	/// Clock reading when the start was issued.
	pub time: Duration,
	/// Internal result.
	pub result: StartResult,
	pub record: Option<RecordId>,
	/// Package of the record that was started or reused.
	pub package: Option<String>,
}

/// Owns everything about starting activities that outlives one start.
///
/// The hierarchy and the collaborators are borrowed per call; the caller
/// holds the service lock for the duration.
#[derive(Debug, Default)]
pub struct LaunchController {
	pub(crate) config: LaunchConfig,
	pub(crate) app_switch: AppSwitchState,
	pub(crate) pending: Vec<PendingActivityLaunch>,
	last_start: Option<LastStart>,
}

impl LaunchController {
	pub fn new(config: LaunchConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	pub fn config(&self) -> &LaunchConfig {
		&self.config
	}

	pub fn app_switch(&self) -> &AppSwitchState {
		&self.app_switch
	}

	pub fn pending_launches(&self) -> &[PendingActivityLaunch] {
		&self.pending
	}

	pub fn last_start(&self) -> Option<&LastStart> {
		self.last_start.as_ref()
	}

	/// Runs one start request.
	///
	/// The request must carry a non-empty reason; without one nothing is
	/// touched and [`LaunchError::MissingReason`] is returned. Policy
	/// outcomes, including denials, come back as [`LaunchOutcome::result`].
	pub fn execute(&mut self, h: &mut Hierarchy, env: &mut Collaborators<'_>, request: StartRequest) -> Result<LaunchOutcome> {
		if !request.has_reason() {
			return Err(LaunchError::MissingReason);
		}
		let reason = request.reason.clone().unwrap_or_default();
		let time = env.clock.now();
		let outcome = if request.may_wait {
			self.start_activity_may_wait(h, env, request)?
		} else {
			self.start_activity(h, env, request)?
		};
		self.record_last_start(h, reason, time, outcome);
		Ok(outcome)
	}

	/// Places a record that already passed admission, as pending launches do.
	#[allow(clippy::too_many_arguments, reason = "mirrors the placement inputs one to one")]
	pub fn start_resolved_activity(
		&mut self,
		h: &mut Hierarchy,
		env: &mut Collaborators<'_>,
		record: RecordId,
		source: Option<RecordId>,
		start_flags: StartFlags,
		do_resume: bool,
		options: Option<ActivityOptions>,
		in_task: Option<TaskId>,
	) -> Result<LaunchOutcome> {
		let time = env.clock.now();
		let params = StartParams {
			record,
			source,
			voice_session: None,
			start_flags,
			do_resume,
			options,
			in_task,
			restricted_bg: false,
		};
		let outcome = Starter::new(h, env, &self.config, params)?.run()?;
		self.record_last_start(h, "startResolvedActivity".to_owned(), time, outcome);
		Ok(outcome)
	}

	fn record_last_start(&mut self, h: &Hierarchy, reason: String, time: Duration, outcome: LaunchOutcome) {
		let package = outcome.record.and_then(|r| h.record(r)).map(|r| r.package().to_owned());
		self.last_start = Some(LastStart {
			reason,
			time,
			result: outcome.result,
			record: outcome.record,
			package,
		});
	}

	/// Blocks switches away from the resumed app for the configured delay.
	pub fn stop_app_switches(&mut self, now: Duration) {
		self.app_switch.stop(now, self.config.app_switch_delay());
		tracing::debug!(?now, "launch.app_switch: stopped");
	}

	/// Lifts the app-switch block and replays deferred starts.
	pub fn resume_app_switches(&mut self, h: &mut Hierarchy, env: &mut Collaborators<'_>) -> Result<()> {
		self.app_switch.resume();
		self.do_pending_activity_launches(h, env, true)
	}

	/// Replays deferred starts in arrival order. Only the last one resumes.
	pub fn do_pending_activity_launches(&mut self, h: &mut Hierarchy, env: &mut Collaborators<'_>, do_resume: bool) -> Result<()> {
		let pending = std::mem::take(&mut self.pending);
		let count = pending.len();
		for (i, launch) in pending.into_iter().enumerate() {
			let resume = do_resume && i + 1 == count;
			if h.record(launch.record).is_none() {
				continue;
			}
			let params = StartParams {
				record: launch.record,
				source: launch.source,
				voice_session: None,
				start_flags: launch.start_flags,
				do_resume: resume,
				options: None,
				in_task: None,
				restricted_bg: false,
			};
			match Starter::new(h, env, &self.config, params).and_then(Starter::run) {
				Ok(outcome) => tracing::debug!(record = %launch.record, result = %outcome.result, "launch.pending: replayed"),
				Err(err) => tracing::warn!(record = %launch.record, %err, "launch.pending: replay failed"),
			}
		}
		Ok(())
	}

	/// Drops deferred starts whose record is gone or belongs to `package`.
	pub fn clear_pending_launches(&mut self, h: &mut Hierarchy, package: Option<&str>) {
		self.pending.retain(|p| {
			let keep = h.record(p.record).is_some_and(|r| package.is_none_or(|pkg| r.package() != pkg));
			if !keep {
				h.discard_record(p.record);
			}
			keep
		});
	}

	/// The most recent start concerned `package`.
	pub fn related_to_package(&self, package: &str) -> bool {
		self.last_start.as_ref().and_then(|s| s.package.as_deref()) == Some(package)
	}

	pub fn dump(&self, out: &mut String) {
		let _ = writeln!(out, "LAUNCH CONTROLLER");
		if let Some(last) = &self.last_start {
			let _ = writeln!(out, "  last start: reason={} time={:?} result={} record={:?}", last.reason, last.time, last.result, last.record);
			if let Some(package) = &last.package {
				let _ = writeln!(out, "    package={package}");
			}
		}
		let _ = writeln!(
			out,
			"  app switches: allowed_after={:?} did_app_switch={}",
			self.app_switch.allowed_after(),
			self.app_switch.did_app_switch()
		);
		if !self.pending.is_empty() {
			let _ = writeln!(out, "  pending launches:");
			for p in &self.pending {
				let _ = writeln!(out, "    record={} source={:?} flags={:?}", p.record, p.source, p.start_flags);
			}
		}
	}
}
