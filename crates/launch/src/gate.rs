//! Admission: every check a start passes before a record exists.
//!
//! Stages run in a fixed order and each may end the start with a result
//! code. Once a record is built and app switches allow it, placement is
//! handed to the starter.

use foyer_primitives::intent::{
	ACTION_INSTALL_INSTANT_APP_PACKAGE, ACTION_REVIEW_PERMISSIONS, CATEGORY_VOICE, EXTRA_INTENT, EXTRA_PACKAGE_NAME, EXTRA_RESULT_NEEDED,
};
use foyer_primitives::{ActivityInfo, AuxiliaryResolveInfo, ComponentName, ExtraValue, Intent, IntentFlags, Pid, RecordId, ResolveInfo, StartResult, Uid, UserId};
use foyer_tasks::{Hierarchy, RESULT_CANCELED, RecordSpec};

use crate::background::{self, BackgroundFacts, BackgroundStartQuery, handle_background_abort};
use crate::collaborators::{Collaborators, StartPermissionCheck};
use crate::controller::LaunchController;
use crate::error::Result;
use crate::outcome::LaunchOutcome;
use crate::pending::PendingActivityLaunch;
use crate::request::{StartRequest, compute_resolve_filter_uid};
use crate::starter::{StartParams, Starter};

/// Mutable view of the request as the stages rewrite it.
struct Admission {
	intent: Intent,
	resolved_type: Option<String>,
	info: Option<ActivityInfo>,
	resolve: Option<ResolveInfo>,
	calling_pid: Option<Pid>,
	calling_uid: Uid,
	calling_package: Option<String>,
	result_who: Option<String>,
	request_code: i32,
	fallback_user: UserId,
}

impl Admission {
	fn user(&self) -> UserId {
		self.info.as_ref().map_or(self.fallback_user, |i| i.uid().user_id())
	}
}

impl LaunchController {
	pub(crate) fn start_activity(&mut self, h: &mut Hierarchy, env: &mut Collaborators<'_>, request: StartRequest) -> Result<LaunchOutcome> {
		let mut a = Admission {
			intent: request.intent.clone(),
			resolved_type: request.resolved_type.clone(),
			info: request.activity_info.clone(),
			resolve: request.resolve_info.clone(),
			calling_pid: request.calling_pid,
			calling_uid: request.calling_uid,
			calling_package: request.calling_package.clone(),
			result_who: request.result_who.clone(),
			request_code: request.request_code,
			fallback_user: request.user,
		};
		let mut err = StartResult::Success;

		let caller_app = match request.caller {
			Some(caller) => match env.processes.process_for_caller(caller) {
				Some(app) => {
					a.calling_pid = Some(app.pid);
					a.calling_uid = app.uid;
					Some(app)
				}
				None => {
					tracing::warn!(caller = %caller, intent = %a.intent, "launch.start: unable to find app for caller");
					err = StartResult::PermissionDenied;
					None
				}
			},
			None => None,
		};

		let user = a.user();
		if err == StartResult::Success {
			tracing::info!(user = %user, intent = %a.intent, calling_uid = %a.calling_uid, "launch.start: START");
		}

		let source = request.result_to.filter(|r| h.stack_of_record(*r).is_some());
		let mut result_record = source.filter(|s| a.request_code >= 0 && h.record(*s).is_some_and(|r| !r.finishing));

		let launch_flags = a.intent.flags;
		if launch_flags.contains(IntentFlags::FORWARD_RESULT)
			&& let Some(source) = source
		{
			if a.request_code >= 0 {
				return Ok(LaunchOutcome::bare(StartResult::ForwardAndRequestConflict));
			}
			let (forward_to, who, code, from_uid, from_package) = match h.record_mut(source) {
				Some(s) => (s.result_to.take(), s.result_who.clone(), s.request_code, s.launched_from_uid, s.launched_from_package.clone()),
				None => return Ok(LaunchOutcome::bare(StartResult::Canceled)),
			};
			result_record = forward_to.filter(|r| h.stack_of_record(*r).is_some());
			a.result_who = who;
			a.request_code = code;
			if let Some(to) = result_record {
				h.remove_results(to, source, a.result_who.as_deref(), a.request_code);
			}
			if from_uid == a.calling_uid {
				a.calling_package = from_package;
			}
		}

		if err == StartResult::Success && a.intent.component.is_none() {
			err = StartResult::IntentNotResolved;
		}
		if err == StartResult::Success && a.info.is_none() {
			err = StartResult::ClassNotFound;
		}

		if err == StartResult::Success
			&& let Some(source) = source
			&& let Some(info) = &a.info
		{
			let source_task_voice = h.record(source).and_then(|r| r.task).and_then(|t| h.task(t)).and_then(|t| t.voice_session);
			let source_uid = h.record(source).map(|r| r.uid());
			if source_task_voice.is_some() && !launch_flags.contains(IntentFlags::NEW_TASK) && source_uid != Some(info.uid()) {
				a.intent.add_category(CATEGORY_VOICE);
				if !supports_intent(env, &a) {
					tracing::warn!(intent = %a.intent, "launch.start: activity in current voice task does not support voice");
					err = StartResult::NotVoiceCompatible;
				}
			}
		}
		if err == StartResult::Success && request.voice_session.is_some() && !supports_intent(env, &a) {
			tracing::warn!(intent = %a.intent, "launch.start: activity in new voice task does not support voice");
			err = StartResult::NotVoiceCompatible;
		}

		if err != StartResult::Success {
			if let Some(to) = result_record {
				h.send_result(to, None, a.result_who.clone(), a.request_code, RESULT_CANCELED, None);
			}
			return Ok(LaunchOutcome::bare(err));
		}
		let Some(info) = a.info.clone() else {
			return Ok(LaunchOutcome::bare(StartResult::ClassNotFound));
		};

		let check = StartPermissionCheck {
			intent: &a.intent,
			info: &info,
			result_who: a.result_who.as_deref(),
			request_code: a.request_code,
			calling_pid: a.calling_pid,
			calling_uid: a.calling_uid,
			calling_package: a.calling_package.as_deref(),
			ignore_target_security: request.ignore_target_security,
			launching_in_task: request.in_task.is_some(),
			has_result_record: result_record.is_some(),
		};
		let mut abort = !env.permissions.check_start_any_activity(&check);
		abort |= !env
			.permissions
			.check_intent_firewall(&a.intent, a.calling_uid, a.calling_pid, a.resolved_type.as_deref(), &info.application);
		abort |= !env.permissions.check_start_activity(&a.intent, a.calling_uid, a.calling_package.as_deref());

		let package = info.package().to_owned();
		if env.app_lock.is_app_locked(&package) && !env.app_lock.is_app_opened(&package) && !env.app_lock.is_alarm_or_call_intent(&a.intent) {
			tracing::debug!(package = %package, intent = %a.intent, "launch.app_lock: locked package");
			env.app_lock.set_app_intent(&package, &a.intent);
			env.app_lock.launch_before_activity(&package);
			abort = true;
		}

		let mut restricted_bg = false;
		if !abort {
			let query = BackgroundStartQuery {
				calling_uid: a.calling_uid,
				calling_pid: a.calling_pid,
				calling_package: a.calling_package.as_deref(),
				real_calling_uid: request.real_calling_uid,
				real_calling_pid: request.real_calling_pid,
				caller_app: caller_app.as_ref(),
				originating_pending_intent: request.originating_pending_intent,
				allowlisted: request.allow_background_start,
				intent: &a.intent,
			};
			let facts = BackgroundFacts {
				permissions: env.permissions,
				processes: env.processes,
				recents: env.recents,
				windows: &*env.surface,
			};
			restricted_bg = background::evaluate(&query, &facts, &self.config).should_abort();
		}

		let vetoed = match env.controller.as_ref() {
			Some(watcher) => watcher.activity_starting(&a.intent.clone_filter(), &package),
			None => Ok(true),
		};
		match vetoed {
			Ok(approved) => abort |= !approved,
			Err(gone) => {
				tracing::debug!(%gone, "launch.start: activity controller died");
				*env.controller = None;
			}
		}

		if abort {
			if let Some(to) = result_record {
				h.send_result(to, None, a.result_who.clone(), a.request_code, RESULT_CANCELED, None);
			}
			return Ok(LaunchOutcome::bare(StartResult::Aborted));
		}

		let mut info = info;
		if env.packages.is_permission_review_required(&package, user) {
			let Some(reviewed) = self.redirect_to_permission_review(env, &mut a, &request, result_record.is_some(), &package, user) else {
				if let Some(to) = result_record {
					h.send_result(to, None, a.result_who.clone(), a.request_code, RESULT_CANCELED, None);
				}
				return Ok(LaunchOutcome::bare(StartResult::ClassNotFound));
			};
			info = reviewed;
		}

		if let Some(auxiliary) = a.resolve.as_ref().and_then(|r| r.auxiliary.clone()) {
			let original = request.ephemeral_intent.as_ref().unwrap_or(&request.intent);
			a.intent = create_launch_intent(env, &auxiliary, original, a.calling_package.as_deref(), a.resolved_type.as_deref(), user);
			a.resolved_type = None;
			a.calling_uid = request.real_calling_uid;
			a.calling_pid = request.real_calling_pid;
			match env.packages.resolve_activity(&a.intent, a.resolve.as_ref(), request.start_flags, user) {
				Some(installer) => info = installer,
				None => return Ok(LaunchOutcome::bare(StartResult::ClassNotFound)),
			}
		}

		let record = h.create_record(RecordSpec {
			info,
			intent: a.intent.clone(),
			launched_from_uid: a.calling_uid,
			launched_from_pid: a.calling_pid,
			launched_from_package: a.calling_package.clone(),
			result_to: result_record,
			result_who: a.result_who.clone(),
			request_code: a.request_code,
			component_specified: request.component_specified,
			voice_session: request.voice_session,
		});
		if let Some(r) = h.record_mut(record) {
			r.launch_task_behind = request.options.as_ref().is_some_and(|o| o.task_behind);
		}

		if let Some(outcome) = self.check_app_switch(h, env, &request, &a, record, source, restricted_bg) {
			return Ok(outcome);
		}

		self.app_switch.on_start_did_app_switch();
		self.do_pending_activity_launches(h, env, false)?;

		let params = StartParams {
			record,
			source,
			voice_session: request.voice_session,
			start_flags: request.start_flags,
			do_resume: true,
			options: request.options.clone(),
			in_task: request.in_task,
			restricted_bg,
		};
		Starter::new(h, env, &self.config, params)?.run()
	}

	/// Defers or drops a start that would switch away from the resumed app
	/// while switches are stopped.
	#[allow(clippy::too_many_arguments, reason = "admission state is threaded through unchanged")]
	fn check_app_switch(
		&mut self,
		h: &mut Hierarchy,
		env: &Collaborators<'_>,
		request: &StartRequest,
		a: &Admission,
		record: RecordId,
		source: Option<RecordId>,
		restricted_bg: bool,
	) -> Option<LaunchOutcome> {
		if request.voice_session.is_some() {
			return None;
		}
		let focused = h.focused_stack();
		let resumed_uid = focused.and_then(|s| h.stack(s)).and_then(|s| s.resumed).and_then(|r| h.record(r)).map(|r| r.uid());
		if resumed_uid == Some(request.real_calling_uid) {
			return None;
		}
		let now = env.clock.now();
		if self
			.app_switch
			.check_allowed(now, env.permissions, (a.calling_pid, a.calling_uid), (request.real_calling_pid, request.real_calling_uid))
		{
			return None;
		}

		if restricted_bg && handle_background_abort(h, &self.config, record) {
			h.discard_record(record);
		} else {
			tracing::debug!(record = %record, "launch.app_switch: deferring start");
			self.pending.push(PendingActivityLaunch {
				record,
				source,
				start_flags: request.start_flags,
				stack: focused,
				caller: request.caller,
			});
		}
		Some(LaunchOutcome::bare(StartResult::SwitchesCanceled))
	}

	/// Swaps the start for the permission-review activity. Returns the
	/// review activity, or `None` when nothing handles the review intent.
	fn redirect_to_permission_review(
		&self,
		env: &Collaborators<'_>,
		a: &mut Admission,
		request: &StartRequest,
		result_needed: bool,
		package: &str,
		user: UserId,
	) -> Option<ActivityInfo> {
		let sender = env.packages.intent_sender(a.calling_package.as_deref().unwrap_or_default(), a.calling_uid, user, &a.intent);

		let mut flags = a.intent.flags | IntentFlags::EXCLUDE_FROM_RECENTS;
		if flags.intersects(IntentFlags::NEW_TASK | IntentFlags::NEW_DOCUMENT) {
			flags |= IntentFlags::MULTIPLE_TASK;
		}
		let mut review = Intent::new().with_action(ACTION_REVIEW_PERMISSIONS).with_flags(flags);
		review.put_extra(EXTRA_PACKAGE_NAME, ExtraValue::Str(package.to_owned()));
		review.put_extra(EXTRA_INTENT, ExtraValue::Sender(sender));
		if result_needed {
			review.put_extra(EXTRA_RESULT_NEEDED, ExtraValue::Bool(true));
		}
		a.intent = review;
		a.resolved_type = None;
		a.calling_uid = request.real_calling_uid;
		a.calling_pid = request.real_calling_pid;

		let filter_uid = compute_resolve_filter_uid(Some(a.calling_uid), request.real_calling_uid, request.filter_calling_uid);
		a.resolve = env.packages.resolve_intent(&a.intent, None, user, filter_uid);
		let info = env.packages.resolve_activity(&a.intent, a.resolve.as_ref(), request.start_flags, user)?;
		a.intent.component = Some(info.component.clone());
		tracing::info!(user = %user, intent = %a.intent, calling_uid = %a.calling_uid, "launch.start: START permission review");
		Some(info)
	}
}

fn supports_intent(env: &Collaborators<'_>, a: &Admission) -> bool {
	let Some(component) = &a.intent.component else {
		return false;
	};
	match env.packages.activity_supports_intent(component, &a.intent, a.resolved_type.as_deref()) {
		Ok(supported) => supported,
		Err(gone) => {
			tracing::warn!(%gone, "launch.start: failure checking voice capabilities");
			false
		}
	}
}

/// Intent for the instant-app installer standing in for `original`.
fn create_launch_intent(
	env: &Collaborators<'_>,
	auxiliary: &AuxiliaryResolveInfo,
	original: &Intent,
	calling_package: Option<&str>,
	resolved_type: Option<&str>,
	user: UserId,
) -> Intent {
	if auxiliary.needs_phase_two {
		env.packages.request_instant_app_phase_two(auxiliary, original, resolved_type, calling_package, user);
	}
	let mut sanitized = original.clone_filter();
	sanitized.component = None;
	let mut intent = Intent::for_component(auxiliary.installer.clone())
		.with_action(ACTION_INSTALL_INSTANT_APP_PACKAGE)
		.with_flags(original.flags);
	let installer_uid = Uid::SYSTEM;
	let package = calling_package.unwrap_or_default();
	let launch = env.packages.intent_sender(package, installer_uid, user, &sanitized);
	intent.put_extra(EXTRA_INTENT, ExtraValue::Sender(launch));
	if let Some(failure) = &auxiliary.failure_intent {
		let failure = env.packages.intent_sender(package, installer_uid, user, failure);
		intent.put_extra(INSTANT_APP_FAILURE_EXTRA, ExtraValue::Sender(failure));
	}
	if let Some(target) = original.component.as_ref().map(ComponentName::to_string) {
		intent.put_extra(EXTRA_PACKAGE_NAME, ExtraValue::Str(target));
	}
	intent
}

/// Extra carrying the sender to fire when instant-app installation fails.
const INSTANT_APP_FAILURE_EXTRA: &str = "android.intent.extra.INSTANT_APP_FAILURE";
