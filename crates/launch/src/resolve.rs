//! Wait mode: the resolver looks the intent up itself before admission.

use foyer_primitives::intent::{ACTION_INSTALL_INSTANT_APP_PACKAGE, ACTION_RESOLVE_INSTANT_APP_PACKAGE, ACTION_VIEW, EXTRA_INTENT};
use foyer_primitives::{ActivityInfo, ComponentName, ExtraValue, Intent, StartResult};
use foyer_tasks::Hierarchy;

use crate::collaborators::{Collaborators, ProcessInfo};
use crate::controller::LaunchController;
use crate::error::{LaunchError, Result};
use crate::outcome::LaunchOutcome;
use crate::request::{StartRequest, compute_resolve_filter_uid};

/// Package hosting the heavy-weight switcher.
pub const HEAVY_WEIGHT_SWITCHER_PACKAGE: &str = "android";
/// Activity asking the user which heavy-weight process to keep.
pub const HEAVY_WEIGHT_SWITCHER_CLASS: &str = "com.android.internal.app.HeavyWeightSwitcherActivity";

const HEAVY_WEIGHT_HAS_RESULT: &str = "has_result";
const HEAVY_WEIGHT_CUR_APP: &str = "cur_app";
const HEAVY_WEIGHT_NEW_APP: &str = "new_app";

impl LaunchController {
	pub(crate) fn start_activity_may_wait(&mut self, h: &mut Hierarchy, env: &mut Collaborators<'_>, mut request: StartRequest) -> Result<LaunchOutcome> {
		if request.intent.has_file_descriptors {
			return Err(LaunchError::FileDescriptorsInIntent);
		}
		request.ephemeral_intent = Some(request.intent.clone());

		if is_installer_component_to_strip(env, &request.intent) {
			tracing::debug!(intent = %request.intent, "launch.wait: dropping instant app installer component");
			request.intent.component = None;
			request.component_specified = false;
		}

		let filter_uid = compute_resolve_filter_uid(Some(request.calling_uid), request.real_calling_uid, request.filter_calling_uid);
		request.resolve_info = env.packages.resolve_intent(&request.intent, request.resolved_type.as_deref(), request.user, filter_uid);
		request.activity_info = resolve_activity_into(env, &mut request);

		let config_will_change = request
			.global_config
			.as_ref()
			.is_some_and(|c| c.differs_from(&env.surface.global_configuration()));

		if let Some(heavy) = self.competing_heavy_weight_process(env, request.activity_info.as_ref()) {
			match redirect_to_heavy_weight_switcher(env, &mut request, &heavy) {
				Some(()) => tracing::info!(current = %heavy.name, intent = %request.intent, "launch.wait: switching heavy-weight process"),
				None => return Ok(LaunchOutcome::bare(StartResult::PermissionDenied)),
			}
		}

		let global_config = request.global_config;
		let outcome = self.start_activity(h, env, request)?;

		if config_will_change && let Some(config) = global_config {
			env.surface.update_configuration(config);
		}
		Ok(outcome)
	}

	/// Running heavy-weight process the target would have to replace, if any.
	fn competing_heavy_weight_process(&self, env: &Collaborators<'_>, info: Option<&ActivityInfo>) -> Option<ProcessInfo> {
		if !self.config.heavy_weight_feature {
			return None;
		}
		let info = info?;
		if !info.application.cant_save_state || info.process_name != info.package() {
			return None;
		}
		env.processes
			.heavy_weight_process()
			.filter(|heavy| heavy.uid != info.uid() || heavy.name != info.process_name)
	}
}

/// Explicit intents naming the instant-app installer are resolved like implicit ones.
fn is_installer_component_to_strip(env: &Collaborators<'_>, intent: &Intent) -> bool {
	let Some(component) = &intent.component else {
		return false;
	};
	let action = intent.action.as_deref();
	let plain_view = action == Some(ACTION_VIEW) && intent.data.is_none();
	let installer_action = matches!(action, Some(ACTION_INSTALL_INSTANT_APP_PACKAGE | ACTION_RESOLVE_INSTANT_APP_PACKAGE));
	!plain_view && !installer_action && env.packages.is_instant_app_installer_component(component)
}

/// Resolves the request's activity and pins the intent to it.
fn resolve_activity_into(env: &Collaborators<'_>, request: &mut StartRequest) -> Option<ActivityInfo> {
	let info = env
		.packages
		.resolve_activity(&request.intent, request.resolve_info.as_ref(), request.start_flags, request.user)?;
	request.intent.component = Some(info.component.clone());
	Some(info)
}

/// Replaces the start with the heavy-weight switcher. `None` when the
/// caller process is unknown.
fn redirect_to_heavy_weight_switcher(env: &Collaborators<'_>, request: &mut StartRequest, heavy: &ProcessInfo) -> Option<()> {
	let Some(info) = request.activity_info.clone() else {
		return Some(());
	};
	let app_calling_uid = match request.caller {
		Some(caller) => match env.processes.process_for_caller(caller) {
			Some(app) => app.uid,
			None => {
				tracing::warn!(caller = %caller, intent = %request.intent, "launch.wait: unable to find app for caller");
				return None;
			}
		},
		None => request.calling_uid,
	};
	let user = request.user;
	let target = env.packages.intent_sender(HEAVY_WEIGHT_SWITCHER_PACKAGE, app_calling_uid, user, &request.intent);

	let mut switcher = Intent::for_component(ComponentName::new(HEAVY_WEIGHT_SWITCHER_PACKAGE, HEAVY_WEIGHT_SWITCHER_CLASS)).with_flags(request.intent.flags);
	if request.request_code >= 0 {
		switcher.put_extra(HEAVY_WEIGHT_HAS_RESULT, ExtraValue::Bool(true));
	}
	switcher.put_extra(EXTRA_INTENT, ExtraValue::Sender(target));
	switcher.put_extra(HEAVY_WEIGHT_CUR_APP, ExtraValue::Str(heavy.name.clone()));
	switcher.put_extra(HEAVY_WEIGHT_NEW_APP, ExtraValue::Str(info.package().to_owned()));

	request.intent = switcher;
	request.resolved_type = None;
	request.caller = None;
	request.calling_uid = request.real_calling_uid;
	request.calling_pid = request.real_calling_pid;
	request.component_specified = true;

	let filter_uid = compute_resolve_filter_uid(Some(request.calling_uid), request.real_calling_uid, request.filter_calling_uid);
	request.resolve_info = env.packages.resolve_intent(&request.intent, None, user, filter_uid);
	request.activity_info = request.resolve_info.as_ref().map(|r| r.activity.clone());
	Some(())
}
