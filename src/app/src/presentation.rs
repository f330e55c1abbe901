//! View model of the upgrade page, derived purely from the [`Model`].

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::types::{ErrorType, OsUpdaterMessage, UpdateState};

const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

/// What the shell renders
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub state: UpdateState,
    pub error: ErrorType,
    pub title: String,
    pub explanation: String,
    /// Percent of the current phase, 0 to 100
    pub progress: f64,
    pub last_message: String,
    pub transcript: Vec<String>,
    pub download_size: String,
    pub required_space: String,
    pub available_space: Option<String>,
    pub is_connected: bool,

    pub can_start_upgrade: bool,
    pub can_retry: bool,
    pub can_skip: bool,
    pub can_continue: bool,
    pub show_restart_wait: bool,
    pub ap_disconnect_dialog_enabled: bool,

    // Major OS version information for the burn dialog
    pub should_burn: bool,
    pub require_burn: bool,
    pub latest_os_version: Option<String>,
}

pub fn view(model: &Model) -> ViewModel {
    let (title, explanation) = describe(model);
    let os_updates = model.os_updates.as_ref();

    ViewModel {
        state: model.state,
        error: model.error,
        title: title.to_string(),
        explanation,
        progress: progress(model),
        last_message: model
            .last_message
            .as_ref()
            .and_then(OsUpdaterMessage::progress)
            .map(|payload| payload.message.clone())
            .unwrap_or_default(),
        transcript: model.transcript.iter().cloned().collect(),
        download_size: format_bytes(model.update_size.download_size),
        required_space: format_bytes(model.update_size.required_space),
        available_space: model.available_space.map(format_bytes),
        is_connected: model.is_connected,
        can_start_upgrade: can_start_upgrade(model),
        can_retry: model.error.is_set(),
        can_skip: can_skip(model),
        can_continue: model.state == UpdateState::Finished,
        show_restart_wait: model.state == UpdateState::WaitingForServer,
        ap_disconnect_dialog_enabled: model.ap_disconnect_dialog_enabled,
        should_burn: os_updates.is_some_and(|info| info.should_burn),
        require_burn: os_updates.is_some_and(|info| info.require_burn),
        latest_os_version: os_updates
            .map(|info| info.latest_os_version.clone())
            .filter(|version| !version.is_empty()),
    }
}

pub fn can_start_upgrade(model: &Model) -> bool {
    model.state == UpdateState::WaitingForUserInput && !model.error.is_set()
}

/// Skipping is offered on errors and before the system upgrade starts, never
/// while the web portal restarts.
pub fn can_skip(model: &Model) -> bool {
    (model.error.is_set() || model.state == UpdateState::WaitingForUserInput)
        && model.state != UpdateState::WaitingForServer
}

fn progress(model: &Model) -> f64 {
    if model.state == UpdateState::Finished {
        return 100.0;
    }

    model
        .last_message
        .as_ref()
        .and_then(OsUpdaterMessage::progress)
        .map(|payload| payload.percent.clamp(0.0, 100.0))
        .unwrap_or_default()
}

fn describe(model: &Model) -> (&'static str, String) {
    match model.state {
        UpdateState::None | UpdateState::Connect => (
            "Checking for updates",
            "Connecting to the update service...".to_string(),
        ),
        UpdateState::Reattaching => (
            "Resuming update",
            "An update is already in progress on your pi-top. Reconnecting to it...".to_string(),
        ),
        UpdateState::UpdatingSources => (
            "Checking for updates",
            "Updating the list of available software...".to_string(),
        ),
        UpdateState::PreparingWebPortal => (
            "Preparing update",
            "Checking for a new version of the pi-top web portal...".to_string(),
        ),
        UpdateState::PreparingSystemUpgrade => (
            "Preparing update",
            "Checking which packages can be updated...".to_string(),
        ),
        UpdateState::UpgradingWebPortal => (
            "Updating web portal",
            "Installing the latest version of the pi-top web portal...".to_string(),
        ),
        UpdateState::WaitingForServer => (
            "Restarting web portal",
            "The web portal is restarting. This page reloads once it is back.".to_string(),
        ),
        UpdateState::WaitingForUserInput => (
            "Updates available",
            format!(
                "Some packages need to be installed to keep your pi-top up to date. \
                 This downloads {} and needs {} of additional disk space. \
                 Press Update to continue.",
                format_bytes(model.update_size.download_size),
                format_bytes(model.update_size.required_space),
            ),
        ),
        UpdateState::UpgradingSystem => (
            "Updating your pi-top",
            "Installing updates. This can take a while, please keep your pi-top powered on."
                .to_string(),
        ),
        UpdateState::Finished => ("Up to date", "Your pi-top is up to date.".to_string()),
        UpdateState::Error => ("Something went wrong", describe_error(model)),
    }
}

fn describe_error(model: &Model) -> String {
    match model.error {
        ErrorType::NoSpaceAvailable => format!(
            "There is not enough space on your pi-top to install the updates. \
             They need {} but only {} are free. Free up some space and press Retry, \
             or skip updating for now.",
            format_bytes(model.update_size.total()),
            format_bytes(model.available_space.unwrap_or_default()),
        ),
        ErrorType::UpdaterAlreadyRunning => {
            "Another update is already running on your pi-top. Close any other \
             onboarding windows and press Retry."
                .to_string()
        }
        ErrorType::GenericError | ErrorType::None => {
            "There was a problem while updating your pi-top. Press Retry to try again, \
             or skip updating for now."
                .to_string()
        }
    }
}

/// Human readable size, base 1024 with at most one decimal (`102400` is `"100 kB"`)
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut rounded = (value * 10.0).round() / 10.0;
    if rounded >= 1024.0 && unit < UNITS.len() - 1 {
        rounded = (rounded / 1024.0 * 10.0).round() / 10.0;
        unit += 1;
    }

    if rounded.fract() == 0.0 {
        format!("{rounded:.0} {}", UNITS[unit])
    } else {
        format!("{rounded:.1} {}", UNITS[unit])
    }
}
