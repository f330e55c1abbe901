//! Update state machine: reacts to classified updater messages and user actions.

pub mod phase;

use crux_core::{render::render, Command};
use log::{debug, info, warn};

use crate::events::Event;
use crate::http_helpers::build_url;
use crate::model::Model;
use crate::types::*;
use crate::{http_request, Effect};

use super::{restart, socket, space};

/// Route one updater message through the state machine.
///
/// All checks run against the phase the model was in when the message
/// arrived: error injection, entry protocol, reattachment, phase transitions.
pub fn handle_message(message: OsUpdaterMessage, model: &mut Model) -> Command<Effect, Event> {
    let snapshot = model.state;
    model.record_message(message.clone());

    if snapshot == UpdateState::Error {
        return render();
    }

    if message.reports_error() {
        warn!("updater reported an error: {:?}", message.kind());
        return fail(model, ErrorType::GenericError);
    }

    match message {
        OsUpdaterMessage::State(payload) => handle_state(snapshot, payload, model),
        message if snapshot == UpdateState::Reattaching => reattach(&message, model),
        OsUpdaterMessage::Size(payload) => handle_size(snapshot, payload.size, model),
        message => handle_progress(snapshot, &message, model),
    }
}

/// Entry protocol, answered by the service after `state`
fn handle_state(
    snapshot: UpdateState,
    payload: StatePayload,
    model: &mut Model,
) -> Command<Effect, Event> {
    if matches!(
        snapshot,
        UpdateState::WaitingForServer | UpdateState::Finished
    ) {
        debug!("ignoring state message in {snapshot:?}");
        return render();
    }

    if payload.clients >= 1 {
        warn!("updater already has {} client(s)", payload.clients);
        return fail(model, ErrorType::UpdaterAlreadyRunning);
    }

    if payload.busy {
        model.reattach_prior = reattach_guess(model);
        info!(
            "updater busy, reattaching (prior phase {:?})",
            model.reattach_prior
        );
        model.set_state(UpdateState::Reattaching);
        return render();
    }

    Command::all([
        socket::send(model.updater_backend.command()),
        enter_phase(model, UpdateState::UpdatingSources),
    ])
}

fn reattach_guess(model: &Model) -> UpdateState {
    match model.state {
        UpdateState::Reattaching => model.reattach_prior,
        state if state.is_working() || state == UpdateState::WaitingForUserInput => state,
        _ => UpdateState::None,
    }
}

fn reattach(message: &OsUpdaterMessage, model: &mut Model) -> Command<Effect, Event> {
    if message.status() != UpdaterStatus::Status {
        return render();
    }

    match phase::reattach_phase(model.reattach_prior, message.kind()) {
        Some(next) => enter_phase(model, next),
        None => render(),
    }
}

fn handle_progress(
    snapshot: UpdateState,
    message: &OsUpdaterMessage,
    model: &mut Model,
) -> Command<Effect, Event> {
    if message.status() != UpdaterStatus::Finish {
        return render();
    }

    match (snapshot, message.kind()) {
        (UpdateState::UpdatingSources, MessageKind::UpdateSources) => {
            let next = if model.checking_web_portal {
                UpdateState::PreparingWebPortal
            } else {
                UpdateState::PreparingSystemUpgrade
            };
            enter_phase(model, next)
        }
        (
            UpdateState::PreparingWebPortal | UpdateState::PreparingSystemUpgrade,
            MessageKind::PrepareUpgrade,
        ) => Command::all([socket::send(UpdaterCommand::GetUpgradeSize), render()]),
        (UpdateState::UpgradingWebPortal, MessageKind::Upgrade) => begin_server_restart(model),
        (UpdateState::UpgradingSystem, MessageKind::Upgrade) => {
            enter_phase(model, UpdateState::Finished)
        }
        _ => render(),
    }
}

fn handle_size(snapshot: UpdateState, size: UpdateSize, model: &mut Model) -> Command<Effect, Event> {
    let from_web_portal = match snapshot {
        UpdateState::PreparingWebPortal => true,
        UpdateState::PreparingSystemUpgrade => false,
        _ => return render(),
    };

    if !from_web_portal {
        model.update_size = size;
        if let Some(command) = space::enforce(model) {
            return command;
        }
    }

    let next = match (size.is_empty(), from_web_portal) {
        (true, true) => UpdateState::PreparingSystemUpgrade,
        (true, false) => UpdateState::Finished,
        (false, true) => UpdateState::UpgradingWebPortal,
        (false, false) => UpdateState::WaitingForUserInput,
    };
    if size.is_empty() {
        model.checking_web_portal = false;
    }

    enter_phase(model, next)
}

/// Switch phase and send its entry command
pub fn enter_phase(model: &mut Model, next: UpdateState) -> Command<Effect, Event> {
    let previous = model.state;
    model.set_state(next);
    info!("upgrade phase {previous:?} -> {next:?}");

    let mut commands = Vec::new();
    if let Some(command) = phase::entry_command(previous, next) {
        commands.push(socket::send(command));
    }
    if next == UpdateState::Finished {
        commands.push(http_request!(
            get json,
            Upgrade,
            UpgradeEvent,
            &build_url("/os-updates"),
            OsUpdatesResponse,
            OsUpdateInfo
        ));
    }
    commands.push(render());

    Command::all(commands)
}

/// The web portal upgraded itself: ask for its restart and wait for it
fn begin_server_restart(model: &mut Model) -> Command<Effect, Event> {
    model.ap_disconnect_dialog_enabled = false;
    let enter = enter_phase(model, UpdateState::WaitingForServer);
    let poll = restart::acquire(model);

    Command::all([
        enter,
        http_request!(
            post status,
            Upgrade,
            UpgradeEvent,
            &build_url("/restart-web-portal-service"),
            RestartServiceResponse,
            ()
        ),
        poll,
    ])
}

/// User confirmed the system upgrade
pub fn start_upgrade(model: &mut Model) -> Command<Effect, Event> {
    if model.state != UpdateState::WaitingForUserInput || model.error.is_set() {
        warn!("cannot start upgrade in {:?}", model.state);
        return Command::done();
    }

    enter_phase(model, UpdateState::UpgradingSystem)
}

/// Start over from `UpdatingSources`, optionally with the legacy updater backend
pub fn retry(use_default_updater: bool, model: &mut Model) -> Command<Effect, Event> {
    if !model.error.is_set() {
        warn!("nothing to retry in {:?}", model.state);
        return Command::done();
    }

    model.updater_backend = if use_default_updater {
        UpdaterBackend::Default
    } else {
        UpdaterBackend::Legacy
    };
    info!("retrying upgrade with {:?} updater backend", model.updater_backend);

    model.error = ErrorType::None;
    model.update_size = UpdateSize::default();
    model.checking_web_portal = true;
    let release = restart::release(model);

    if model.is_connected {
        return Command::all([
            release,
            socket::send(model.updater_backend.command()),
            enter_phase(model, UpdateState::UpdatingSources),
        ]);
    }

    // the entry protocol takes over once the socket is open again
    model.set_state(UpdateState::Connect);
    let reconnect = if model.reconnect_timer.is_some() {
        Command::done()
    } else {
        socket::connect()
    };

    Command::all([release, reconnect, render()])
}

/// Enter the error state and stop restart polling
pub fn fail(model: &mut Model, error: ErrorType) -> Command<Effect, Event> {
    let release = restart::release(model);
    model.raise_error(error);
    warn!("upgrade failed: {:?}", model.error);

    Command::all([release, render()])
}
