use crux_core::{render::render, Command};
use log::{debug, info, warn};

use crate::events::{Event, SocketEvent};
use crate::model::Model;
use crate::types::{OsUpdaterMessage, UpdateState, UpdaterCommand};
use crate::{Effect, SocketCmd, SocketOutput, TimerCmd, TimerOutput};

use super::orchestrator;

/// Path of the updater WebSocket endpoint
pub const UPGRADE_ENDPOINT: &str = "/os-upgrade";

/// Delay before reconnecting after a socket error
pub const RECONNECT_BACKOFF_MS: u64 = 1000;

/// Open the session socket
pub fn connect() -> Command<Effect, Event> {
    SocketCmd::connect(UPGRADE_ENDPOINT)
        .build()
        .then_send(|output| match output {
            SocketOutput::Connected => Event::Socket(SocketEvent::Opened),
            SocketOutput::Failed { reason } => Event::Socket(SocketEvent::Error(reason)),
            other => Event::Socket(SocketEvent::Acknowledged(other)),
        })
}

pub fn send(command: UpdaterCommand) -> Command<Effect, Event> {
    debug!("sending updater command {command}");
    SocketCmd::send(command)
        .build()
        .then_send(|output| Event::Socket(SocketEvent::Acknowledged(output)))
}

pub fn close() -> Command<Effect, Event> {
    SocketCmd::close()
        .build()
        .then_send(|output| Event::Socket(SocketEvent::Acknowledged(output)))
}

/// Cancel a pending reconnect, if any
pub fn cancel_reconnect(model: &mut Model) -> Command<Effect, Event> {
    match model.reconnect_timer.take() {
        Some(id) => TimerCmd::cancel(id)
            .build()
            .then_send(|output| Event::Socket(SocketEvent::ReconnectDue(output))),
        None => Command::done(),
    }
}

pub fn handle(event: SocketEvent, model: &mut Model) -> Command<Effect, Event> {
    if !model.mounted {
        debug!("ignoring socket event after unmount: {event:?}");
        return Command::done();
    }

    match event {
        SocketEvent::Opened => handle_opened(model),
        SocketEvent::Message(frame) => handle_frame(&frame, model),
        SocketEvent::Error(reason) => handle_error(reason, model),
        SocketEvent::Closed => handle_closed(model),
        SocketEvent::Acknowledged(SocketOutput::Failed { reason }) => {
            warn!("socket operation failed: {reason}");
            Command::done()
        }
        SocketEvent::Acknowledged(_) => Command::done(),
        SocketEvent::ReconnectDue(output) => handle_reconnect_due(output, model),
    }
}

fn handle_opened(model: &mut Model) -> Command<Effect, Event> {
    info!("connected to updater service");
    model.is_connected = true;
    let cancel = cancel_reconnect(model);

    Command::all([cancel, send(UpdaterCommand::GetState), render()])
}

fn handle_frame(frame: &str, model: &mut Model) -> Command<Effect, Event> {
    match OsUpdaterMessage::parse(frame) {
        Ok(message) => orchestrator::handle_message(message, model),
        Err(e) => {
            warn!("dropping updater frame: {e}");
            Command::done()
        }
    }
}

fn handle_error(reason: String, model: &mut Model) -> Command<Effect, Event> {
    model.is_connected = false;

    if model.reconnect_timer.is_some() {
        debug!("socket error while reconnect is pending: {reason}");
        return Command::done();
    }

    warn!("updater socket error, reconnecting in {RECONNECT_BACKOFF_MS} ms: {reason}");
    let id = model.allocate_timer_id();
    model.reconnect_timer = Some(id);

    Command::all([
        TimerCmd::start(id, RECONNECT_BACKOFF_MS)
            .build()
            .then_send(|output| Event::Socket(SocketEvent::ReconnectDue(output))),
        render(),
    ])
}

fn handle_closed(model: &mut Model) -> Command<Effect, Event> {
    model.is_connected = false;

    // the close that follows an error is handled by the pending reconnect
    if model.reconnect_timer.is_some() {
        debug!("socket closed, reconnect pending");
        return render();
    }

    match model.state {
        UpdateState::Finished | UpdateState::WaitingForServer => {
            debug!("socket closed in {:?}", model.state);
            render()
        }
        _ if model.error.is_set() => render(),
        state => {
            warn!("updater socket closed unexpectedly in {state:?}");
            orchestrator::fail(model, crate::types::ErrorType::GenericError)
        }
    }
}

fn handle_reconnect_due(output: TimerOutput, model: &mut Model) -> Command<Effect, Event> {
    match output {
        TimerOutput::Elapsed { id, .. } if model.reconnect_timer == Some(id) => {
            model.reconnect_timer = None;
            info!("reconnecting to updater service");
            connect()
        }
        _ => Command::done(),
    }
}
