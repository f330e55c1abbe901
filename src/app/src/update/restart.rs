//! Waiting for the web portal to come back after it upgraded itself.
//!
//! The poller is a lease: its timer id is the only one whose ticks are
//! honoured, and probe results are tagged with it. Each tick first fetches the
//! page, then opens a throwaway socket; when both succeed the page is reloaded
//! exactly once.

use crux_core::{render::render, Command};
use log::{debug, info, warn};

use crate::events::{Event, RestartEvent, UpgradeEvent};
use crate::http_helpers::{build_url, process_status_response, NO_CACHE_HEADERS};
use crate::model::Model;
use crate::types::{ErrorType, ProbeStage, ServerRestartState};
use crate::{
    Effect, HttpCmd, NavigationCmd, SocketCmd, SocketOutput, TimerCmd, TimerOutput,
};

use super::{orchestrator, socket::UPGRADE_ENDPOINT};

/// Delay between the restart request and the first poll
pub const RESTART_START_DELAY_MS: u64 = 300;
pub const RESTART_POLL_INTERVAL_MS: u64 = 700;
/// Give up waiting for the web portal after this long
pub const RESTART_TIMEOUT_MS: u64 = 30_000;

/// Page the reload and the probe go to
pub fn reload_url(model: &Model) -> String {
    format!("{}?all", model.page_url)
}

/// Acquire a new poller lease and schedule its first tick
pub fn acquire(model: &mut Model) -> Command<Effect, Event> {
    let release = release(model);
    let lease = model.allocate_timer_id();
    model.server_restart = ServerRestartState::Polling {
        lease,
        started_at_ms: None,
        attempt: 0,
        probe: ProbeStage::Idle,
    };
    debug!("restart poller {lease} acquired");

    Command::all([release, schedule_tick(lease, RESTART_START_DELAY_MS)])
}

/// Release the poller lease, cancelling its timer
pub fn release(model: &mut Model) -> Command<Effect, Event> {
    let Some(lease) = model.server_restart.lease() else {
        return Command::done();
    };
    debug!("restart poller {lease} released");
    model.server_restart = ServerRestartState::Idle;

    TimerCmd::cancel(lease)
        .build()
        .then_send(|output| Event::Restart(RestartEvent::Tick(output)))
}

pub fn handle(event: RestartEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        RestartEvent::Tick(TimerOutput::Elapsed { id, now_ms }) => handle_tick(id, now_ms, model),
        RestartEvent::Tick(TimerOutput::Cancelled { .. }) => Command::done(),
        RestartEvent::PageProbeResponse { lease, result } => {
            handle_page_probe(lease, result, model)
        }
        RestartEvent::SocketProbeResponse { lease, output } => {
            handle_socket_probe(lease, output, model)
        }
    }
}

fn schedule_tick(lease: u64, millis: u64) -> Command<Effect, Event> {
    TimerCmd::start(lease, millis)
        .build()
        .then_send(|output| Event::Restart(RestartEvent::Tick(output)))
}

fn handle_tick(id: u64, now_ms: u64, model: &mut Model) -> Command<Effect, Event> {
    let url = build_url(&reload_url(model));

    let ServerRestartState::Polling {
        lease,
        started_at_ms,
        attempt,
        probe,
    } = &mut model.server_restart
    else {
        debug!("ignoring restart tick {id}, not polling");
        return Command::done();
    };
    if *lease != id {
        debug!("ignoring stale restart tick {id}");
        return Command::done();
    }

    let lease = *lease;
    let started = *started_at_ms.get_or_insert(now_ms);
    let elapsed = now_ms.saturating_sub(started);

    if elapsed >= RESTART_TIMEOUT_MS {
        warn!("web portal did not come back within {RESTART_TIMEOUT_MS} ms");
        let command = orchestrator::fail(model, ErrorType::GenericError);
        model.server_restart = ServerRestartState::TimedOut;
        return command;
    }

    *attempt += 1;
    let mut commands = vec![schedule_tick(lease, RESTART_POLL_INTERVAL_MS)];

    if *probe == ProbeStage::Idle {
        debug!("probing web portal, attempt {attempt} after {elapsed} ms");
        *probe = ProbeStage::Page;
        commands.push(probe_page(lease, url));
    }

    Command::all(commands)
}

fn probe_page(lease: u64, url: String) -> Command<Effect, Event> {
    let mut request = HttpCmd::get(url);
    for (name, value) in NO_CACHE_HEADERS {
        request = request.header(name, value);
    }

    request.build().then_send(move |result| {
        Event::Restart(RestartEvent::PageProbeResponse {
            lease,
            result: process_status_response("Probe web portal", result),
        })
    })
}

/// Probe stage of the poller holding `lease`
fn current_probe(model: &mut Model, lease: u64) -> Option<&mut ProbeStage> {
    match &mut model.server_restart {
        ServerRestartState::Polling {
            lease: current,
            probe,
            ..
        } if *current == lease => Some(probe),
        _ => None,
    }
}

fn handle_page_probe(
    lease: u64,
    result: Result<(), String>,
    model: &mut Model,
) -> Command<Effect, Event> {
    let Some(probe) = current_probe(model, lease) else {
        debug!("ignoring stale page probe of poller {lease}");
        return Command::done();
    };

    match result {
        Ok(()) => {
            *probe = ProbeStage::Socket;
            SocketCmd::probe(UPGRADE_ENDPOINT)
                .build()
                .then_send(move |output| {
                    Event::Restart(RestartEvent::SocketProbeResponse { lease, output })
                })
        }
        Err(e) => {
            debug!("web portal not reachable yet: {e}");
            *probe = ProbeStage::Idle;
            Command::done()
        }
    }
}

fn handle_socket_probe(
    lease: u64,
    output: SocketOutput,
    model: &mut Model,
) -> Command<Effect, Event> {
    let Some(probe) = current_probe(model, lease) else {
        debug!("ignoring stale socket probe of poller {lease}");
        return Command::done();
    };

    if output != SocketOutput::ProbeSucceeded {
        debug!("updater socket not reachable yet: {output:?}");
        *probe = ProbeStage::Idle;
        return Command::done();
    }

    let url = reload_url(model);
    info!("web portal is back, reloading {url}");
    let release = release(model);
    model.server_restart = ServerRestartState::Reloading;

    Command::all([
        release,
        NavigationCmd::reload(url)
            .build()
            .then_send(|output| Event::Upgrade(UpgradeEvent::Navigated(output))),
        render(),
    ])
}
