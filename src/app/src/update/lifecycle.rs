use crux_core::{render::render, Command};
use log::{debug, info, warn};

use crate::events::{Event, UpgradeEvent};
use crate::http_helpers::build_url;
use crate::model::Model;
use crate::presentation;
use crate::types::UpdateState;
use crate::{http_request, update_field, Effect, NavigationCmd};

use super::{orchestrator, restart, socket, space};

/// Handle page lifecycle, user actions and their HTTP responses
pub fn handle(event: UpgradeEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        UpgradeEvent::Mount { page_url, search } => handle_mount(page_url, &search, model),
        UpgradeEvent::Unmount => handle_unmount(model),
        UpgradeEvent::StartUpgrade => orchestrator::start_upgrade(model),
        UpgradeEvent::Retry {
            use_default_updater,
        } => orchestrator::retry(use_default_updater, model),
        UpgradeEvent::Skip => {
            if !presentation::can_skip(model) {
                warn!("skip not allowed in {:?}", model.state);
                return Command::done();
            }
            leave(model)
        }
        UpgradeEvent::Continue => {
            if model.state != UpdateState::Finished {
                warn!("continue not allowed in {:?}", model.state);
                return Command::done();
            }
            leave(model)
        }
        UpgradeEvent::AvailableSpaceResponse(result) => handle_available_space(result, model),
        UpgradeEvent::OsUpdatesResponse(Ok(info)) => update_field!(model.os_updates, Some(info)),
        UpgradeEvent::OsUpdatesResponse(Err(e)) => {
            warn!("major OS version check failed: {e}");
            Command::done()
        }
        UpgradeEvent::RestartServiceResponse(result) => {
            // the poller finds out on its own whether the restart happened
            if let Err(e) = result {
                warn!("restart of web portal service failed: {e}");
            }
            Command::done()
        }
        UpgradeEvent::Navigated(_) => Command::done(),
    }
}

fn handle_mount(page_url: String, search: &str, model: &mut Model) -> Command<Effect, Event> {
    let stop = release_timers(model);
    model.mount(page_url, search);
    info!(
        "upgrade page mounted at {} (checking web portal: {})",
        model.page_url, model.checking_web_portal
    );

    Command::all([
        stop,
        socket::connect(),
        http_request!(
            get text,
            Upgrade,
            UpgradeEvent,
            &build_url("/available-space"),
            AvailableSpaceResponse,
            u64
        ),
        render(),
    ])
}

fn handle_unmount(model: &mut Model) -> Command<Effect, Event> {
    if !model.mounted {
        return Command::done();
    }
    info!("upgrade page unmounted");
    let teardown = teardown(model);
    model.reset();

    Command::all([teardown, render()])
}

/// Leave the upgrade step for the next wizard page. The flow's outcome stays
/// in the model so the shell can still read it.
fn leave(model: &mut Model) -> Command<Effect, Event> {
    info!("leaving upgrade step in {:?}", model.state);
    let teardown = teardown(model);
    model.mounted = false;

    Command::all([
        teardown,
        NavigationCmd::next_page()
            .build()
            .then_send(|output| Event::Upgrade(UpgradeEvent::Navigated(output))),
        render(),
    ])
}

fn release_timers(model: &mut Model) -> Command<Effect, Event> {
    Command::all([socket::cancel_reconnect(model), restart::release(model)])
}

/// Cancel timers and close the socket
fn teardown(model: &mut Model) -> Command<Effect, Event> {
    let timers = release_timers(model);
    model.is_connected = false;

    Command::all([timers, socket::close()])
}

fn handle_available_space(result: Result<u64, String>, model: &mut Model) -> Command<Effect, Event> {
    match result {
        Ok(bytes) => {
            debug!("available space: {bytes} bytes");
            model.available_space = Some(bytes);
            space::enforce(model).unwrap_or_else(render)
        }
        Err(e) => {
            warn!("failed to get available space, space check disabled: {e}");
            Command::done()
        }
    }
}
