mod lifecycle;
mod orchestrator;
mod restart;
pub mod socket;
mod space;

pub use orchestrator::phase::{entry_command, reattach_phase};
pub use restart::{RESTART_POLL_INTERVAL_MS, RESTART_START_DELAY_MS, RESTART_TIMEOUT_MS};

use crux_core::Command;

use crate::events::Event;
use crate::model::Model;
use crate::Effect;

/// Main update dispatcher - routes events to domain-specific handlers
pub fn update(event: Event, model: &mut Model) -> Command<Effect, Event> {
    match event {
        Event::Upgrade(event) => lifecycle::handle(event, model),
        Event::Socket(event) => socket::handle(event, model),
        Event::Restart(event) => restart::handle(event, model),
    }
}
