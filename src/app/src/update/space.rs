use crux_core::{render::render, Command};
use log::warn;

use crate::events::Event;
use crate::model::Model;
use crate::types::ErrorType;
use crate::Effect;

use super::orchestrator;

/// Force `NoSpaceAvailable` when the upgrade does not fit on disk.
///
/// Returns `None` while space suffices or is unknown. Runs whenever the
/// upgrade size or the available space changes.
pub fn enforce(model: &mut Model) -> Option<Command<Effect, Event>> {
    if !model.is_space_exhausted() {
        return None;
    }
    if model.error == ErrorType::NoSpaceAvailable {
        return Some(render());
    }

    warn!(
        "not enough space for upgrade: {} bytes needed, {:?} available",
        model.update_size.total(),
        model.available_space
    );
    Some(orchestrator::fail(model, ErrorType::NoSpaceAvailable))
}
