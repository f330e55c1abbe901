//! Pure phase rules of the upgrade flow.

use crate::types::{MessageKind, UpdateState, UpdaterCommand};

/// Command sent when entering `next`. Nothing is sent when resuming from
/// `Reattaching`, because the service is already driving that phase.
pub fn entry_command(previous: UpdateState, next: UpdateState) -> Option<UpdaterCommand> {
    if previous == UpdateState::Reattaching {
        return None;
    }

    match next {
        UpdateState::UpdatingSources => Some(UpdaterCommand::UpdateSources),
        UpdateState::PreparingWebPortal => Some(UpdaterCommand::PrepareWebPortalUpgrade),
        UpdateState::PreparingSystemUpgrade => Some(UpdaterCommand::PrepareSystemUpgrade),
        UpdateState::UpgradingWebPortal | UpdateState::UpgradingSystem => {
            Some(UpdaterCommand::StartUpgrade)
        }
        _ => None,
    }
}

/// Phase to resume while reattaching, given the best guess of the phase the
/// service was in (`prior`) and the type of a `STATUS` message.
///
/// Without an observed system phase, preparation and upgrade resume the web
/// portal phases.
///
/// `None` means the message tells nothing and reattaching continues.
pub fn reattach_phase(prior: UpdateState, kind: MessageKind) -> Option<UpdateState> {
    let system = prior.is_system_phase();

    match kind {
        MessageKind::UpdateSources => Some(UpdateState::UpdatingSources),
        MessageKind::PrepareUpgrade if system => Some(UpdateState::PreparingSystemUpgrade),
        MessageKind::PrepareUpgrade => Some(UpdateState::PreparingWebPortal),
        MessageKind::Upgrade if system => Some(UpdateState::UpgradingSystem),
        MessageKind::Upgrade => Some(UpdateState::UpgradingWebPortal),
        MessageKind::Size | MessageKind::State => {
            (prior.is_working() || prior == UpdateState::WaitingForUserInput).then_some(prior)
        }
    }
}
