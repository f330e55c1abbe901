use serde::{Deserialize, Serialize};

use super::protocol::UpdaterCommand;

/// Phase of the OS upgrade flow. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UpdateState {
    #[default]
    None,
    Connect,
    Reattaching,
    Error,
    WaitingForServer,
    UpdatingSources,
    PreparingWebPortal,
    PreparingSystemUpgrade,
    UpgradingWebPortal,
    WaitingForUserInput,
    UpgradingSystem,
    Finished,
}

impl UpdateState {
    /// Phases that belong to the system upgrade (as opposed to the web portal)
    pub fn is_system_phase(self) -> bool {
        matches!(
            self,
            Self::PreparingSystemUpgrade | Self::WaitingForUserInput | Self::UpgradingSystem
        )
    }

    /// Phases in which the updater service is actively driving work
    pub fn is_working(self) -> bool {
        matches!(
            self,
            Self::UpdatingSources
                | Self::PreparingWebPortal
                | Self::PreparingSystemUpgrade
                | Self::UpgradingWebPortal
                | Self::UpgradingSystem
        )
    }
}

/// User-visible error kinds. Anything but `None` forces [`UpdateState::Error`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorType {
    #[default]
    None,
    GenericError,
    NoSpaceAvailable,
    UpdaterAlreadyRunning,
}

impl ErrorType {
    pub fn is_set(self) -> bool {
        self != Self::None
    }
}

/// Updater backend announced to the service before `update_sources`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum UpdaterBackend {
    #[default]
    Default,
    Legacy,
}

impl UpdaterBackend {
    pub fn command(self) -> UpdaterCommand {
        match self {
            Self::Default => UpdaterCommand::UseDefaultUpdater,
            Self::Legacy => UpdaterCommand::UseLegacyUpdater,
        }
    }
}

/// Which probe of the restart poll is in flight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeStage {
    #[default]
    Idle,
    Page,
    Socket,
}

/// Progress of waiting for the web portal to come back after it upgraded itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServerRestartState {
    #[default]
    Idle,
    Polling {
        /// Timer id owned by the poller; ticks with another id are stale
        lease: u64,
        /// Shell clock reading of the first tick
        started_at_ms: Option<u64>,
        attempt: u32,
        probe: ProbeStage,
    },
    Reloading,
    TimedOut,
}

impl ServerRestartState {
    pub fn lease(&self) -> Option<u64> {
        match self {
            Self::Polling { lease, .. } => Some(*lease),
            _ => None,
        }
    }
}
