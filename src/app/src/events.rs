use serde::{Deserialize, Serialize};

use crate::commands::{navigation::NavigationOutput, socket::SocketOutput, timer::TimerOutput};
use crate::types::OsUpdateInfo;

/// Events that can happen in the app
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Event {
    Upgrade(UpgradeEvent),
    Socket(SocketEvent),

    // Internal, driven by the Core's own timers and probes
    #[serde(skip)]
    Restart(RestartEvent),
}

/// Page lifecycle and user actions of the upgrade step
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum UpgradeEvent {
    /// The upgrade page was shown. `search` is the page's query string.
    Mount {
        page_url: String,
        search: String,
    },
    Unmount,
    StartUpgrade,
    Retry {
        use_default_updater: bool,
    },
    Skip,
    Continue,

    // HTTP responses (internal events, skipped from serialization)
    #[serde(skip)]
    AvailableSpaceResponse(Result<u64, String>),
    #[serde(skip)]
    OsUpdatesResponse(Result<OsUpdateInfo, String>),
    #[serde(skip)]
    RestartServiceResponse(Result<(), String>),
    #[serde(skip)]
    Navigated(NavigationOutput),
}

/// Updater socket notifications, pushed by the Shell once connected
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    Error(String),
    Closed,

    #[serde(skip)]
    Acknowledged(SocketOutput),
    #[serde(skip)]
    ReconnectDue(TimerOutput),
}

/// Self-restart polling of the web portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartEvent {
    Tick(TimerOutput),
    PageProbeResponse { lease: u64, result: Result<(), String> },
    SocketProbeResponse { lease: u64, output: SocketOutput },
}
