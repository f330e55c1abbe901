//! Wire types of the `os-upgrade` WebSocket endpoint.
//!
//! Outbound commands are plain text tokens, inbound frames are JSON objects
//! tagged by `type` with the body under `payload`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Command tokens the client may send to the updater service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UpdaterCommand {
    GetState,
    UpdateSources,
    PrepareSystemUpgrade,
    PrepareWebPortalUpgrade,
    StartUpgrade,
    GetUpgradeSize,
    UseDefaultUpdater,
    UseLegacyUpdater,
}

impl UpdaterCommand {
    /// The text token sent over the socket
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetState => "state",
            Self::UpdateSources => "update_sources",
            Self::PrepareSystemUpgrade => "prepare",
            Self::PrepareWebPortalUpgrade => "prepare_web_portal",
            Self::StartUpgrade => "start",
            Self::GetUpgradeSize => "size",
            Self::UseDefaultUpdater => "default-updater-backend",
            Self::UseLegacyUpdater => "legacy-updater-backend",
        }
    }
}

impl fmt::Display for UpdaterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status carried by every updater message
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdaterStatus {
    Start,
    Finish,
    Error,
    #[default]
    Status,
}

/// Body of `UPDATE_SOURCES`, `OS_PREPARE_UPGRADE` and `OS_UPGRADE` messages
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressPayload {
    pub status: UpdaterStatus,
    #[serde(default)]
    pub percent: f64,
    #[serde(default)]
    pub message: String,
}

/// Download and disk requirements of a prepared upgrade, in bytes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSize {
    pub download_size: u64,
    pub required_space: u64,
}

impl UpdateSize {
    /// Nothing to download and nothing to install
    pub fn is_empty(&self) -> bool {
        self.download_size == 0 && self.required_space == 0
    }

    /// Total bytes the upgrade needs on disk
    pub fn total(&self) -> u64 {
        self.download_size.saturating_add(self.required_space)
    }

    /// The upgrade does not fit into `available` bytes
    pub fn exceeds(&self, available: u64) -> bool {
        available < self.total()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizePayload {
    pub size: UpdateSize,
    #[serde(default)]
    pub status: UpdaterStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatePayload {
    pub clients: u32,
    pub busy: bool,
    #[serde(default)]
    pub status: UpdaterStatus,
}

/// Discriminant of [`OsUpdaterMessage`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MessageKind {
    UpdateSources,
    PrepareUpgrade,
    Upgrade,
    Size,
    State,
}

/// Message received from the updater service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum OsUpdaterMessage {
    #[serde(rename = "UPDATE_SOURCES")]
    UpdateSources(ProgressPayload),
    #[serde(rename = "OS_PREPARE_UPGRADE")]
    PrepareUpgrade(ProgressPayload),
    #[serde(rename = "OS_UPGRADE")]
    Upgrade(ProgressPayload),
    #[serde(rename = "SIZE")]
    Size(SizePayload),
    #[serde(rename = "STATE")]
    State(StatePayload),
}

impl OsUpdaterMessage {
    /// Parse a raw text frame
    pub fn parse(frame: &str) -> Result<Self, String> {
        serde_json::from_str(frame).map_err(|e| format!("invalid updater frame: {e}"))
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::UpdateSources(_) => MessageKind::UpdateSources,
            Self::PrepareUpgrade(_) => MessageKind::PrepareUpgrade,
            Self::Upgrade(_) => MessageKind::Upgrade,
            Self::Size(_) => MessageKind::Size,
            Self::State(_) => MessageKind::State,
        }
    }

    pub fn status(&self) -> UpdaterStatus {
        match self {
            Self::UpdateSources(payload) | Self::PrepareUpgrade(payload) | Self::Upgrade(payload) => {
                payload.status
            }
            Self::Size(payload) => payload.status,
            Self::State(payload) => payload.status,
        }
    }

    /// Progress body, if this is one of the phase messages
    pub fn progress(&self) -> Option<&ProgressPayload> {
        match self {
            Self::UpdateSources(payload) | Self::PrepareUpgrade(payload) | Self::Upgrade(payload) => {
                Some(payload)
            }
            Self::Size(_) | Self::State(_) => None,
        }
    }

    /// An `ERROR` status on a phase or size message
    pub fn reports_error(&self) -> bool {
        !matches!(self, Self::State(_)) && self.status() == UpdaterStatus::Error
    }
}
