use serde::{Deserialize, Serialize};

/// Response of `GET /os-updates`, used for the major version (burn) dialog
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OsUpdateInfo {
    #[serde(default)]
    pub should_burn: bool,
    #[serde(default)]
    pub require_burn: bool,
    #[serde(rename = "latestOSVersion", default)]
    pub latest_os_version: String,
    #[serde(default)]
    pub update: bool,
}
