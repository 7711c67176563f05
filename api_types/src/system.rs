use serde::{Deserialize, Serialize};

/// Response of `GET /system/version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub current_version: String,
    #[serde(default)]
    pub current_commit: String,
    #[serde(default)]
    pub remote_available: bool,
    #[serde(default)]
    pub updates_available: bool,
    #[serde(default)]
    pub remote_commit: Option<String>,
    #[serde(default)]
    pub last_check: Option<String>,
}

/// Response of `POST /system/update`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub new_version: Option<String>,
    #[serde(default)]
    pub output: String,
}

/// Response of `GET /system/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}
