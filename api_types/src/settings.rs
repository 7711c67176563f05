use serde::{Deserialize, Serialize};

/// `GET|PUT /settings/firestation`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing)]
    pub logo_path: Option<String>,
}

impl StationSettings {
    pub fn has_logo(&self) -> bool {
        self.logo_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

pub const DEFAULT_SCREENSAVER_TIMEOUT_SECONDS: u32 = 300;

fn default_timeout() -> u32 {
    DEFAULT_SCREENSAVER_TIMEOUT_SECONDS
}

fn yes() -> bool {
    true
}

/// `GET|PUT /settings/system`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default)]
    pub kiosk_base_url: String,
    #[serde(default = "yes")]
    pub kiosk_show_attendance_list: bool,
    #[serde(default = "yes")]
    pub screensaver_enabled: bool,
    #[serde(default = "default_timeout")]
    pub screensaver_timeout: u32,
    #[serde(default = "yes")]
    pub screensaver_show_logo: bool,
    #[serde(default = "yes")]
    pub screensaver_show_clock: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            kiosk_base_url: String::new(),
            kiosk_show_attendance_list: true,
            screensaver_enabled: true,
            screensaver_timeout: DEFAULT_SCREENSAVER_TIMEOUT_SECONDS,
            screensaver_show_logo: true,
            screensaver_show_clock: true,
        }
    }
}

/// `GET|PUT /settings/backup`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(default)]
    pub backup_enabled: bool,
    #[serde(default)]
    pub backup_path: String,
    #[serde(default)]
    pub backup_schedule_time: String,
    #[serde(default)]
    pub backup_retention_days: u32,
}

/// Body of `POST /settings/backup/validate-path`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePathRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathValidation {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::SystemSettings;

    #[test]
    fn test_system_settings_defaults() {
        let settings: SystemSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SystemSettings::default());
        assert_eq!(settings.screensaver_timeout, 300);
    }
}
