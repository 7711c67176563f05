use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    pub filename: String,
    pub size: u64,
    pub created_at: String,
}

impl BackupFile {
    /// Human-readable file size
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit = 0;
        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", self.size, UNITS[0])
        } else {
            format!("{:.1} {}", size, UNITS[unit])
        }
    }
}

/// Response of `GET /backup/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupList {
    pub backups: Vec<BackupFile>,
}

/// Response of `POST /backup/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupCreated {
    pub message: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Body of `POST /backup/restore`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreRequest {
    pub filename: String,
}
