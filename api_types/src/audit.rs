use crate::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditUser {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub user: AuditUser,
    pub action: String,
    pub entity_type: String,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub changes: Option<serde_json::Value>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl AuditEntry {
    /// Compact JSON representation of the recorded changes
    pub fn changes_text(&self) -> String {
        match &self.changes {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(value) => value.to_string(),
        }
    }
}

/// Response of `GET /audit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub logs: Vec<AuditEntry>,
}

/// Query parameters of `GET /audit`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub const AUDIT_PAGE_SIZE: u64 = 50;

fn default_limit() -> u64 {
    AUDIT_PAGE_SIZE
}
