//! Wire types of the attendance backend's REST API
//!
//! All structs in this crate mirror the JSON bodies exchanged with the backend. Field names follow
//! the backend's (German) naming, so no renaming is required in most places.

mod timestamp;

pub mod attendance;
pub mod audit;
pub mod auth;
pub mod backup;
pub mod content;
pub mod personnel;
pub mod sessions;
pub mod settings;
pub mod statistics;
pub mod system;

pub use timestamp::Timestamp;

pub type SessionId = i32;
pub type PersonnelId = i32;
pub type AttendanceId = i32;
pub type AnnouncementId = i32;
pub type NewsId = i32;

use serde::{Deserialize, Serialize};

/// Generic confirmation body returned by most mutating endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body of the backend
///
/// For business errors, `detail` is a human-readable (German) string, meant to be shown to the
/// user. Request validation errors come with a structured list instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: serde_json::Value,
}

impl ErrorDetail {
    /// The user-facing error text, if the backend provided one
    pub fn text(&self) -> Option<&str> {
        self.detail.as_str()
    }
}
