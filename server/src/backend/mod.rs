//! Typed client for the attendance REST backend
//!
//! All data shown by the kiosk and the admin interface is owned by the external backend. The
//! primary entry point to this module is the function [get_backend_from_env], which returns an
//! [http::HttpBackend] talking to the backend at the "BACKEND_URL". Handlers and background tasks
//! only use the [AttendanceBackend] trait, so that the [mock::BackendMock] can be used in unittests.
//!
//! Entities which are read by every kiosk page (settings, announcements, news) are cached by the
//! [cache::EntityCache], which has an explicit invalidation hook.

use crate::cli_error::CliError;
use crate::setup;
use async_trait::async_trait;
use ffw_checkin_api_types::attendance::{
    AttendanceRequest, CheckInResponse, CheckOutResponse, PresentPersonnel, TokenValidation,
};
use ffw_checkin_api_types::audit::{AuditFilter, AuditPage};
use ffw_checkin_api_types::auth::{AdminUser, LoginResponse};
use ffw_checkin_api_types::backup::{BackupCreated, BackupFile};
use ffw_checkin_api_types::content::{Announcement, AnnouncementData, News, NewsData};
use ffw_checkin_api_types::personnel::{Personnel, PersonnelData};
use ffw_checkin_api_types::sessions::{
    ActiveSession, CreatedSession, EventType, SessionDetail, SessionSummary, SessionsQuery,
};
use ffw_checkin_api_types::settings::{
    BackupSettings, PathValidation, StationSettings, SystemSettings,
};
use ffw_checkin_api_types::statistics::{PersonnelYearly, UnitYearly};
use ffw_checkin_api_types::system::{HealthStatus, UpdateResult, VersionInfo};
use ffw_checkin_api_types::{
    AnnouncementId, MessageResponse, NewsId, PersonnelId, SessionId,
};
use futures::stream::BoxStream;
use std::fmt::{Display, Formatter};

pub mod cache;
pub mod http;
#[cfg(test)]
pub mod mock;

/// Get the [AttendanceBackend] implementation, according to the "BACKEND_URL" environment variable.
///
/// The BACKEND_URL must be the absolute URL of the backend's API root, e.g.
/// "http://localhost:8000/api/".
pub fn get_backend_from_env() -> Result<http::HttpBackend, CliError> {
    let base_url = setup::get_backend_url_from_env()?;
    let timeout = setup::get_backend_timeout_from_env()?;
    http::HttpBackend::new(base_url, timeout).map_err(|e| CliError::SetupError(e.to_string()))
}

/// Authorization for ending a session
#[derive(Debug, Clone, PartialEq)]
pub enum EndSessionAuthorization {
    /// Bearer token of a logged-in admin user
    Admin(String),
    /// Personnel number entered at the kiosk. The backend checks the person's rank.
    Personnel(String),
}

/// A binary file delivered by the backend, e.g. a PDF export or the station logo
#[derive(Debug, Clone)]
pub struct BinaryFile {
    pub content_type: String,
    /// File name from the backend's Content-Disposition header, if any
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Raw chunks of the backend's server-sent event stream
pub type EventStream = BoxStream<'static, Result<Vec<u8>, BackendError>>;

/// Interface to the attendance backend.
///
/// Methods taking a `token` require an admin session; the token is sent as bearer token. The backend
/// performs all permission checks.
#[async_trait]
pub trait AttendanceBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, BackendError>;
    async fn current_user(&self, token: &str) -> Result<AdminUser, BackendError>;

    /// All active sessions, including the persons currently present in each of them
    async fn active_sessions(&self) -> Result<Vec<ActiveSession>, BackendError>;
    async fn session_presence(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PresentPersonnel>, BackendError>;
    async fn check_in(&self, request: &AttendanceRequest)
        -> Result<CheckInResponse, BackendError>;
    async fn check_out(
        &self,
        request: &AttendanceRequest,
    ) -> Result<CheckOutResponse, BackendError>;
    async fn validate_qr_token(&self, token: &str) -> Result<TokenValidation, BackendError>;
    async fn create_session(
        &self,
        event_type: EventType,
        token: Option<&str>,
    ) -> Result<CreatedSession, BackendError>;
    async fn end_session(
        &self,
        session_id: SessionId,
        authorization: &EndSessionAuthorization,
    ) -> Result<MessageResponse, BackendError>;

    /// Currently valid announcements, sorted by priority (most urgent first)
    async fn active_announcements(&self) -> Result<Vec<Announcement>, BackendError>;
    async fn announcements(&self, token: &str) -> Result<Vec<Announcement>, BackendError>;
    async fn announcement(
        &self,
        token: &str,
        id: AnnouncementId,
    ) -> Result<Announcement, BackendError>;
    async fn create_announcement(
        &self,
        token: &str,
        data: &AnnouncementData,
    ) -> Result<(), BackendError>;
    async fn update_announcement(
        &self,
        token: &str,
        id: AnnouncementId,
        data: &AnnouncementData,
    ) -> Result<(), BackendError>;
    async fn delete_announcement(&self, token: &str, id: AnnouncementId)
        -> Result<(), BackendError>;

    /// News items; with `active_only`, expired and deactivated items are omitted
    async fn news(&self, active_only: bool) -> Result<Vec<News>, BackendError>;
    async fn news_item(&self, id: NewsId) -> Result<News, BackendError>;
    async fn create_news(&self, token: &str, data: &NewsData) -> Result<(), BackendError>;
    async fn update_news(&self, token: &str, id: NewsId, data: &NewsData)
        -> Result<(), BackendError>;
    async fn delete_news(&self, token: &str, id: NewsId) -> Result<(), BackendError>;

    async fn sessions(&self, query: &SessionsQuery) -> Result<Vec<SessionSummary>, BackendError>;
    async fn session(&self, id: SessionId) -> Result<SessionDetail, BackendError>;
    async fn delete_session(&self, token: &str, id: SessionId) -> Result<(), BackendError>;
    /// QR code (PNG) pointing to the mobile check-in for the session
    async fn session_qr_png(&self, id: SessionId) -> Result<BinaryFile, BackendError>;
    async fn session_pdf(&self, token: &str, id: SessionId) -> Result<BinaryFile, BackendError>;

    async fn personnel(
        &self,
        token: &str,
        active_only: bool,
    ) -> Result<Vec<Personnel>, BackendError>;
    async fn personnel_by_id(&self, token: &str, id: PersonnelId)
        -> Result<Personnel, BackendError>;
    async fn personnel_by_number(
        &self,
        token: &str,
        stammrollennummer: &str,
    ) -> Result<Personnel, BackendError>;
    async fn create_personnel(&self, token: &str, data: &PersonnelData)
        -> Result<(), BackendError>;
    async fn update_personnel(
        &self,
        token: &str,
        id: PersonnelId,
        data: &PersonnelData,
    ) -> Result<(), BackendError>;
    /// Deactivate the person, or delete the record with all attendances if `permanent` is set
    async fn delete_personnel(
        &self,
        token: &str,
        id: PersonnelId,
        permanent: bool,
    ) -> Result<(), BackendError>;

    async fn station_settings(&self) -> Result<StationSettings, BackendError>;
    async fn update_station_settings(
        &self,
        token: &str,
        settings: &StationSettings,
    ) -> Result<(), BackendError>;
    async fn station_logo(&self) -> Result<BinaryFile, BackendError>;
    async fn system_settings(&self) -> Result<SystemSettings, BackendError>;
    async fn update_system_settings(
        &self,
        token: &str,
        settings: &SystemSettings,
    ) -> Result<(), BackendError>;
    async fn backup_settings(&self, token: &str) -> Result<BackupSettings, BackendError>;
    async fn update_backup_settings(
        &self,
        token: &str,
        settings: &BackupSettings,
    ) -> Result<(), BackendError>;
    async fn validate_backup_path(
        &self,
        token: &str,
        path: &str,
    ) -> Result<PathValidation, BackendError>;

    async fn create_backup(&self, token: &str) -> Result<BackupCreated, BackendError>;
    async fn backups(&self, token: &str) -> Result<Vec<BackupFile>, BackendError>;
    async fn download_backup(&self, token: &str, filename: &str)
        -> Result<BinaryFile, BackendError>;
    async fn restore_backup(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<MessageResponse, BackendError>;
    async fn delete_backup(&self, token: &str, filename: &str)
        -> Result<MessageResponse, BackendError>;

    async fn audit_log(&self, token: &str, filter: &AuditFilter)
        -> Result<AuditPage, BackendError>;
    async fn audit_actions(&self, token: &str) -> Result<Vec<String>, BackendError>;
    async fn audit_entity_types(&self, token: &str) -> Result<Vec<String>, BackendError>;

    async fn unit_yearly(&self, token: &str, year: i32) -> Result<UnitYearly, BackendError>;
    async fn unit_yearly_pdf(&self, token: &str, year: i32) -> Result<BinaryFile, BackendError>;
    async fn personnel_yearly(
        &self,
        token: &str,
        id: PersonnelId,
        year: i32,
    ) -> Result<PersonnelYearly, BackendError>;
    async fn personnel_yearly_pdf(
        &self,
        token: &str,
        id: PersonnelId,
        year: i32,
    ) -> Result<BinaryFile, BackendError>;

    async fn version_info(&self, token: &str) -> Result<VersionInfo, BackendError>;
    async fn update_system(&self, token: &str) -> Result<UpdateResult, BackendError>;
    async fn restart(&self, token: &str) -> Result<MessageResponse, BackendError>;
    async fn reboot(&self, token: &str) -> Result<MessageResponse, BackendError>;
    async fn health(&self) -> Result<HealthStatus, BackendError>;

    /// Ask the backend to notify all kiosks about changed data
    async fn refresh_kiosk(&self) -> Result<(), BackendError>;
    /// Subscribe to the backend's server-sent event stream
    async fn event_stream(&self) -> Result<EventStream, BackendError>;
}

#[derive(Debug)]
pub enum BackendError {
    /// The backend could not be reached or did not answer in time. See string description for
    /// details.
    ConnectionError(String),
    /// The requested entity does not exist (HTTP 404). Some endpoints describe the missing entity
    /// in the `detail`, e.g. an unknown personnel number.
    NotExisting { detail: Option<String> },
    /// The backend refused the request with a business error (HTTP 4xx). The `detail` is meant to
    /// be shown to the user.
    Rejected { status: u16, detail: String },
    /// The request requires a (valid) admin token (HTTP 401)
    Unauthenticated,
    /// The authenticated user lacks a permission for this action (HTTP 403)
    PermissionDenied { detail: Option<String> },
    /// The response could not be deserialized. See string description for details.
    InvalidResponse(String),
    /// Any other unexpected status code, e.g. an internal error of the backend
    ServerError { status: u16, detail: Option<String> },
}

impl BackendError {
    /// Text for displaying this error to a user
    ///
    /// Expected business errors carry a German description from the backend. For all other
    /// failures, the given generic `fallback` text is returned.
    pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            BackendError::NotExisting {
                detail: Some(detail),
            }
            | BackendError::PermissionDenied {
                detail: Some(detail),
            }
            | BackendError::Rejected { detail, .. } => detail,
            _ => fallback,
        }
    }

    /// Whether this error is an expected answer of the backend to a well-formed request (as
    /// opposed to connection problems or internal failures)
    pub fn is_business_error(&self) -> bool {
        matches!(
            self,
            BackendError::NotExisting { .. }
                | BackendError::Rejected { .. }
                | BackendError::PermissionDenied { .. }
                | BackendError::Unauthenticated
        )
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::ConnectionError(e) => write!(f, "Could not reach backend: {}", e),
            BackendError::NotExisting { detail } => {
                write!(f, "Entity not found")?;
                if let Some(detail) = detail {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
            BackendError::Rejected { status, detail } => {
                write!(f, "Request rejected by backend (HTTP {}): {}", status, detail)
            }
            BackendError::Unauthenticated => write!(f, "Not authenticated at backend"),
            BackendError::PermissionDenied { .. } => write!(f, "Permission denied by backend"),
            BackendError::InvalidResponse(e) => write!(f, "Invalid response from backend: {}", e),
            BackendError::ServerError { status, detail } => {
                write!(f, "Backend failed with HTTP {}", status)?;
                if let Some(detail) = detail {
                    write!(f, ": {}", detail)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::BackendError;

    #[test]
    fn test_user_message() {
        const FALLBACK: &str = "Fehler beim Check-in/out";
        let rejected = BackendError::Rejected {
            status: 400,
            detail: "Bereits eingecheckt".to_owned(),
        };
        assert_eq!(rejected.user_message(FALLBACK), "Bereits eingecheckt");
        let not_found = BackendError::NotExisting {
            detail: Some("Personal nicht gefunden".to_owned()),
        };
        assert_eq!(not_found.user_message(FALLBACK), "Personal nicht gefunden");
        assert_eq!(
            BackendError::NotExisting { detail: None }.user_message(FALLBACK),
            FALLBACK
        );
        assert_eq!(
            BackendError::ConnectionError("timeout".to_owned()).user_message(FALLBACK),
            FALLBACK
        );
        assert_eq!(
            BackendError::ServerError {
                status: 500,
                detail: Some("Traceback".to_owned())
            }
            .user_message(FALLBACK),
            FALLBACK
        );
    }
}
