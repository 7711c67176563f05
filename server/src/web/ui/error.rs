use crate::auth_session::SessionError;
use crate::backend::BackendError;
use actix_web::error::UrlGenerationError;
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use std::fmt::{Display, Formatter};

/// Semantic error type for ui endpoint functions
///
/// The different enum items are meant to produce different descriptive and helpful error pages for
/// the user, with an appropriate HTTP status code.
///
/// The error pages are generated using the
/// [crate::web::ui::error_page::error_page_middleware] middleware, because actix-web's
/// ResponseError trait is quite restricted in what it can do. For [AppError::NotAuthenticated], the
/// middleware redirects to the login form instead.
#[derive(Debug)]
pub enum AppError {
    PageNotFound,
    EntityNotFound,
    /// No valid admin session. Either the session cookie is missing, invalid or expired, or the
    /// backend did not accept the stored token anymore.
    NotAuthenticated,
    PermissionDenied,
    BackendUnavailable(String),
    InternalError(String),
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::ConnectionError(e) => Self::BackendUnavailable(e),
            BackendError::NotExisting { .. } => Self::EntityNotFound,
            BackendError::Unauthenticated => Self::NotAuthenticated,
            BackendError::PermissionDenied { .. } => Self::PermissionDenied,
            BackendError::Rejected { status, detail } => Self::InternalError(format!(
                "Backend rejected request unexpectedly (HTTP {}): {}",
                status, detail
            )),
            BackendError::InvalidResponse(e) => {
                Self::InternalError(format!("Invalid response from backend: {}", e))
            }
            BackendError::ServerError { status, detail } => Self::BackendUnavailable(format!(
                "Backend failed with HTTP {}{}",
                status,
                detail.map(|d| format!(": {}", d)).unwrap_or_default()
            )),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(_value: SessionError) -> Self {
        AppError::NotAuthenticated
    }
}

impl From<askama::Error> for AppError {
    fn from(value: askama::Error) -> Self {
        AppError::InternalError(format!("Error while rendering template: {}", value))
    }
}

impl From<UrlGenerationError> for AppError {
    fn from(value: UrlGenerationError) -> Self {
        AppError::InternalError(format!("Could not generate URL: {}", value))
    }
}

impl From<serde_urlencoded::ser::Error> for AppError {
    fn from(value: serde_urlencoded::ser::Error) -> Self {
        AppError::InternalError(format!(
            "Error while serializing URL query parameters: {}",
            value
        ))
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::PageNotFound => write!(f, "Not found"),
            AppError::EntityNotFound => write!(f, "Entity not found"),
            AppError::NotAuthenticated => write!(f, "Admin login required"),
            AppError::PermissionDenied => {
                write!(f, "The logged-in user is not allowed to perform this action")
            }
            AppError::BackendUnavailable(e) => write!(f, "Backend is not available: {}", e),
            AppError::InternalError(e) => write!(f, "Internal program error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PageNotFound | AppError::EntityNotFound => StatusCode::NOT_FOUND,
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
