use crate::auth_session::AdminSession;
use crate::backend::{BackendError, BinaryFile};
use crate::kiosk::station::KioskId;
use crate::web::ui::error::AppError;
use crate::web::ui::flash::{FlashMessage, FlashType, FlashesInterface};
use crate::web::AppState;
use actix_web::cookie::Cookie;
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::web::{Html, Redirect};
use actix_web::{Either, HttpRequest, HttpResponse};
use askama::Template;
use log::info;

pub const SESSION_COOKIE_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(30 * 86400);
pub const SESSION_COOKIE_NAME: &str = "ffw-checkin-admin";

#[allow(clippy::identity_op)] // We want to explicitly state that it's "1" year
pub const KIOSK_COOKIE_MAX_AGE: std::time::Duration =
    std::time::Duration::from_secs(1 * 86400 * 365);
pub const KIOSK_COOKIE_NAME: &str = "ffw-checkin-kiosk";

/// Extract the admin session from the session cookie and validate it
pub fn extract_admin_session(
    app_state: &AppState,
    request: &HttpRequest,
) -> Result<AdminSession, AppError> {
    let cookie = request
        .cookie(SESSION_COOKIE_NAME)
        .ok_or(AppError::NotAuthenticated)?;
    AdminSession::from_string(cookie.value(), &app_state.secret, SESSION_COOKIE_MAX_AGE)
        .map_err(|e| {
            info!("Rejected admin session cookie: {}", e);
            AppError::from(e)
        })
}

/// Like [extract_admin_session], but a missing or invalid session is not an error. Used by the
/// kiosk, which works without login.
pub fn optional_admin_session(app_state: &AppState, request: &HttpRequest) -> Option<AdminSession> {
    extract_admin_session(app_state, request).ok()
}

pub fn create_session_cookie(session: &AdminSession, secret: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, session.as_string(secret));
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_expires(actix_web::cookie::time::OffsetDateTime::now_utc() + SESSION_COOKIE_MAX_AGE);
    cookie
}

pub fn removal_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// The kiosk id of the requesting browser, if it has one already
pub fn kiosk_id_from_cookie(request: &HttpRequest) -> Option<KioskId> {
    request
        .cookie(KIOSK_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|id| uuid::Uuid::parse_str(id).is_ok())
}

/// The kiosk id of the requesting browser, or a new one. The bool is true, if the id is new and
/// the cookie must be set in the response.
pub fn kiosk_id_or_new(request: &HttpRequest) -> (KioskId, bool) {
    match kiosk_id_from_cookie(request) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    }
}

pub fn create_kiosk_cookie(kiosk_id: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(KIOSK_COOKIE_NAME, kiosk_id.to_owned());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_expires(actix_web::cookie::time::OffsetDateTime::now_utc() + KIOSK_COOKIE_MAX_AGE);
    cookie
}

/// Deliver a binary file received from the backend (PDF export, QR code, logo, backup)
pub fn binary_file_response(file: BinaryFile, as_attachment: bool) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response.insert_header((header::CONTENT_TYPE, file.content_type));
    if let Some(filename) = file.filename {
        response.insert_header(ContentDisposition {
            disposition: if as_attachment {
                DispositionType::Attachment
            } else {
                DispositionType::Inline
            },
            parameters: vec![DispositionParam::Filename(filename)],
        });
    }
    response.body(file.data)
}

pub fn add_flash(request: &HttpRequest, flash_type: FlashType, message: impl Into<String>) {
    request.add_flash_message(FlashMessage {
        flash_type,
        message: message.into(),
        keep_open: flash_type == FlashType::Error,
    });
}

/// Helper type for representing the different possible outcomes of submitting an admin form.
///
/// They are used to delegate creating appropriate response to [create_form_response()].
pub enum FormSubmitResult {
    Success,
    ValidationError,
    /// The backend refused the change with a message for the user
    Rejected(String),
    UnexpectedError(AppError),
}

impl<T> From<Result<T, BackendError>> for FormSubmitResult {
    fn from(value: Result<T, BackendError>) -> Self {
        match value {
            Ok(_) => FormSubmitResult::Success,
            Err(BackendError::Unauthenticated) => {
                FormSubmitResult::UnexpectedError(AppError::NotAuthenticated)
            }
            Err(e) if e.is_business_error() => {
                FormSubmitResult::Rejected(e.user_message("Die Änderung wurde abgelehnt.").to_owned())
            }
            Err(e) => FormSubmitResult::UnexpectedError(e.into()),
        }
    }
}

/// Generate the HTTP response for a submitted admin form.
///
/// On success, a flash message is added and the client is redirected to `success_redirect`. On
/// validation errors and rejections by the backend, the form is rendered again with the entered
/// values and an error flash message.
pub fn create_form_response(
    result: FormSubmitResult,
    tmpl: impl Template,
    success_message: &str,
    success_redirect: url::Url,
    request: &HttpRequest,
) -> Result<Either<Redirect, HttpResponse>, AppError> {
    match result {
        FormSubmitResult::Success => {
            add_flash(request, FlashType::Success, success_message);
            Ok(Either::Left(
                Redirect::to(success_redirect.to_string()).see_other(),
            ))
        }
        FormSubmitResult::ValidationError => {
            add_flash(
                request,
                FlashType::Error,
                "Eingegebene Daten sind ungültig. Bitte markierte Felder überprüfen.",
            );
            Ok(Either::Right(
                HttpResponse::UnprocessableEntity()
                    .content_type(header::ContentType::html())
                    .body(tmpl.render()?),
            ))
        }
        FormSubmitResult::Rejected(message) => {
            add_flash(request, FlashType::Error, message);
            Ok(Either::Right(
                HttpResponse::UnprocessableEntity()
                    .content_type(header::ContentType::html())
                    .body(tmpl.render()?),
            ))
        }
        FormSubmitResult::UnexpectedError(e) => Err(e),
    }
}

/// Generate the HTTP response for a confirmed action (delete, restore, restart, ...), which has
/// no form to render again: the result is reported as flash message on the `redirect` page.
pub fn create_action_response(
    result: FormSubmitResult,
    success_message: &str,
    redirect: url::Url,
    request: &HttpRequest,
) -> Result<Redirect, AppError> {
    match result {
        FormSubmitResult::Success => add_flash(request, FlashType::Success, success_message),
        FormSubmitResult::Rejected(message) => add_flash(request, FlashType::Error, message),
        FormSubmitResult::ValidationError => add_flash(
            request,
            FlashType::Error,
            "Eingegebene Daten sind ungültig.",
        ),
        FormSubmitResult::UnexpectedError(e) => return Err(e),
    }
    Ok(Redirect::to(redirect.to_string()).see_other())
}

/// Render a template into an HTML response
pub fn render(tmpl: impl Template) -> Result<Html, AppError> {
    Ok(Html::new(tmpl.render()?))
}
