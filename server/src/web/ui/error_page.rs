//! This module provides functionality to generate nice-looking error pages for errors returned from
//! handler functions.
//!
//! This is achieved by an actix-web middleware that replaces the original HTTP response in the case
//! of an error. In contrast to rendering the error page in our [actix_web::ResponseError]
//! implementation, this allows us to access the HTTP Request, e.g. for generating URLs to static
//! files and other pages.
use crate::web::ui::base_template::BaseTemplateContext;
use crate::web::ui::endpoints::auth::LoginQueryData;
use crate::web::ui::error::AppError;
use actix_web::body::EitherBody;
use actix_web::http::header::{HeaderValue, LOCATION};
use actix_web::http::{Method, StatusCode};
use actix_web::web::Html;
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use askama::Template;

/// An actix-web middleware for generating nice error pages
///
/// The middleware replaces the existing HTTP response (typically generated from the error's
/// ResponseError implementation) with a nice error page, when an error has been returned by the
/// endpoint handler function. The nice error page is generated from askama templates, extending the
/// "base.html" template to keep the application's look & feel. In case, rendering the template
/// fails, we fall back to a plain text representation of the error.
///
/// An [AppError::NotAuthenticated] is answered with a redirect to the admin login form, which
/// leads back to the requested page after the login.
pub async fn error_page_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<EitherBody<B, String>>, actix_web::Error> {
    let response = next.call(req).await?;

    let (req, res) = response.into_parts();
    let error_response = match res.error() {
        None => {
            return Ok(actix_web::dev::ServiceResponse::new(req, res)
                .map_body(|_, body| EitherBody::left(body)))
        }
        Some(error) => match error.as_error::<AppError>() {
            Some(AppError::NotAuthenticated) => generate_login_redirect(&req),
            Some(app_error) => generate_app_error_page(app_error, &req),
            None => generate_generic_error_page(error.as_response_error(), &req),
        },
    };
    Ok(actix_web::dev::ServiceResponse::new(
        req,
        error_response.map_body(|_, body| EitherBody::right(body)),
    ))
}

fn generate_login_redirect(http_request: &HttpRequest) -> HttpResponse<String> {
    let location = login_url_for(http_request).unwrap_or_else(|_| "/admin/login".to_owned());
    let mut response = HttpResponse::with_body(StatusCode::SEE_OTHER, String::new());
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

fn login_url_for(http_request: &HttpRequest) -> Result<String, AppError> {
    let mut url = http_request.url_for_static("login_form")?;
    // Only GET requests can be repeated after the login
    if http_request.method() == Method::GET {
        let redirect_to = match http_request.uri().query() {
            Some(query) => format!("{}?{}", http_request.path(), query),
            None => http_request.path().to_owned(),
        };
        url.set_query(Some(&serde_urlencoded::to_string(LoginQueryData {
            redirect_to: Some(redirect_to),
        })?));
    }
    Ok(url.to_string())
}

/// Generate a nice error page with additional information and help for the given [AppError].
fn generate_app_error_page(
    app_error: &AppError,
    http_request: &HttpRequest,
) -> HttpResponse<String> {
    let tmpl = AppErrorTemplate {
        base: BaseTemplateContext {
            request: http_request,
            page_title: "Fehler",
            admin: None,
            active_nav_button: None,
        },
        error: app_error,
        url: &http_request.full_url(),
        timestamp: chrono::Local::now(),
    };
    render_template_or_show_error_as_string(tmpl, app_error, http_request)
}

/// Generate a nice error page for the given `error`, using its string representation.
fn generate_generic_error_page(
    error: &dyn ResponseError,
    http_request: &HttpRequest,
) -> HttpResponse<String> {
    let tmpl = ErrorTemplate {
        base: BaseTemplateContext {
            request: http_request,
            page_title: "Fehler",
            admin: None,
            active_nav_button: None,
        },
        error,
        url: &http_request.full_url(),
        timestamp: chrono::Local::now(),
    };
    render_template_or_show_error_as_string(tmpl, error, http_request)
}

/// Try to render the given [askama::Template] structure and generate an HTTP response as an HTML
/// error page for the given error.
///
/// In case of an error while rendering the template, return a plain text HTTP response with the
/// error's string representation.
fn render_template_or_show_error_as_string(
    tmpl: impl Template,
    error: &dyn ResponseError,
    req: &HttpRequest,
) -> HttpResponse<String> {
    match tmpl.render() {
        Ok(body) => (Html::new(body), error.status_code()).respond_to(req),
        Err(err) => (
            format!(
                "Error: {}\n(Could not render nice error page: {})",
                error, err
            ),
            error.status_code(),
        )
            .respond_to(req),
    }
}

#[derive(Debug, Template)]
#[template(path = "app_error.html")]
struct AppErrorTemplate<'a> {
    base: BaseTemplateContext<'a>,
    error: &'a AppError,
    url: &'a url::Url,
    timestamp: chrono::DateTime<chrono::Local>,
}

impl AppErrorTemplate<'_> {
    fn is_not_found(&self) -> bool {
        matches!(self.error, AppError::PageNotFound | AppError::EntityNotFound)
    }

    fn is_backend_unavailable(&self) -> bool {
        matches!(self.error, AppError::BackendUnavailable(_))
    }

    fn is_permission_denied(&self) -> bool {
        matches!(self.error, AppError::PermissionDenied)
    }
}

#[derive(Debug, Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    base: BaseTemplateContext<'a>,
    error: &'a dyn ResponseError,
    url: &'a url::Url,
    timestamp: chrono::DateTime<chrono::Local>,
}
