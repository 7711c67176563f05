use crate::auth_session::AdminSession;
use crate::backend::BackendError;
use crate::web::ui::base_template::BaseTemplateContext;
use crate::web::ui::error::AppError;
use crate::web::ui::flash::FlashType;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::http::header;
use actix_web::web::{Form, Html, Query};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use log::info;
use serde::{Deserialize, Serialize};

#[get("/admin/login")]
async fn login_form(
    query: Query<LoginQueryData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let tmpl = LoginFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Admin-Login",
            admin: None,
            active_nav_button: None,
        },
        login_url: login_url(&req, &query)?,
        username: "",
        error: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/login")]
async fn login(
    state: web::Data<AppState>,
    query: Query<LoginQueryData>,
    data: Form<LoginFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let data = data.into_inner();
    let error = match state.backend().login(data.username.trim(), &data.password).await {
        Ok(response) => {
            info!("Admin user '{}' logged in", response.user.username);
            let session = AdminSession::new(
                response.access_token,
                response.user.username,
                response.user.role,
            );
            util::add_flash(
                &req,
                FlashType::Success,
                format!("Angemeldet als {}.", session.username),
            );
            let redirect_to = match query.into_inner().redirect_to {
                Some(target) if is_local_path(&target) => target,
                _ => req.url_for_static("admin_dashboard")?.to_string(),
            };
            return Ok(HttpResponse::SeeOther()
                .cookie(util::create_session_cookie(&session, &state.secret))
                .insert_header((header::LOCATION, redirect_to))
                .finish());
        }
        Err(BackendError::Unauthenticated) => "Benutzername oder Passwort ist falsch.",
        Err(e @ BackendError::Rejected { .. }) | Err(e @ BackendError::PermissionDenied { .. }) => {
            info!("Login rejected by backend: {}", e);
            "Login wurde vom Server abgelehnt."
        }
        Err(e) => return Err(e.into()),
    };

    let tmpl = LoginFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Admin-Login",
            admin: None,
            active_nav_button: None,
        },
        login_url: login_url(&req, &query)?,
        username: data.username.trim(),
        error: Some(error),
    };
    Ok(HttpResponse::UnprocessableEntity()
        .content_type(header::ContentType::html())
        .body(tmpl.render()?))
}

#[post("/admin/logout")]
async fn logout(req: HttpRequest) -> Result<impl Responder, AppError> {
    util::add_flash(&req, FlashType::Info, "Abgemeldet.");
    Ok(HttpResponse::SeeOther()
        .cookie(util::removal_session_cookie())
        .insert_header((
            header::LOCATION,
            req.url_for_static("login_form")?.to_string(),
        ))
        .finish())
}

fn login_url(req: &HttpRequest, query: &LoginQueryData) -> Result<url::Url, AppError> {
    let mut url = req.url_for_static("login")?;
    if query.redirect_to.is_some() {
        url.set_query(Some(&serde_urlencoded::to_string(query)?));
    }
    Ok(url)
}

/// Only redirect to paths on this server after the login
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//")
}

#[derive(Template)]
#[template(path = "login_form.html")]
struct LoginFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    login_url: url::Url,
    username: &'a str,
    error: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoginFormData {
    username: String,
    password: String,
}

#[derive(Default, Serialize, Deserialize)]
pub struct LoginQueryData {
    pub redirect_to: Option<String>,
}
