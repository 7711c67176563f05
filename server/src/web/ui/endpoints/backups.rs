use crate::backend::BackendError;
use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::confirm::ConfirmTemplate;
use crate::web::ui::error::AppError;
use crate::web::ui::flash::FlashType;
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::AppState;
use actix_web::web::{Html, Redirect};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::backup::BackupFile;
use ffw_checkin_api_types::{MessageResponse, Timestamp};
use lazy_static::lazy_static;

#[get("/admin/backups")]
async fn backups_list(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut backups = state.backend().backups(&admin.token).await?;
    backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let tmpl = BackupsListTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Backups",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Backups),
        },
        backups: &backups,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/backups/create")]
async fn create_backup(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let result = state.backend().create_backup(&admin.token).await;
    let redirect = req.url_for_static("backups_list")?;
    match result {
        Ok(created) => {
            let message = match created.filename {
                Some(filename) => format!("{}: {}", created.message, filename),
                None => created.message,
            };
            util::add_flash(&req, FlashType::Success, message);
            Ok(Redirect::to(redirect.to_string()).see_other())
        }
        Err(e) => util::create_action_response(Err::<(), _>(e).into(), "", redirect, &req),
    }
}

#[get("/admin/backups/{filename}/download")]
async fn download_backup(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let filename = checked_filename(path.into_inner())?;
    let mut file = state
        .backend()
        .download_backup(&admin.token, &filename)
        .await?;
    file.filename.get_or_insert(filename);
    Ok(util::binary_file_response(file, true))
}

#[get("/admin/backups/{filename}/restore")]
async fn restore_backup_form(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let backup = find_backup(&state, &admin.token, path.into_inner()).await?;

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Backup wiederherstellen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Backups),
        },
        question: "Soll dieses Backup wiederhergestellt werden?",
        details: backup_details(&backup),
        warning: Some(
            "Alle Daten werden durch den Stand des Backups ersetzt. Änderungen seit dem Backup \
            gehen verloren.",
        ),
        action_url: req.url_for("restore_backup", [&backup.filename])?,
        cancel_url: req.url_for_static("backups_list")?,
        confirm_label: "Wiederherstellen",
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/backups/{filename}/restore")]
async fn restore_backup(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let filename = checked_filename(path.into_inner())?;
    let result = state
        .backend()
        .restore_backup(&admin.token, &filename)
        .await;
    action_response_with_message(&state, result, req.url_for_static("backups_list")?, &req).await
}

#[get("/admin/backups/{filename}/delete")]
async fn delete_backup_form(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let backup = find_backup(&state, &admin.token, path.into_inner()).await?;

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Backup löschen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Backups),
        },
        question: "Soll dieses Backup gelöscht werden?",
        details: backup_details(&backup),
        warning: None,
        action_url: req.url_for("delete_backup", [&backup.filename])?,
        cancel_url: req.url_for_static("backups_list")?,
        confirm_label: "Löschen",
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/backups/{filename}/delete")]
async fn delete_backup(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let filename = checked_filename(path.into_inner())?;
    let result = state.backend().delete_backup(&admin.token, &filename).await;
    action_response_with_message(&state, result, req.url_for_static("backups_list")?, &req).await
}

/// Like [util::create_action_response], but with the backend's own success message
async fn action_response_with_message(
    state: &AppState,
    result: Result<MessageResponse, BackendError>,
    redirect: url::Url,
    req: &HttpRequest,
) -> Result<Redirect, AppError> {
    match result {
        Ok(response) => {
            state.hub.notify_admin_change().await;
            util::create_action_response(FormSubmitResult::Success, &response.message, redirect, req)
        }
        Err(e) => util::create_action_response(Err::<(), _>(e).into(), "", redirect, req),
    }
}

/// Backup file names are used as path segments of backend URLs
fn checked_filename(filename: String) -> Result<String, AppError> {
    lazy_static! {
        static ref RE: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();
    }
    if RE.is_match(&filename) && !filename.starts_with('.') {
        Ok(filename)
    } else {
        Err(AppError::PageNotFound)
    }
}

async fn find_backup(
    state: &AppState,
    token: &str,
    filename: String,
) -> Result<BackupFile, AppError> {
    let filename = checked_filename(filename)?;
    state
        .backend()
        .backups(token)
        .await?
        .into_iter()
        .find(|b| b.filename == filename)
        .ok_or(AppError::EntityNotFound)
}

fn backup_details(backup: &BackupFile) -> Vec<String> {
    vec![
        backup.filename.clone(),
        format!("Erstellt: {}", display_created_at(&backup.created_at)),
        format!("Größe: {}", backup.display_size()),
    ]
}

/// The backend reports the creation time as ISO string
fn display_created_at(created_at: &str) -> String {
    created_at
        .parse::<Timestamp>()
        .map(|t| t.display_long())
        .unwrap_or_else(|_| created_at.to_owned())
}

#[derive(Template)]
#[template(path = "admin_backups_list.html")]
struct BackupsListTemplate<'a> {
    base: BaseTemplateContext<'a>,
    backups: &'a [BackupFile],
}

impl BackupsListTemplate<'_> {
    fn url_for_backup(&self, name: &str, backup: &BackupFile) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(name, [&backup.filename])?
            .to_string())
    }

    fn created_at(&self, backup: &BackupFile) -> String {
        display_created_at(&backup.created_at)
    }

    fn create_url(&self) -> Result<String, AppError> {
        Ok(self.base.request.url_for_static("create_backup")?.to_string())
    }

    fn settings_url(&self) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for_static("backup_settings_form")?
            .to_string())
    }
}
