use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::confirm::ConfirmTemplate;
use crate::web::ui::error::AppError;
use crate::web::ui::flash::FlashType;
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::AppState;
use actix_web::web::{Html, Redirect};
use actix_web::{get, post, web, Either, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::system::{HealthStatus, UpdateResult, VersionInfo};
use log::info;
use std::str::FromStr;

#[get("/admin/system")]
async fn system_info(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let backend = state.backend();
    let (version, health) = futures::join!(backend.version_info(&admin.token), backend.health());
    let version = version?;

    let tmpl = SystemInfoTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "System",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::System),
        },
        version: &version,
        health: health.ok(),
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/system/{action}")]
async fn system_action_form(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let action: SystemAction = path.parse()?;

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: action.title(),
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::System),
        },
        question: action.question(),
        details: vec![],
        warning: Some(action.warning()),
        action_url: req.url_for("system_action", [action.path_name()])?,
        cancel_url: req.url_for_static("system_info")?,
        confirm_label: action.title(),
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/system/{action}")]
async fn system_action(
    path: web::Path<String>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<Either<Redirect, Html>, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let action: SystemAction = path.parse()?;
    info!("System action '{}' requested by {}", action.path_name(), admin.username);
    let redirect = req.url_for_static("system_info")?;
    let backend = state.backend();

    let result = match action {
        SystemAction::Update => {
            return match backend.update_system(&admin.token).await {
                Ok(result) => {
                    util::add_flash(
                        &req,
                        if result.success {
                            FlashType::Success
                        } else {
                            FlashType::Error
                        },
                        result.message.clone(),
                    );
                    let tmpl = UpdateResultTemplate {
                        base: BaseTemplateContext {
                            request: &req,
                            page_title: "System-Update",
                            admin: Some(&admin),
                            active_nav_button: Some(AdminNavButton::System),
                        },
                        result: &result,
                    };
                    Ok(Either::Right(Html::new(tmpl.render()?)))
                }
                Err(e) => util::create_action_response(Err::<(), _>(e).into(), "", redirect, &req)
                    .map(Either::Left),
            };
        }
        SystemAction::Restart => backend.restart(&admin.token).await,
        SystemAction::Reboot => backend.reboot(&admin.token).await,
    };
    let message = match &result {
        Ok(response) => response.message.clone(),
        Err(_) => String::new(),
    };
    let result: FormSubmitResult = result.into();
    util::create_action_response(result, &message, redirect, &req).map(Either::Left)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SystemAction {
    Update,
    Restart,
    Reboot,
}

impl SystemAction {
    fn path_name(&self) -> &'static str {
        match self {
            SystemAction::Update => "update",
            SystemAction::Restart => "restart",
            SystemAction::Reboot => "reboot",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            SystemAction::Update => "Update installieren",
            SystemAction::Restart => "Dienste neu starten",
            SystemAction::Reboot => "System neu starten",
        }
    }

    fn question(&self) -> &'static str {
        match self {
            SystemAction::Update => "Soll das System-Update jetzt installiert werden?",
            SystemAction::Restart => "Sollen die Dienste jetzt neu gestartet werden?",
            SystemAction::Reboot => "Soll das System jetzt neu gestartet werden?",
        }
    }

    fn warning(&self) -> &'static str {
        match self {
            SystemAction::Update => {
                "Während des Updates ist der Kiosk kurzzeitig nicht erreichbar."
            }
            SystemAction::Restart => "Der Kiosk ist für einige Sekunden nicht erreichbar.",
            SystemAction::Reboot => {
                "Der Rechner startet neu. Der Kiosk ist für einige Minuten nicht erreichbar."
            }
        }
    }
}

impl FromStr for SystemAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(SystemAction::Update),
            "restart" => Ok(SystemAction::Restart),
            "reboot" => Ok(SystemAction::Reboot),
            _ => Err(AppError::PageNotFound),
        }
    }
}

#[derive(Template)]
#[template(path = "admin_system_info.html")]
struct SystemInfoTemplate<'a> {
    base: BaseTemplateContext<'a>,
    version: &'a VersionInfo,
    /// None, if the health check failed
    health: Option<HealthStatus>,
}

impl SystemInfoTemplate<'_> {
    fn action_url(&self, action: &str) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("system_action_form", [action])?
            .to_string())
    }

    fn short_commit(&self) -> &str {
        let commit = self.version.current_commit.as_str();
        commit.get(..7).unwrap_or(commit)
    }
}

#[derive(Template)]
#[template(path = "admin_update_result.html")]
struct UpdateResultTemplate<'a> {
    base: BaseTemplateContext<'a>,
    result: &'a UpdateResult,
}

impl UpdateResultTemplate<'_> {
    fn back_url(&self) -> Result<String, AppError> {
        Ok(self.base.request.url_for_static("system_info")?.to_string())
    }
}
