use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::web::Html;
use actix_web::{get, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::sessions::ActiveSession;

/// Overview of the running sessions with the persons currently present
#[get("/admin")]
async fn admin_dashboard(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    // Validates the token at the backend, so that an outdated session leads to the login page
    state.backend().current_user(&admin.token).await?;
    let sessions = state.backend().active_sessions().await?;

    let tmpl = DashboardTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Übersicht",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Dashboard),
        },
        sessions: &sessions,
        total_present: sessions.iter().map(|s| s.active_personnel.len()).sum(),
    };
    Ok(Html::new(tmpl.render()?))
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct DashboardTemplate<'a> {
    base: BaseTemplateContext<'a>,
    sessions: &'a [ActiveSession],
    total_present: usize,
}

impl DashboardTemplate<'_> {
    fn detail_url(&self, session: &ActiveSession) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("session_detail", [session.id.to_string()])?
            .to_string())
    }
}
