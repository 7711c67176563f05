use crate::backend::EndSessionAuthorization;
use crate::web::ui::base_template::{AdminNavButton, BaseTemplateContext};
use crate::web::ui::confirm::ConfirmTemplate;
use crate::web::ui::error::AppError;
use crate::web::ui::form_values::{FormValue, _FormValidSimpleValidate};
use crate::web::ui::sub_templates::form_inputs::{SelectEntry, SelectTemplate};
use crate::web::ui::util::{self, FormSubmitResult};
use crate::web::ui::validation::EventTypeName;
use crate::web::AppState;
use actix_web::web::{Form, Html, Query};
use actix_web::{get, post, web, HttpRequest, Responder};
use askama::Template;
use ffw_checkin_api_types::sessions::{EventType, SessionDetail, SessionSummary, SessionsQuery};
use ffw_checkin_api_types::SessionId;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const SESSIONS_PAGE_SIZE: u32 = 20;

#[get("/admin/sessions")]
async fn sessions_list(
    state: web::Data<AppState>,
    query: Query<SessionsListQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let query = query.into_inner();
    // One more than displayed, to find out if there is a next page
    let mut sessions = state
        .backend()
        .sessions(&SessionsQuery {
            active_only: query.filter == SessionFilter::Active,
            skip: query.page * SESSIONS_PAGE_SIZE,
            limit: SESSIONS_PAGE_SIZE + 1,
        })
        .await?;
    let has_next_page = sessions.len() > SESSIONS_PAGE_SIZE as usize;
    sessions.truncate(SESSIONS_PAGE_SIZE as usize);

    let tmpl = SessionsListTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Sessions",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Sessions),
        },
        sessions: &sessions,
        filter: query.filter,
        previous_page_url: match query.page {
            0 => None,
            page => Some(list_url(&req, query.filter, page - 1)?),
        },
        next_page_url: if has_next_page {
            Some(list_url(&req, query.filter, query.page + 1)?)
        } else {
            None
        },
    };
    Ok(Html::new(tmpl.render()?))
}

fn list_url(req: &HttpRequest, filter: SessionFilter, page: u32) -> Result<String, AppError> {
    let mut url = req.url_for_static("sessions_list")?;
    url.set_query(Some(&serde_urlencoded::to_string(SessionsListQuery {
        filter,
        page,
    })?));
    Ok(url.to_string())
}

#[get("/admin/sessions/new")]
async fn new_session_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let form_data = NewSessionFormData {
        event_type: EventTypeName(EventType::Uebungsdienst).into(),
    };
    let tmpl = NewSessionFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue Session",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Sessions),
        },
        form_data: &form_data,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/sessions/new")]
async fn new_session(
    state: web::Data<AppState>,
    data: Form<NewSessionFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let mut form_data = data.into_inner();
    let result: FormSubmitResult = match form_data.event_type.validate() {
        Some(event_type) => {
            let result = state
                .backend()
                .create_session(event_type.0, Some(&admin.token))
                .await;
            if result.is_ok() {
                state.hub.notify_admin_change().await;
            }
            result.into()
        }
        None => FormSubmitResult::ValidationError,
    };

    let tmpl = NewSessionFormTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Neue Session",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Sessions),
        },
        form_data: &form_data,
    };
    util::create_form_response(
        result,
        tmpl,
        "Session wurde gestartet.",
        req.url_for_static("sessions_list")?,
        &req,
    )
}

#[get("/admin/sessions/{session_id}")]
async fn session_detail(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let session = state.backend().session(path.into_inner()).await?;

    let tmpl = SessionDetailTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Session",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Sessions),
        },
        session: &session,
    };
    Ok(Html::new(tmpl.render()?))
}

#[get("/admin/sessions/{session_id}/end")]
async fn end_session_form(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let session = state.backend().session(path.into_inner()).await?;
    let id = session.id.to_string();

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Session beenden",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Sessions),
        },
        question: "Soll diese Session beendet werden?",
        details: session_details(&session),
        warning: Some("Alle noch anwesenden Personen werden automatisch ausgecheckt."),
        action_url: req.url_for("end_session", [&id])?,
        cancel_url: req.url_for("session_detail", [&id])?,
        confirm_label: "Session beenden",
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/sessions/{session_id}/end")]
async fn end_session(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let session_id = path.into_inner();
    let result = state
        .backend()
        .end_session(
            session_id,
            &EndSessionAuthorization::Admin(admin.token.clone()),
        )
        .await;
    if result.is_ok() {
        state.hub.notify_admin_change().await;
    }
    util::create_action_response(
        result.into(),
        "Session wurde beendet.",
        req.url_for("session_detail", [session_id.to_string()])?,
        &req,
    )
}

#[get("/admin/sessions/{session_id}/delete")]
async fn delete_session_form(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let session = state.backend().session(path.into_inner()).await?;
    let id = session.id.to_string();

    let tmpl = ConfirmTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Session löschen",
            admin: Some(&admin),
            active_nav_button: Some(AdminNavButton::Sessions),
        },
        question: "Soll diese Session endgültig gelöscht werden?",
        details: session_details(&session),
        warning: Some("Alle Anwesenheiten dieser Session werden ebenfalls gelöscht."),
        action_url: req.url_for("delete_session", [&id])?,
        cancel_url: req.url_for("session_detail", [&id])?,
        confirm_label: "Löschen",
        option: None,
    };
    Ok(Html::new(tmpl.render()?))
}

#[post("/admin/sessions/{session_id}/delete")]
async fn delete_session(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let result = state
        .backend()
        .delete_session(&admin.token, path.into_inner())
        .await;
    if result.is_ok() {
        state.hub.notify_admin_change().await;
    }
    util::create_action_response(
        result.into(),
        "Session wurde gelöscht.",
        req.url_for_static("sessions_list")?,
        &req,
    )
}

#[get("/admin/sessions/{session_id}/qr")]
async fn session_qr_code(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    util::extract_admin_session(&state, &req)?;
    let file = state.backend().session_qr_png(path.into_inner()).await?;
    Ok(util::binary_file_response(file, true))
}

#[get("/admin/sessions/{session_id}/pdf")]
async fn session_pdf(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let admin = util::extract_admin_session(&state, &req)?;
    let file = state
        .backend()
        .session_pdf(&admin.token, path.into_inner())
        .await?;
    Ok(util::binary_file_response(file, true))
}

fn session_details(session: &SessionDetail) -> Vec<String> {
    vec![
        format!("{} (#{})", session.event_type, session.id),
        format!("Beginn: {}", session.started_at.display_long()),
        format!(
            "Anwesenheiten: {} ({} noch anwesend)",
            session.attendances.len(),
            session.active_attendees()
        ),
    ]
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SessionFilter {
    Active,
    #[default]
    All,
}

#[derive(Serialize, Deserialize)]
struct SessionsListQuery {
    #[serde(default)]
    filter: SessionFilter,
    #[serde(default)]
    page: u32,
}

#[derive(Template)]
#[template(path = "admin_sessions_list.html")]
struct SessionsListTemplate<'a> {
    base: BaseTemplateContext<'a>,
    sessions: &'a [SessionSummary],
    filter: SessionFilter,
    previous_page_url: Option<String>,
    next_page_url: Option<String>,
}

impl SessionsListTemplate<'_> {
    fn shows_all(&self) -> bool {
        self.filter == SessionFilter::All
    }

    fn filter_url(&self, active_only: bool) -> Result<String, AppError> {
        let filter = if active_only {
            SessionFilter::Active
        } else {
            SessionFilter::All
        };
        list_url(self.base.request, filter, 0)
    }

    fn detail_url(&self, session: &SessionSummary) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for("session_detail", [session.id.to_string()])?
            .to_string())
    }
}

#[derive(Template)]
#[template(path = "admin_session_detail.html")]
struct SessionDetailTemplate<'a> {
    base: BaseTemplateContext<'a>,
    session: &'a SessionDetail,
}

impl SessionDetailTemplate<'_> {
    fn url_for_action(&self, name: &str) -> Result<String, AppError> {
        Ok(self
            .base
            .request
            .url_for(name, [self.session.id.to_string()])?
            .to_string())
    }
}

#[derive(Deserialize)]
struct NewSessionFormData {
    event_type: FormValue<EventTypeName>,
}

#[derive(Template)]
#[template(path = "admin_new_session.html")]
struct NewSessionFormTemplate<'a> {
    base: BaseTemplateContext<'a>,
    form_data: &'a NewSessionFormData,
}

impl NewSessionFormTemplate<'_> {
    fn event_type_entries(&self) -> Vec<SelectEntry<'static>> {
        EventType::ALL
            .iter()
            .map(|t| SelectEntry {
                value: Cow::Borrowed(t.name()),
                text: Cow::Borrowed(t.name()),
            })
            .collect()
    }
}
