//! The kiosk: full-screen check-in terminal on the station's touch screen.
//!
//! The page is rendered on the server. `kiosk.js` re-fetches the panel fragment whenever an event
//! arrives on `/kiosk/events` and posts the keypad input and touch activity.
use crate::kiosk::events::KioskEvent;
use crate::kiosk::selection::SelectionState;
use crate::kiosk::station::{DisplayMode, TransientMessage};
use crate::kiosk::KioskView;
use crate::web::ui::base_template::BaseTemplateContext;
use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::error::UrlGenerationError;
use actix_web::http::header::{self, CacheControl, CacheDirective};
use actix_web::web::{Form, Html, Redirect};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use ffw_checkin_api_types::attendance::PresentPersonnel;
use ffw_checkin_api_types::content::{Announcement, News};
use ffw_checkin_api_types::sessions::{ActiveSession, EventType};
use ffw_checkin_api_types::SessionId;
use serde::Deserialize;
use tokio::time::Instant;

#[get("/kiosk")]
async fn kiosk_page(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let (kiosk_id, is_new) = util::kiosk_id_or_new(&req);
    state
        .hub
        .open_station(&kiosk_id, DisplayMode::Station, Instant::now())
        .await;
    let view = state
        .hub
        .view(&kiosk_id)
        .await
        .ok_or_else(|| AppError::InternalError("Kiosk station has vanished".to_owned()))?;
    let admin_logged_in = util::optional_admin_session(&state, &req).is_some();

    let tmpl = KioskTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Check-in",
            admin: None,
            active_nav_button: None,
        },
        panel: KioskPanelTemplate::new(&req, &view, admin_logged_in, Instant::now()),
    };
    let mut response = HttpResponse::Ok();
    if is_new {
        response.cookie(util::create_kiosk_cookie(&kiosk_id));
    }
    Ok(response
        .content_type(header::ContentType::html())
        .body(tmpl.render()?))
}

/// The dynamic part of the kiosk page. Answers with "410 Gone" when the station has been torn
/// down in the meantime, so that the browser reloads the whole page.
#[get("/kiosk/panel")]
async fn kiosk_panel(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let view = match util::kiosk_id_from_cookie(&req) {
        Some(kiosk_id) => state.hub.view(&kiosk_id).await,
        None => None,
    };
    let Some(view) = view else {
        return Ok(HttpResponse::Gone().finish());
    };
    let admin_logged_in = util::optional_admin_session(&state, &req).is_some();
    let tmpl = KioskPanelTemplate::new(&req, &view, admin_logged_in, Instant::now());
    Ok(HttpResponse::Ok()
        .content_type(header::ContentType::html())
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .body(tmpl.render()?))
}

#[post("/kiosk/submit")]
async fn kiosk_submit(
    state: web::Data<AppState>,
    data: Form<NumberFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        state
            .hub
            .submit(&kiosk_id, &data.number, Instant::now())
            .await;
    }
    redirect_to_kiosk(&req)
}

#[post("/kiosk/sessions/create")]
async fn kiosk_create_session(
    state: web::Data<AppState>,
    data: Form<EventTypeFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let event_type = EventType::from_name(&data.event_type).ok_or(AppError::PageNotFound)?;
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        let admin = util::optional_admin_session(&state, &req);
        state
            .hub
            .create_session(&kiosk_id, event_type, admin.as_ref(), Instant::now())
            .await;
    }
    redirect_to_kiosk(&req)
}

#[post("/kiosk/sessions/select")]
async fn kiosk_select_session(
    state: web::Data<AppState>,
    data: Form<SelectSessionFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        state
            .hub
            .choose_session(&kiosk_id, data.session_id, Instant::now());
    }
    redirect_to_kiosk(&req)
}

#[post("/kiosk/sessions/switch")]
async fn kiosk_switch_session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        state.hub.request_switch(&kiosk_id, Instant::now());
    }
    redirect_to_kiosk(&req)
}

#[post("/kiosk/sessions/cancel")]
async fn kiosk_cancel_creation(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        state.hub.cancel_creation(&kiosk_id, Instant::now());
    }
    redirect_to_kiosk(&req)
}

/// Keypad for entering the personnel number which authorizes ending the selected session
#[get("/kiosk/sessions/end")]
async fn kiosk_end_session_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let view = match util::kiosk_id_from_cookie(&req) {
        Some(kiosk_id) => state.hub.view(&kiosk_id).await,
        None => None,
    };
    let Some(view) = view else {
        return Ok(either_redirect_to_kiosk(&req)?);
    };
    let Some(session) = view.station.selection.selected() else {
        return Ok(either_redirect_to_kiosk(&req)?);
    };
    record_activity(&state, &req);
    let admin_logged_in = util::optional_admin_session(&state, &req).is_some();

    let tmpl = KioskEndSessionTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Session beenden",
            admin: None,
            active_nav_button: None,
        },
        session,
        admin_logged_in,
    };
    Ok(actix_web::Either::Right(Html::new(tmpl.render()?)))
}

#[post("/kiosk/sessions/end")]
async fn kiosk_end_session(
    state: web::Data<AppState>,
    data: Form<NumberFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        let admin = util::optional_admin_session(&state, &req);
        state
            .hub
            .end_session(&kiosk_id, &data.number, admin.as_ref(), Instant::now())
            .await;
    }
    redirect_to_kiosk(&req)
}

/// Touch activity of the kiosk user. Resets the idle timer or dismisses the screensaver.
#[post("/kiosk/activity")]
async fn kiosk_activity(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    record_activity(&state, &req);
    HttpResponse::NoContent().finish()
}

#[post("/kiosk/announcements/next")]
async fn kiosk_next_announcement(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    record_activity(&state, &req);
    state.hub.navigate_announcements(true, Instant::now());
    redirect_to_kiosk(&req)
}

#[post("/kiosk/announcements/prev")]
async fn kiosk_previous_announcement(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    record_activity(&state, &req);
    state.hub.navigate_announcements(false, Instant::now());
    redirect_to_kiosk(&req)
}

/// Server-sent events for the kiosk browser. See [KioskEvent] for the event names.
#[get("/kiosk/events")]
async fn kiosk_events(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let kiosk_id = util::kiosk_id_from_cookie(&req).ok_or(AppError::PageNotFound)?;
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        // Must not be buffered by the compression middleware
        .insert_header((header::CONTENT_ENCODING, "identity"))
        .insert_header(CacheControl(vec![CacheDirective::NoCache]))
        .streaming(state.hub.broadcaster.new_client(&kiosk_id)))
}

/// QR code for the mobile check-in into the given session
#[get("/kiosk/qr/{session_id}")]
async fn kiosk_qr_code(
    path: web::Path<SessionId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let file = state.backend().session_qr_png(path.into_inner()).await?;
    Ok(util::binary_file_response(file, false))
}

#[get("/kiosk/logo")]
async fn kiosk_logo(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let file = state.backend().station_logo().await?;
    Ok(util::binary_file_response(file, false))
}

fn redirect_to_kiosk(req: &HttpRequest) -> Result<Redirect, AppError> {
    Ok(Redirect::to(req.url_for_static("kiosk_page")?.to_string()).see_other())
}

fn either_redirect_to_kiosk(
    req: &HttpRequest,
) -> Result<actix_web::Either<Redirect, Html>, AppError> {
    Ok(actix_web::Either::Left(redirect_to_kiosk(req)?))
}

fn record_activity(state: &AppState, req: &HttpRequest) {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(req) {
        state.hub.record_activity(&kiosk_id, Instant::now());
    }
}

#[derive(Template)]
#[template(path = "kiosk.html")]
struct KioskTemplate<'a> {
    base: BaseTemplateContext<'a>,
    panel: KioskPanelTemplate<'a>,
}

impl KioskTemplate<'_> {
    fn event_names(&self) -> String {
        [
            KioskEvent::Presence,
            KioskEvent::Announcements,
            KioskEvent::News,
            KioskEvent::Screensaver,
        ]
        .iter()
        .map(|e| e.name())
        .collect::<Vec<_>>()
        .join(",")
    }
}

#[derive(Template)]
#[template(path = "kiosk_panel.html")]
pub struct KioskPanelTemplate<'a> {
    request: &'a HttpRequest,
    view: &'a KioskView,
    message: Option<&'a TransientMessage>,
    admin_logged_in: bool,
    rendered_at: Instant,
}

impl<'a> KioskPanelTemplate<'a> {
    pub fn new(
        request: &'a HttpRequest,
        view: &'a KioskView,
        admin_logged_in: bool,
        now: Instant,
    ) -> Self {
        Self {
            request,
            view,
            message: view.station.message(now),
            admin_logged_in,
            rendered_at: now,
        }
    }

    fn message_millis_left(&self) -> u128 {
        self.message
            .map_or(0, |message| message.millis_left(self.rendered_at))
    }

    fn url_for(&self, name: &str) -> Result<String, UrlGenerationError> {
        Ok(self.request.url_for_static(name)?.to_string())
    }

    fn url_for_qr_code(&self, session: &ActiveSession) -> Result<String, UrlGenerationError> {
        Ok(self
            .request
            .url_for("kiosk_qr_code", [session.id.to_string()])?
            .to_string())
    }

    fn is_loading(&self) -> bool {
        self.view.station.selection.state() == &SelectionState::Loading
    }

    fn choose_event_type(&self) -> bool {
        matches!(
            self.view.station.selection.state(),
            SelectionState::NoActiveSession | SelectionState::ChooseEventType { .. }
        )
    }

    fn can_cancel_creation(&self) -> bool {
        matches!(
            self.view.station.selection.state(),
            SelectionState::ChooseEventType { .. }
        ) && !self.view.station.selection.sessions().is_empty()
    }

    fn choose_session(&self) -> bool {
        self.view.station.selection.state() == &SelectionState::MultipleActive
    }

    fn selected(&self) -> Option<&ActiveSession> {
        self.view.station.selection.selected()
    }

    fn sessions(&self) -> &[ActiveSession] {
        self.view.station.selection.sessions()
    }

    fn present(&self) -> &[PresentPersonnel] {
        self.view.presence.personnel()
    }

    fn switchable(&self) -> bool {
        matches!(
            self.view.station.selection.state(),
            SelectionState::Selected {
                switchable: true,
                ..
            }
        )
    }

    fn event_types(&self) -> &'static [EventType] {
        &EventType::ALL
    }

    fn show_attendance_list(&self) -> bool {
        self.view.system_settings.kiosk_show_attendance_list
    }

    fn screensaver_active(&self) -> bool {
        self.view.station.idle.is_active()
    }

    fn show_logo(&self) -> bool {
        self.view.system_settings.screensaver_show_logo && self.view.station_settings.has_logo()
    }

    fn show_clock(&self) -> bool {
        self.view.system_settings.screensaver_show_clock
    }

    fn station_name(&self) -> &str {
        &self.view.station_settings.name
    }

    fn announcement(&self) -> Option<&Announcement> {
        self.view.announcement.as_ref()
    }

    fn can_navigate_announcements(&self) -> bool {
        self.view.announcement_count > 1
    }

    fn news(&self) -> Option<&News> {
        self.view.news.as_ref()
    }

    fn clock(&self) -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }
}

#[derive(Template)]
#[template(path = "kiosk_end_session.html")]
struct KioskEndSessionTemplate<'a> {
    base: BaseTemplateContext<'a>,
    session: &'a ActiveSession,
    admin_logged_in: bool,
}

#[derive(Deserialize)]
struct NumberFormData {
    #[serde(default)]
    number: String,
}

#[derive(Deserialize)]
struct EventTypeFormData {
    event_type: String,
}

#[derive(Deserialize)]
struct SelectSessionFormData {
    session_id: SessionId,
}
