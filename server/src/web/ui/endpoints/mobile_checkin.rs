//! Mobile check-in: the reduced kiosk on a phone, opened via the QR code of a session.
use crate::kiosk::qr::{MobileCheckin, INVALID_QR_CODE_MESSAGE};
use crate::kiosk::station::{DisplayMode, TransientMessage};
use crate::web::ui::base_template::BaseTemplateContext;
use crate::web::ui::error::AppError;
use crate::web::ui::util;
use crate::web::AppState;
use actix_web::http::header;
use actix_web::web::{Form, Query, Redirect};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use ffw_checkin_api_types::sessions::ActiveSession;
use serde::Deserialize;
use tokio::time::Instant;

#[get("/checkin")]
async fn mobile_checkin_page(
    state: web::Data<AppState>,
    query: Query<MobileCheckinQuery>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let checkin = MobileCheckin::resolve(state.backend(), query.token.as_deref()).await;
    let (kiosk_id, is_new) = util::kiosk_id_or_new(&req);

    let (token, session, message) = match checkin {
        MobileCheckin::Ready { token, session } => {
            state
                .hub
                .open_station(
                    &kiosk_id,
                    DisplayMode::Mobile {
                        token: token.clone(),
                    },
                    Instant::now(),
                )
                .await;
            let message = state
                .hub
                .registry
                .snapshot(&kiosk_id)
                .and_then(|station| station.message(Instant::now()).cloned());
            (token, Some(session), message)
        }
        MobileCheckin::Invalid => (String::new(), None, None),
    };

    let tmpl = MobileCheckinTemplate {
        base: BaseTemplateContext {
            request: &req,
            page_title: "Mobiler Check-in",
            admin: None,
            active_nav_button: None,
        },
        token: &token,
        session: session.as_ref(),
        message: message.as_ref(),
        invalid_message: INVALID_QR_CODE_MESSAGE,
        rendered_at: Instant::now(),
    };
    let mut response = HttpResponse::Ok();
    if is_new {
        response.cookie(util::create_kiosk_cookie(&kiosk_id));
    }
    Ok(response
        .content_type(header::ContentType::html())
        .body(tmpl.render()?))
}

#[post("/checkin/submit")]
async fn mobile_checkin_submit(
    state: web::Data<AppState>,
    data: Form<MobileCheckinFormData>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    if let Some(kiosk_id) = util::kiosk_id_from_cookie(&req) {
        state
            .hub
            .submit_mobile(&kiosk_id, &data.token, &data.number, Instant::now())
            .await;
    }
    let mut url = req.url_for_static("mobile_checkin_page")?;
    url.query_pairs_mut().append_pair("token", &data.token);
    Ok(Redirect::to(url.to_string()).see_other())
}

#[derive(Template)]
#[template(path = "mobile_checkin.html")]
struct MobileCheckinTemplate<'a> {
    base: BaseTemplateContext<'a>,
    token: &'a str,
    /// None, if the QR code is invalid
    session: Option<&'a ActiveSession>,
    message: Option<&'a TransientMessage>,
    invalid_message: &'a str,
    rendered_at: Instant,
}

impl MobileCheckinTemplate<'_> {
    fn message_millis_left(&self) -> u128 {
        self.message
            .map_or(0, |message| message.millis_left(self.rendered_at))
    }
}

#[derive(Deserialize)]
struct MobileCheckinQuery {
    token: Option<String>,
}

#[derive(Deserialize)]
struct MobileCheckinFormData {
    token: String,
    #[serde(default)]
    number: String,
}
