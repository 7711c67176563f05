//! Flash messages: short notifications for the user, shown on the next rendered page.
//!
//! The messages are kept in the request's extensions while the request is handled and are
//! transported to the next request in the "flash" cookie (e.g. across a redirect after a successful
//! form submission).
use actix_web::cookie::Cookie;
use actix_web::http::header::{HeaderValue, SET_COOKIE};
use actix_web::{HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlashType {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashType {
    pub fn css_class(&self) -> &'static str {
        match self {
            FlashType::Success => "success",
            FlashType::Info => "info",
            FlashType::Warning => "warning",
            FlashType::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub flash_type: FlashType,
    pub message: String,
    /// If false, the message is faded out after a few seconds
    pub keep_open: bool,
}

struct Flashes {
    flashes: Vec<FlashMessage>,
}

const COOKIE_NAME: &str = "flash";

impl Flashes {
    fn from_cookie(request: &HttpRequest) -> Result<Self, serde_json::Error> {
        match request.cookie(COOKIE_NAME) {
            Some(cookie) => Ok(Flashes {
                flashes: serde_json::from_str(cookie.value())?,
            }),
            None => Ok(Flashes { flashes: vec![] }),
        }
    }

    fn into_cookie(self) -> Result<Cookie<'static>, serde_json::Error> {
        let mut result = Cookie::new(COOKIE_NAME, serde_json::to_string(&self.flashes)?);
        result.set_path("/");
        Ok(result)
    }
}

pub trait FlashesInterface {
    fn add_flash_message(&self, flash: FlashMessage);

    fn get_and_clear_flashes(&self) -> Vec<FlashMessage>;
}

impl FlashesInterface for HttpRequest {
    fn add_flash_message(&self, flash: FlashMessage) {
        if let Some(flashes) = self.extensions_mut().get_mut::<Flashes>() {
            flashes.flashes.push(flash);
            return;
        }
        // Must not be within the `if let` statement to avoid panicking of the `extensions` RefCell
        self.extensions_mut().insert(Flashes {
            flashes: vec![flash],
        });
    }

    fn get_and_clear_flashes(&self) -> Vec<FlashMessage> {
        self.extensions_mut()
            .get_mut::<Flashes>()
            .map(|flashes| std::mem::take(&mut flashes.flashes))
            .unwrap_or_default()
    }
}

pub async fn flash_middleware(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<impl actix_web::body::MessageBody>,
) -> Result<actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>, actix_web::Error> {
    let had_cookie = req.request().cookie(COOKIE_NAME).is_some();
    // Ignore errors while parsing flashes from Request
    if let Ok(flashes) = Flashes::from_cookie(req.request()) {
        req.extensions_mut().insert(flashes);
    }

    let mut response = next.call(req).await?;

    let flashes = response.request().extensions_mut().remove::<Flashes>();
    if let Some(flashes) = flashes {
        if had_cookie || !flashes.flashes.is_empty() {
            let cookie = flashes
                .into_cookie()
                .map_err(actix_web::error::ErrorInternalServerError)?;
            let val = HeaderValue::from_str(&cookie.to_string())?;
            response.headers_mut().append(SET_COOKIE, val);
        }
    }
    Ok(response)
}
