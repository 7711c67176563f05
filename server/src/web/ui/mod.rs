use crate::web::ui::error::AppError;
use crate::web::ui::error_page::error_page_middleware;
use crate::web::ui::flash::flash_middleware;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::middleware::from_fn;
use actix_web::web::Redirect;
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use rust_embed::Embed;

mod base_template;
mod confirm;
mod endpoints;
pub mod error;
mod error_page;
mod flash;
mod form_values;
mod sub_templates;
mod util;
mod validation;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        get_ui_service()
            .wrap(from_fn(crate::web::http_error_logging::error_logging_middleware))
            .wrap(from_fn(flash_middleware))
            .wrap(from_fn(error_page_middleware)),
    );
}

fn get_ui_service() -> actix_web::Scope {
    web::scope("")
        .service(static_resources)
        .service(index)
        .service(endpoints::kiosk::kiosk_page)
        .service(endpoints::kiosk::kiosk_panel)
        .service(endpoints::kiosk::kiosk_submit)
        .service(endpoints::kiosk::kiosk_create_session)
        .service(endpoints::kiosk::kiosk_select_session)
        .service(endpoints::kiosk::kiosk_switch_session)
        .service(endpoints::kiosk::kiosk_cancel_creation)
        .service(endpoints::kiosk::kiosk_end_session_form)
        .service(endpoints::kiosk::kiosk_end_session)
        .service(endpoints::kiosk::kiosk_activity)
        .service(endpoints::kiosk::kiosk_next_announcement)
        .service(endpoints::kiosk::kiosk_previous_announcement)
        .service(endpoints::kiosk::kiosk_events)
        .service(endpoints::kiosk::kiosk_qr_code)
        .service(endpoints::kiosk::kiosk_logo)
        .service(endpoints::mobile_checkin::mobile_checkin_page)
        .service(endpoints::mobile_checkin::mobile_checkin_submit)
        .service(endpoints::auth::login_form)
        .service(endpoints::auth::login)
        .service(endpoints::auth::logout)
        .service(endpoints::dashboard::admin_dashboard)
        .service(endpoints::sessions::sessions_list)
        .service(endpoints::sessions::new_session_form)
        .service(endpoints::sessions::new_session)
        .service(endpoints::sessions::session_detail)
        .service(endpoints::sessions::end_session_form)
        .service(endpoints::sessions::end_session)
        .service(endpoints::sessions::delete_session_form)
        .service(endpoints::sessions::delete_session)
        .service(endpoints::sessions::session_qr_code)
        .service(endpoints::sessions::session_pdf)
        .service(endpoints::personnel::personnel_list)
        .service(endpoints::personnel::new_personnel_form)
        .service(endpoints::personnel::new_personnel)
        .service(endpoints::personnel::edit_personnel_form)
        .service(endpoints::personnel::edit_personnel)
        .service(endpoints::personnel::delete_personnel_form)
        .service(endpoints::personnel::delete_personnel)
        .service(endpoints::announcements::announcements_list)
        .service(endpoints::announcements::new_announcement_form)
        .service(endpoints::announcements::new_announcement)
        .service(endpoints::announcements::edit_announcement_form)
        .service(endpoints::announcements::edit_announcement)
        .service(endpoints::announcements::delete_announcement_form)
        .service(endpoints::announcements::delete_announcement)
        .service(endpoints::news::news_list)
        .service(endpoints::news::new_news_form)
        .service(endpoints::news::new_news)
        .service(endpoints::news::edit_news_form)
        .service(endpoints::news::edit_news)
        .service(endpoints::news::delete_news_form)
        .service(endpoints::news::delete_news)
        .service(endpoints::audit::audit_log)
        .service(endpoints::statistics::unit_statistics)
        .service(endpoints::statistics::unit_statistics_pdf)
        .service(endpoints::statistics::personnel_statistics)
        .service(endpoints::statistics::personnel_statistics_pdf)
        .service(endpoints::settings::station_settings_form)
        .service(endpoints::settings::station_settings)
        .service(endpoints::settings::system_settings_form)
        .service(endpoints::settings::system_settings)
        .service(endpoints::settings::backup_settings_form)
        .service(endpoints::settings::backup_settings)
        .service(endpoints::backups::backups_list)
        .service(endpoints::backups::create_backup)
        .service(endpoints::backups::download_backup)
        .service(endpoints::backups::restore_backup_form)
        .service(endpoints::backups::restore_backup)
        .service(endpoints::backups::delete_backup_form)
        .service(endpoints::backups::delete_backup)
        .service(endpoints::system::system_info)
        .service(endpoints::system::system_action_form)
        .service(endpoints::system::system_action)
        .default_service(web::to(not_found_handler))
}

#[derive(Embed)]
#[folder = "static/"]
struct Resources;

impl Resources {
    fn handle_embedded_file(path: &str) -> HttpResponse {
        match Self::get(path) {
            Some(content) => HttpResponse::Ok()
                .content_type(mime_guess::from_path(path).first_or_octet_stream().as_ref())
                .append_header(CacheControl(vec![CacheDirective::MaxAge(86400 * 365)]))
                .body(content.data.into_owned()),
            None => {
                HttpResponse::NotFound().body(format!("Static resource file '{}' not found", path))
            }
        }
    }
}

#[get("/static/{_:.*}")]
async fn static_resources(path: web::Path<String>) -> impl Responder {
    Resources::handle_embedded_file(path.as_str())
}

/// The kiosk is the start page of the station's touch screen
#[get("/")]
async fn index(req: HttpRequest) -> Result<impl Responder, AppError> {
    Ok(Redirect::to(req.url_for_static("kiosk_page")?.to_string()).see_other())
}

async fn not_found_handler() -> Result<HttpResponse, AppError> {
    Err(AppError::PageNotFound)
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::auth_session::AdminSession;
    use crate::backend::mock::sample_data::backend_with_sample_data;
    use crate::backend::mock::{BackendMock, ADMIN_TOKEN};
    use crate::kiosk::KioskHub;
    use crate::web::ui::util::create_session_cookie;
    use crate::web::AppState;
    use actix_web::cookie::Cookie;
    use std::sync::Arc;

    const SECRET: &str = "test-secret-for-signing-cookies";

    /// An [AppState] backed by a [BackendMock] with the sample fire station
    pub fn test_state() -> (Arc<BackendMock>, AppState) {
        let backend = Arc::new(backend_with_sample_data());
        let state = AppState {
            hub: Arc::new(KioskHub::new(backend.clone())),
            secret: SECRET.to_owned(),
        };
        (backend, state)
    }

    /// Session cookie of a logged-in admin, accepted by the [BackendMock]
    pub fn admin_cookie() -> Cookie<'static> {
        let session = AdminSession::new(
            ADMIN_TOKEN.to_owned(),
            "admin".to_owned(),
            "admin".to_owned(),
        );
        create_session_cookie(&session, SECRET)
    }
}

#[cfg(test)]
mod tests {
    use super::configure_app;
    use super::test_util::test_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn test_unknown_page_and_static_files() {
        let (_backend, state) = test_state();
        let app = test::init_service(
            App::new()
                .configure(configure_app)
                .app_data(web::Data::new(state)),
        )
        .await;

        let req = test::TestRequest::get().uri("/nothing/here").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/static/style.css").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap().to_str().unwrap(),
            "text/css"
        );

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get("location").unwrap().to_str().unwrap();
        assert!(location.ends_with("/kiosk"));
    }
}
