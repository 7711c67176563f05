use crate::backend::{get_backend_from_env, AttendanceBackend};
use crate::cli_error::CliError;
use crate::kiosk::pollers::{PollIntervals, PollerSet};
use crate::kiosk::KioskHub;
use crate::setup::{get_listen_address_from_env, get_listen_port_from_env, get_secret_from_env};
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use std::sync::Arc;

mod http_error_logging;
mod ui;

pub fn serve() -> Result<(), CliError> {
    let state = AppState::new()?;
    let address = get_listen_address_from_env()?;
    let port = get_listen_port_from_env()?;
    actix_web::rt::System::new().block_on(async move {
        // The pollers are stopped, when the set is dropped at server shutdown.
        let _pollers = PollerSet::start(&state.hub, &PollIntervals::default());
        info!("Listening on {}:{}", address, port);
        HttpServer::new(move || {
            App::new()
                .configure(ui::configure_app)
                .app_data(web::Data::new(state.clone()))
                .wrap(middleware::Compress::default())
        })
        .bind((address, port))
        .map_err(CliError::BindError)?
        .run()
        .await
        .map_err(CliError::ServerError)
    })
}

#[derive(Clone)]
pub struct AppState {
    hub: Arc<KioskHub>,
    secret: String,
}

impl AppState {
    pub fn new() -> Result<Self, CliError> {
        let backend: Arc<dyn AttendanceBackend> = Arc::new(get_backend_from_env()?);
        Ok(Self {
            hub: Arc::new(KioskHub::new(backend)),
            secret: get_secret_from_env()?,
        })
    }

    fn backend(&self) -> &dyn AttendanceBackend {
        self.hub.backend.as_ref()
    }
}
