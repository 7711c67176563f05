pub mod auth_session;
pub mod backend;
pub mod cli;
pub mod cli_error;
pub mod kiosk;
mod setup;
pub mod web;

fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
