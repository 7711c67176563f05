use crate::backend::{get_backend_from_env, AttendanceBackend};
use crate::cli_error::CliError;
use log::info;

/// Query the backend's health endpoint and print its status and version.
pub fn check_backend() -> Result<(), CliError> {
    let backend = get_backend_from_env()?;
    info!("Checking backend at {}", backend.base_url());
    let health = super::block_on(backend.health())??;
    println!(
        "Backend status: {} (version {})",
        health.status,
        health.version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}
