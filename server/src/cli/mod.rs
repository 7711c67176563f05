pub mod backend_status;
pub mod list_sessions;

/// Run a future to completion on a fresh single-threaded runtime, for cli commands outside of the
/// web server.
fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, crate::cli_error::CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(crate::cli_error::CliError::ServerError)?;
    Ok(runtime.block_on(future))
}
