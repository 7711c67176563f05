use crate::web::ui::error::AppError;
use log::{error, warn};

/// An actix-web middleware for logging errors returned by the endpoint handlers
///
/// Errors caused by the client (unknown pages, missing login) are logged as warnings, together with
/// the client's address. Backend and internal failures are logged as errors.
pub async fn error_logging_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<B>, actix_web::Error> {
    let response = next.call(req).await?;

    if let Some(error) = response.response().error() {
        let client = response
            .request()
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_owned();
        if let Some(app_error) = error.as_error::<AppError>() {
            match app_error {
                AppError::PageNotFound | AppError::EntityNotFound => {
                    warn!(
                        "HTTP {} not found at <{}>. Client: <{}>",
                        response.response().status(),
                        response.request().uri(),
                        client
                    );
                }
                AppError::NotAuthenticated => {
                    warn!(
                        "HTTP {} login required at <{}>. Client: <{}>",
                        response.response().status(),
                        response.request().uri(),
                        client
                    );
                }
                AppError::PermissionDenied => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}>",
                        response.response().status(),
                        response.request().uri(),
                        client
                    );
                }
                AppError::BackendUnavailable(e) => {
                    error!(
                        "HTTP {} backend unavailable at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
                AppError::InternalError(e) => {
                    error!(
                        "HTTP {} internal server error at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
            }
        } else {
            error!(
                "HTTP {} unexpected error at <{}>: {:?}",
                response.response().status(),
                response.request().uri(),
                error
            );
        }
    }
    Ok(response)
}
