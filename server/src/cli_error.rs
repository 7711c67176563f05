use crate::backend::BackendError;
use crate::setup::SetupError;

#[derive(Debug)]
pub enum CliError {
    /// The application setup (environment variables) are not complete or invalid
    SetupError(String),
    /// Could not reach the attendance backend
    BackendUnavailable(String),
    /// The backend answered, but refused or failed the request
    BackendError(String),
    /// Binding the web server to the requested port failed
    BindError(std::io::Error),
    /// Starting the web server failed with an io error
    ServerError(std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SetupError(_) => 1,
            CliError::BackendError(_) => 2,
            CliError::BindError(_) => 3,
            CliError::ServerError(_) => 3,
            CliError::BackendUnavailable(_) => 4,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::SetupError(e) => {
                write!(f, "Setup invalid: {}", e)
            }
            CliError::BackendUnavailable(e) => {
                write!(f, "Could not connect to backend: {}", e)
            }
            CliError::BackendError(e) => {
                write!(f, "Backend request failed: {}", e)
            }
            CliError::BindError(e) => {
                write!(f, "Could not bind web server socket to TCP port: {}", e)
            }
            CliError::ServerError(e) => write!(f, "Could not initialize web server: {}", e),
        }
    }
}

impl From<BackendError> for CliError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::ConnectionError(e) => Self::BackendUnavailable(e),
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<SetupError> for CliError {
    fn from(value: SetupError) -> Self {
        Self::SetupError(value.to_string())
    }
}
