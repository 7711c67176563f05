use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Timeout for backend requests, if `BACKEND_TIMEOUT_SECONDS` is not set
const DEFAULT_BACKEND_TIMEOUT_SECONDS: u64 = 10;

/// Get the base URL of the attendance REST backend from the environment variable.
pub fn get_backend_url_from_env() -> Result<url::Url, SetupError> {
    let value =
        env::var("BACKEND_URL").map_err(|e| SetupError::from_env_error(e, "BACKEND_URL"))?;
    parse_backend_url(&value)
}

fn parse_backend_url(value: &str) -> Result<url::Url, SetupError> {
    let url = url::Url::parse(value).map_err(|_| SetupError::EnvVariableInvalid {
        variable_name: "BACKEND_URL",
        problem: "Not a valid URL",
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SetupError::EnvVariableInvalid {
            variable_name: "BACKEND_URL",
            problem: "URL scheme must be http or https",
        });
    }
    Ok(url)
}

/// Get the request timeout for the backend from the environment variable. Defaults to 10 seconds.
pub fn get_backend_timeout_from_env() -> Result<Duration, SetupError> {
    match env::var("BACKEND_TIMEOUT_SECONDS") {
        Err(VarError::NotPresent) => Ok(Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECONDS)),
        Err(e) => Err(SetupError::from_env_error(e, "BACKEND_TIMEOUT_SECONDS")),
        Ok(v) => v
            .parse()
            .ok()
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
            .ok_or(SetupError::EnvVariableInvalid {
                variable_name: "BACKEND_TIMEOUT_SECONDS",
                problem: "Not a positive number of seconds",
            }),
    }
}

/// Get the cryptographic application secret for signing the admin session cookie from the
/// environment variable.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    env::var("LISTEN_PORT")
        .map_err(|e| SetupError::from_env_error(e, "LISTEN_PORT"))
        .and_then(|v| {
            v.parse().map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "LISTEN_PORT",
                problem: "Not a valid uint16",
            })
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    env::var("LISTEN_ADDRESS").map_err(|e| SetupError::from_env_error(e, "LISTEN_ADDRESS"))
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}
