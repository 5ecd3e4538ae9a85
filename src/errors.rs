use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Missing token. Please login again.")]
    MissingToken,

    #[error("{0}")]
    SessionExpired(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Session changed while the request was in flight")]
    StaleSession,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingToken => "MISSING_TOKEN",
            AppError::SessionExpired(_) => "SESSION_EXPIRED",
            AppError::Api { .. } => "API_ERROR",
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Decode(_) => "DECODE_ERROR",
            AppError::StaleSession => "STALE_SESSION",
            AppError::InvalidCredential => "INVALID_CREDENTIAL",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status carried by the error, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::SessionExpired(_) => Some(401),
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to an operator.
    ///
    /// The sign-in classes get fixed wording; every other error passes its
    /// own message through.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidCredential => "Email or password is incorrect".to_string(),
            AppError::Network(_) => "Network error. Please try again".to_string(),
            AppError::Configuration(_) => {
                "Cannot reach the server. Check the API_BASE_URL configuration".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for errors that mean the caller has no usable session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AppError::MissingToken | AppError::SessionExpired(_) | AppError::StaleSession
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            error: err.user_message(),
            code: err.error_code(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            AppError::Network(err.to_string())
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else if err.is_builder() {
            AppError::Configuration(err.to_string())
        } else {
            AppError::InternalError(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("I/O error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
