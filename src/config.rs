use std::{env, path::PathBuf, str::FromStr};

use reqwest::Url;
use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_FIREBASE_AUTH_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// How a sign-in credential is obtained before it reaches the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Email/password go to the identity provider; its ID token is exchanged.
    Firebase,
    /// Email/password go straight to the backend login endpoint.
    Backend,
}

impl FromStr for AuthStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(AuthStrategy::Firebase),
            "backend" => Ok(AuthStrategy::Backend),
            other => Err(AppError::Configuration(format!(
                "Unknown AUTH_STRATEGY '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStrategy {
    /// Single multipart POST through the backend.
    Multipart,
    /// Request a pre-signed target, PUT the file, then trigger processing.
    Presigned,
}

impl FromStr for UploadStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multipart" => Ok(UploadStrategy::Multipart),
            "presigned" => Ok(UploadStrategy::Presigned),
            other => Err(AppError::Configuration(format!(
                "Unknown UPLOAD_STRATEGY '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub storage_dir: PathBuf,
    pub auth_strategy: AuthStrategy,
    pub firebase_api_key: Option<SecretString>,
    pub firebase_auth_url: String,
    pub upload_strategy: UploadStrategy,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads the environment. Unparsable strategy values fall back to the
    /// defaults with a warning; `validate` catches what matters.
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".exam-admin")),
            auth_strategy: env::var("AUTH_STRATEGY")
                .ok()
                .and_then(|s| parse_or_warn(&s))
                .unwrap_or(AuthStrategy::Firebase),
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::from),
            firebase_auth_url: env::var("FIREBASE_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_FIREBASE_AUTH_URL.to_string()),
            upload_strategy: env::var("UPLOAD_STRATEGY")
                .ok()
                .and_then(|s| parse_or_warn(&s))
                .unwrap_or(UploadStrategy::Multipart),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    /// Checks the settings a working client depends on.
    pub fn validate(&self) -> AppResult<()> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(AppError::Configuration(
                "API_BASE_URL is not set".to_string(),
            ));
        }

        let url = Url::parse(base).map_err(|e| {
            AppError::Configuration(format!("API_BASE_URL '{}' is invalid: {}", base, e))
        })?;
        if url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "API_BASE_URL '{}' cannot be used as a base URL",
                base
            )));
        }

        if self.auth_strategy == AuthStrategy::Firebase && self.firebase_api_key.is_none() {
            return Err(AppError::Configuration(
                "FIREBASE_API_KEY is required when AUTH_STRATEGY=firebase".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(AppError::Configuration(
                "MAX_UPLOAD_BYTES must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api_base_url: "https://api.example.test".to_string(),
            storage_dir: PathBuf::from("target/exam-admin-test"),
            auth_strategy: AuthStrategy::Firebase,
            firebase_api_key: Some(SecretString::from("test-api-key".to_string())),
            firebase_auth_url: "https://identity.example.test/v1/accounts:signInWithPassword"
                .to_string(),
            upload_strategy: UploadStrategy::Multipart,
            max_upload_bytes: 1024,
        }
    }
}

fn parse_or_warn<T: FromStr<Err = AppError>>(value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log::warn!("{}; using default", err);
            None
        }
    }
}
