use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{
        client::error_message,
        request::{Method, RequestBody},
        transport::{HttpRequest, HttpTransport},
    },
    errors::{AppError, AppResult},
    models::domain::LoginType,
};

/// Short-lived proof of identity, used once to open a backend session and
/// never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityCredential {
    pub id_token: String,
    pub login_type: LoginType,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<IdentityCredential>;
    async fn sign_out(&self) -> AppResult<()>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordSignInResponse {
    id_token: String,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
}

/// Email/password sign-in against the Firebase identity toolkit REST API.
pub struct FirebaseIdentityProvider {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    api_key: SecretString,
}

impl FirebaseIdentityProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: &str, api_key: SecretString) -> Self {
        Self {
            transport,
            endpoint: endpoint.to_string(),
            api_key,
        }
    }

    fn classify(status: u16, body: &[u8]) -> AppError {
        let code = serde_json::from_slice::<ProviderErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_default();

        // Codes may carry a suffix, e.g. "TOO_MANY_ATTEMPTS_TRY_LATER : ...".
        let head = code.split([' ', ':']).next().unwrap_or_default();
        match head {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_EMAIL" | "USER_DISABLED" | "MISSING_PASSWORD" => AppError::InvalidCredential,
            "API_KEY_INVALID" | "INVALID_API_KEY" | "PROJECT_NOT_FOUND" | "CONFIGURATION_NOT_FOUND" => {
                AppError::Configuration(format!("Identity provider rejected configuration: {}", code))
            }
            _ if code.contains("API key not valid") => {
                AppError::Configuration(format!("Identity provider rejected configuration: {}", code))
            }
            _ => AppError::Api {
                status,
                message: error_message(body)
                    .or_else(|| (!code.is_empty()).then(|| code.clone()))
                    .unwrap_or_else(|| format!("Identity provider error: {}", status)),
            },
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<IdentityCredential> {
        let url = Url::parse_with_params(&self.endpoint, &[("key", self.api_key.expose_secret())])
            .map_err(|e| {
                AppError::Configuration(format!(
                    "Identity provider URL '{}' is invalid: {}",
                    self.endpoint, e
                ))
            })?;

        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self
            .transport
            .send(HttpRequest {
                method: Method::Post,
                url,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: RequestBody::Json(body),
            })
            .await?;

        if !response.is_success() {
            let err = Self::classify(response.status, &response.body);
            log::warn!("Identity provider sign-in failed: {}", err);
            return Err(err);
        }

        let parsed: PasswordSignInResponse = serde_json::from_slice(&response.body)?;
        Ok(IdentityCredential {
            id_token: parsed.id_token,
            login_type: LoginType::Email,
        })
    }

    async fn sign_out(&self) -> AppResult<()> {
        // Password sessions hold no server-side state; the ID token was
        // only kept in memory for the exchange.
        log::debug!("Identity provider session discarded");
        Ok(())
    }
}
