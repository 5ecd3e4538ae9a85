use std::sync::Arc;

use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    api::{
        request::{ApiRequest, Method, RequestBody},
        transport::{HttpRequest, HttpResponse, HttpTransport},
    },
    auth::TokenStore,
    errors::{AppError, AppResult},
};

pub const AUTHORIZATION: &str = "Authorization";
pub const REQUEST_ID: &str = "X-Request-Id";

/// Endpoints reachable without a session token.
pub const PUBLIC_ENDPOINTS: [&str; 2] = ["/auth/login", "/auth/register"];

const EXPIRED_SESSION_MESSAGE: &str = "Invalid or expired token";

/// Turns logical requests into authenticated HTTP exchanges.
///
/// The token is read from the store right before every dispatch, never
/// cached, and each request is stamped with the store version so responses
/// that outlive the session they were sent under are not trusted.
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    store: Arc<TokenStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<TokenStore>,
    ) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn is_public(path: &str) -> bool {
        PUBLIC_ENDPOINTS.iter().any(|p| path.starts_with(p))
    }

    pub fn build_url(&self, path: &str, query: &[(String, String)]) -> AppResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw).map_err(|e| {
            AppError::Configuration(format!("Cannot build request URL '{}': {}", raw, e))
        })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T> {
        self.execute(ApiRequest::get(path).with_query(query.iter().copied()))
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(ApiRequest::delete(path)).await
    }

    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> AppResult<T> {
        let url = self.build_url(&request.path, &request.query)?;
        let stamp = self.store.version();
        let token = self.store.get();

        let mut headers: Vec<(String, String)> = Vec::new();
        if matches!(request.body, RequestBody::Json(_)) {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        let request_id = Uuid::new_v4().to_string();
        headers.push((REQUEST_ID.to_string(), request_id.clone()));

        match token {
            Some(token) => headers.push((AUTHORIZATION.to_string(), token)),
            None if Self::is_public(&request.path)
                || request.header_value(AUTHORIZATION).is_some() => {}
            None => {
                log::error!("Missing token for request to: {}", request.path);
                return Err(AppError::MissingToken);
            }
        }

        for (name, value) in request.headers {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
            headers.push((name, value));
        }

        log::debug!(
            "{} {} (request id {})",
            request.method,
            request.path,
            request_id
        );

        let response = self
            .transport
            .send(HttpRequest {
                method: request.method,
                url,
                headers,
                body: request.body,
            })
            .await?;

        self.handle_response(response, stamp, request.method, &request.path)
    }

    fn handle_response<T: DeserializeOwned>(
        &self,
        response: HttpResponse,
        stamp: u64,
        method: Method,
        path: &str,
    ) -> AppResult<T> {
        if response.status == 401 {
            if self.store.clear_if_current(stamp) {
                log::warn!("{} {} rejected the session; token cleared", method, path);
            } else {
                log::warn!(
                    "{} {} rejected a session that has since changed; keeping current session",
                    method,
                    path
                );
            }
            let message = error_message(&response.body)
                .unwrap_or_else(|| EXPIRED_SESSION_MESSAGE.to_string());
            return Err(AppError::SessionExpired(message));
        }

        if !response.is_success() {
            let message = error_message(&response.body)
                .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
            log::warn!("{} {} failed with {}: {}", method, path, response.status, message);
            return Err(AppError::Api {
                status: response.status,
                message,
            });
        }

        // Sign-in and sign-up open a new session, so they are never stale.
        if !Self::is_public(path) && self.store.version() != stamp {
            log::warn!("{} {} completed after the session changed; discarding", method, path);
            return Err(AppError::StaleSession);
        }

        decode_body(&response.body)
            .map_err(|e| AppError::Decode(format!("{} {}: {}", method, path, e)))
    }

    /// PUTs raw bytes to an absolute, pre-signed URL. The session token is
    /// never attached: the URL carries its own authorization.
    pub async fn transfer(&self, url: &str, data: Vec<u8>, content_type: &str) -> AppResult<()> {
        let url = Url::parse(url).map_err(|e| {
            AppError::Decode(format!("Upload target '{}' is not a valid URL: {}", url, e))
        })?;

        log::debug!("PUT {} ({} bytes)", url.host_str().unwrap_or("?"), data.len());

        let response = self
            .transport
            .send(HttpRequest {
                method: Method::Put,
                url,
                headers: Vec::new(),
                body: RequestBody::Bytes {
                    content_type: content_type.to_string(),
                    data,
                },
            })
            .await?;

        if !response.is_success() {
            let message = error_message(&response.body)
                .unwrap_or_else(|| format!("Upload failed: {}", response.status));
            return Err(AppError::Api {
                status: response.status,
                message,
            });
        }
        Ok(())
    }
}

/// Pulls `message` out of an error body. NestJS-style validation errors
/// send an array of messages; those are joined.
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = match value.get("message")? {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"null")
    } else {
        serde_json::from_slice(body)
    }
}
