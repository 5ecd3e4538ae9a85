use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use validator::Validate;

use crate::{
    api::{client::AUTHORIZATION, ApiClient, ApiRequest},
    auth::{identity::IdentityProvider, state::SessionState, TokenStore},
    config::AuthStrategy,
    errors::{AppError, AppResult},
    models::{
        domain::{LoginType, User},
        dto::{
            request::{EmailSignInRequest, SignInRequest, SignUpRequest},
            response::AuthResponse,
        },
    },
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";

const SIGN_IN_FAILED: &str = "Sign in failed";

/// The single authenticated identity of a client instance.
///
/// Owns no state of its own: token and user live in the [`TokenStore`], so
/// a 401 seen by the [`ApiClient`] is reflected here immediately.
pub struct AuthSession {
    client: Arc<ApiClient>,
    identity: Option<Arc<dyn IdentityProvider>>,
    strategy: AuthStrategy,
}

impl AuthSession {
    pub fn new(
        client: Arc<ApiClient>,
        identity: Option<Arc<dyn IdentityProvider>>,
        strategy: AuthStrategy,
    ) -> Self {
        Self {
            client,
            identity,
            strategy,
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        self.strategy
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        self.client.store()
    }

    pub fn state(&self) -> SessionState {
        self.store().state()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store().subscribe()
    }

    /// Hydrates the session from durable storage without a network call.
    ///
    /// A token with a readable user snapshot is trusted as-is. Anything else
    /// left in the slots (token without user, user without token, corrupt
    /// snapshot) is cleared.
    pub fn restore(&self) -> SessionState {
        let store = self.store();
        store.publish(SessionState::Restoring);

        let token = store.get();
        let user = store.load_user();

        match (token, user) {
            (Some(_), Ok(Some(user))) => {
                log::info!("Restored session for {}", user.display_name());
                store.publish(SessionState::Authenticated(user));
            }
            (None, Ok(None)) => store.publish(SessionState::Unauthenticated),
            (_, Err(e)) => {
                log::error!("Failed to parse stored user: {}", e);
                store.clear();
            }
            _ => {
                log::warn!("Discarding incomplete stored session");
                store.clear();
            }
        }

        self.state()
    }

    /// Email/password sign-in using the configured strategy.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        self.store().publish(SessionState::Authenticating);

        let result = match self.strategy {
            AuthStrategy::Firebase => self.identity_sign_in(email, password).await,
            AuthStrategy::Backend => {
                let request = EmailSignInRequest {
                    email: email.trim().to_string(),
                    password: password.to_string(),
                };
                self.exchange(LOGIN_PATH, request).await
            }
        };

        self.complete(result)
    }

    /// Exchanges a credential obtained elsewhere (e.g. Google sign-in) for a
    /// backend session.
    pub async fn sign_in_with_id_token(
        &self,
        id_token: &str,
        login_type: LoginType,
    ) -> AppResult<User> {
        self.store().publish(SessionState::Authenticating);

        let request = SignInRequest {
            id_token: id_token.to_string(),
            login_type,
        };
        let result = self.exchange(LOGIN_PATH, request).await;
        self.complete(result)
    }

    pub async fn sign_up(&self, id_token: &str, full_name: &str) -> AppResult<User> {
        self.store().publish(SessionState::Authenticating);

        let request = SignUpRequest {
            id_token: id_token.to_string(),
            full_name: full_name.trim().to_string(),
        };
        let result = self.exchange(REGISTER_PATH, request).await;
        self.complete(result)
    }

    /// Clears the session locally, then tells the identity provider and the
    /// backend. Notification failures are logged and never surfaced.
    pub async fn sign_out(&self) {
        let store = self.store();
        store.publish(SessionState::SigningOut);

        let previous = store.get();
        store.clear();

        if let Some(identity) = &self.identity {
            if let Err(e) = identity.sign_out().await {
                log::error!("Identity provider sign out error: {}", e);
            }
        }

        if let Some(token) = previous {
            let request = ApiRequest::post(LOGOUT_PATH).header(AUTHORIZATION, token);
            if let Err(e) = self.client.execute::<Value>(request).await {
                log::error!("API sign out error: {}", e);
            }
        }

        log::info!("Signed out");
    }

    async fn identity_sign_in(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let identity = self.identity.as_ref().ok_or_else(|| {
            AppError::Configuration("No identity provider configured".to_string())
        })?;

        let credential = identity.sign_in(email.trim(), password).await?;
        let request = SignInRequest {
            id_token: credential.id_token,
            login_type: credential.login_type,
        };
        self.exchange(LOGIN_PATH, request).await
    }

    async fn exchange<B>(&self, path: &str, body: B) -> AppResult<(String, User)>
    where
        B: Serialize + Validate,
    {
        body.validate()?;
        let response: AuthResponse = self
            .client
            .post(path, &body)
            .await
            .map_err(|e| match e {
                AppError::Network(detail) => AppError::Configuration(format!(
                    "Cannot reach the backend at {}: {}",
                    self.client.base_url(),
                    detail
                )),
                other => other,
            })?;
        response.into_session()
    }

    fn complete(&self, result: AppResult<(String, User)>) -> AppResult<User> {
        let persisted = result.and_then(|(token, user)| {
            self.store().persist(&token, &user)?;
            Ok(user)
        });

        match persisted {
            Ok(user) => {
                log::info!("Signed in as {}", user.display_name());
                Ok(user)
            }
            Err(err) => {
                let err = classify_sign_in_error(err);
                log::warn!("Sign in failed: {}", err);
                self.store().republish();
                Err(err)
            }
        }
    }
}

/// Maps sign-in failures onto the classes operators see distinct messages
/// for. Anything unrecognised keeps its own message, or a generic one when
/// it has none.
///
/// An unreachable backend arrives here already as `Configuration`; a
/// `Network` error can only come from the identity provider.
pub fn classify_sign_in_error(err: AppError) -> AppError {
    match err {
        AppError::SessionExpired(_) => AppError::InvalidCredential,
        AppError::Api { status, .. } if matches!(status, 401 | 403 | 404) => {
            AppError::InvalidCredential
        }
        AppError::Api { status, message } if message.trim().is_empty() => AppError::Api {
            status,
            message: SIGN_IN_FAILED.to_string(),
        },
        AppError::Decode(detail) => AppError::Configuration(format!(
            "Backend returned an unexpected sign-in response: {}",
            detail
        )),
        AppError::InternalError(message) if message.trim().is_empty() => {
            AppError::InternalError(SIGN_IN_FAILED.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{
            request::{Method, RequestBody},
            transport::{HttpResponse, MockHttpTransport},
        },
        auth::identity::{IdentityCredential, MockIdentityProvider},
        storage::{MemoryStorage, SlotStorage, TOKEN_SLOT, USER_SLOT},
        test_utils::{
            fixtures::test_user,
            test_helpers::{json_response, memory_store},
        },
    };
    use serde_json::json;

    fn session(
        transport: MockHttpTransport,
        identity: Option<MockIdentityProvider>,
        strategy: AuthStrategy,
        store: Arc<TokenStore>,
    ) -> AuthSession {
        let client = Arc::new(ApiClient::new(
            "https://api.example.test",
            Arc::new(transport),
            store,
        ));
        let identity = identity.map(|i| Arc::new(i) as Arc<dyn IdentityProvider>);
        AuthSession::new(client, identity, strategy)
    }

    fn identity_returning(id_token: &'static str) -> MockIdentityProvider {
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_in().returning(move |_, _| {
            Ok(IdentityCredential {
                id_token: id_token.to_string(),
                login_type: LoginType::Email,
            })
        });
        identity
    }

    #[tokio::test]
    async fn test_firebase_sign_in_exchanges_id_token() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.method == Method::Post
                    && req.url.path() == LOGIN_PATH
                    && matches!(&req.body, RequestBody::Json(v) if *v == json!({ "idToken": "fb-id", "type": "email" }))
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    json!({ "user": { "id": 1, "fullName": "Test User" }, "token": "abc123" }),
                ))
            });

        let store = memory_store();
        let session = session(
            transport,
            Some(identity_returning("fb-id")),
            AuthStrategy::Firebase,
            store.clone(),
        );

        let user = session.sign_in("admin@example.com", "pw").await.unwrap();

        assert_eq!(user.id, Some(1));
        assert_eq!(store.get().as_deref(), Some("abc123"));
        assert!(session.is_authenticated());
        assert_eq!(session.current_user().unwrap().display_name(), "Test User");
    }

    #[tokio::test]
    async fn test_backend_sign_in_posts_credentials() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                matches!(&req.body, RequestBody::Json(v) if v["email"] == "admin@example.com" && v["password"] == "pw")
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(200, json!({ "user": { "id": 1 }, "accessToken": "tok" })))
            });

        let store = memory_store();
        let session = session(transport, None, AuthStrategy::Backend, store.clone());

        session.sign_in(" admin@example.com ", "pw").await.unwrap();
        assert_eq!(store.get().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_rejected_credential_writes_no_token() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .returning(|_, _| Err(AppError::InvalidCredential));
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let store = memory_store();
        let session = session(transport, Some(identity), AuthStrategy::Firebase, store.clone());

        let err = session.sign_in("a@example.com", "wrong").await.unwrap_err();

        assert_eq!(err, AppError::InvalidCredential);
        assert!(store.get().is_none());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_backend_rejection_is_invalid_credential() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(json_response(401, json!({ "message": "Invalid credentials" }))));

        let store = memory_store();
        let session = session(transport, None, AuthStrategy::Backend, store.clone());

        let err = session.sign_in("a@example.com", "bad").await.unwrap_err();
        assert_eq!(err, AppError::InvalidCredential);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_misconfiguration() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(AppError::Network("Connection refused".to_string())));

        let store = memory_store();
        let session = session(
            transport,
            Some(identity_returning("fb-id")),
            AuthStrategy::Firebase,
            store.clone(),
        );

        let err = session.sign_in("a@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(
            err.user_message(),
            "Cannot reach the server. Check the API_BASE_URL configuration"
        );
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_identity_network_failure_stays_network() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_sign_in()
            .returning(|_, _| Err(AppError::Network("offline".to_string())));
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let session = session(transport, Some(identity), AuthStrategy::Firebase, memory_store());

        let err = session.sign_in("a@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(err.user_message(), "Network error. Please try again");
    }

    #[tokio::test]
    async fn test_login_survives_concurrent_teardown() {
        let store = memory_store();
        store.persist("expired", &test_user()).unwrap();

        let racing_store = store.clone();
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url.path() == LOGIN_PATH)
            .times(1)
            .returning(move |_| {
                // An older request's 401 tears the expired session down mid-login.
                assert!(racing_store.clear_if_current(racing_store.version()));
                Ok(json_response(200, json!({ "user": { "id": 1 }, "token": "fresh" })))
            });

        let session = session(transport, None, AuthStrategy::Backend, store.clone());

        let user = session.sign_in("a@example.com", "pw").await.unwrap();
        assert_eq!(user.id, Some(1));
        assert_eq!(store.get().as_deref(), Some("fresh"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_login_clears_existing_session() {
        let store = memory_store();
        store.persist("existing", &test_user()).unwrap();

        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.header(AUTHORIZATION) == Some("existing"))
            .returning(|_| Ok(json_response(401, json!({ "message": "Invalid credentials" }))));

        let session = session(transport, None, AuthStrategy::Backend, store.clone());

        let err = session.sign_in("a@example.com", "bad").await.unwrap_err();
        assert_eq!(err, AppError::InvalidCredential);
        assert!(store.get().is_none());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_html_response_is_misconfiguration() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::new(200, "<!doctype html><html></html>")));

        let session = session(transport, None, AuthStrategy::Backend, memory_store());

        let err = session.sign_in("a@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_missing_token_in_response_is_rejected() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(json_response(200, json!({ "user": { "id": 1 } }))));

        let store = memory_store();
        let session = session(transport, None, AuthStrategy::Backend, store.clone());

        assert!(session.sign_in("a@example.com", "pw").await.is_err());
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_firebase_strategy_without_provider() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let session = session(transport, None, AuthStrategy::Firebase, memory_store());

        let err = session.sign_in("a@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_invalid_email_fails_before_network() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let session = session(transport, None, AuthStrategy::Backend, memory_store());

        let err = session.sign_in("not-an-email", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_existing_session() {
        let store = memory_store();
        store.persist("existing", &test_user()).unwrap();

        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .returning(|_| Ok(json_response(500, json!({ "message": "boom" }))));

        let session = session(transport, None, AuthStrategy::Backend, store.clone());

        let err = session.sign_in("a@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(store.get().as_deref(), Some("existing"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_with_google_id_token() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| matches!(&req.body, RequestBody::Json(v) if v["type"] == "GOOGLE"))
            .returning(|_| Ok(json_response(200, json!({ "user": { "id": 3 }, "token": "g" }))));

        let session = session(transport, None, AuthStrategy::Firebase, memory_store());

        let user = session
            .sign_in_with_id_token("google-id", LoginType::Google)
            .await
            .unwrap();
        assert_eq!(user.id, Some(3));
    }

    #[tokio::test]
    async fn test_sign_up_posts_to_register() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| {
                req.url.path() == REGISTER_PATH
                    && matches!(&req.body, RequestBody::Json(v) if v["fullName"] == "Jane Smith")
            })
            .times(1)
            .returning(|_| Ok(json_response(201, json!({ "user": { "id": 9 }, "token": "new" }))));

        let store = memory_store();
        let session = session(transport, None, AuthStrategy::Firebase, store.clone());

        session.sign_up("id", "Jane Smith").await.unwrap();
        assert_eq!(store.get().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_before_notifying() {
        let store = memory_store();
        store.persist("abc123", &test_user()).unwrap();

        let observed = store.clone();
        let mut identity = MockIdentityProvider::new();
        identity.expect_sign_out().times(1).returning(move || {
            assert!(observed.get().is_none());
            Err(AppError::Network("offline".to_string()))
        });

        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url.path() == LOGOUT_PATH && req.header(AUTHORIZATION) == Some("abc123"))
            .times(1)
            .returning(|_| Ok(json_response(500, json!({ "message": "down" }))));

        let session = session(transport, Some(identity), AuthStrategy::Firebase, store.clone());
        session.sign_out().await;

        assert!(store.get().is_none());
        assert!(store.user().is_none());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_out_without_session_skips_backend() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let session = session(transport, None, AuthStrategy::Backend, memory_store());
        session.sign_out().await;

        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_restore_trusts_complete_cache() {
        let user_json = serde_json::to_string(&test_user()).unwrap();
        let storage = Arc::new(MemoryStorage::with_slots([
            (TOKEN_SLOT, "abc123".to_string()),
            (USER_SLOT, user_json),
        ]));
        let store = Arc::new(TokenStore::new(storage));

        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();
        let session = session(transport, None, AuthStrategy::Backend, store);

        assert_eq!(session.restore(), SessionState::Authenticated(test_user()));
    }

    #[test]
    fn test_restore_clears_orphaned_token() {
        let storage = Arc::new(MemoryStorage::with_slots([(TOKEN_SLOT, "abc123")]));
        let store = Arc::new(TokenStore::new(storage.clone()));
        let session = session(MockHttpTransport::new(), None, AuthStrategy::Backend, store);

        assert_eq!(session.restore(), SessionState::Unauthenticated);
        assert!(storage.load(TOKEN_SLOT).is_none());
    }

    #[test]
    fn test_restore_clears_corrupt_snapshot() {
        let storage = Arc::new(MemoryStorage::with_slots([
            (TOKEN_SLOT, "abc123"),
            (USER_SLOT, "{not json"),
        ]));
        let store = Arc::new(TokenStore::new(storage.clone()));
        let session = session(MockHttpTransport::new(), None, AuthStrategy::Backend, store);

        assert_eq!(session.restore(), SessionState::Unauthenticated);
        assert!(storage.load(TOKEN_SLOT).is_none());
        assert!(storage.load(USER_SLOT).is_none());
    }

    #[test]
    fn test_classify_sign_in_error() {
        assert_eq!(
            classify_sign_in_error(AppError::SessionExpired("x".into())),
            AppError::InvalidCredential
        );
        assert_eq!(
            classify_sign_in_error(AppError::Api {
                status: 404,
                message: "User not found".into()
            }),
            AppError::InvalidCredential
        );
        assert_eq!(
            classify_sign_in_error(AppError::Api {
                status: 500,
                message: "boom".into()
            }),
            AppError::Api {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_classify_empty_message_falls_back() {
        let err = classify_sign_in_error(AppError::InternalError(String::new()));
        assert_eq!(err, AppError::InternalError("Sign in failed".into()));

        let err = classify_sign_in_error(AppError::Api {
            status: 500,
            message: " ".into(),
        });
        assert_eq!(err.user_message(), "Sign in failed");

        assert_eq!(
            classify_sign_in_error(AppError::Network("offline".into())),
            AppError::Network("offline".into())
        );
    }
}
