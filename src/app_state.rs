use std::sync::Arc;

use crate::{
    api::{ApiClient, HttpTransport, ReqwestTransport},
    auth::{AuthSession, FirebaseIdentityProvider, IdentityProvider, TokenStore},
    config::{AuthStrategy, Config},
    errors::AppResult,
    services::{AdminService, ExamService, UploadService},
    storage::SlotStorage,
};

/// Everything a view needs, wired once and passed around by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<TokenStore>,
    pub client: Arc<ApiClient>,
    pub session: Arc<AuthSession>,
    pub admin_service: Arc<AdminService>,
    pub exam_service: Arc<ExamService>,
    pub upload_service: Arc<UploadService>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn SlotStorage>) -> AppResult<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(config, storage, transport)
    }

    pub fn with_transport(
        config: Config,
        storage: Arc<dyn SlotStorage>,
        transport: Arc<dyn HttpTransport>,
    ) -> AppResult<Self> {
        config.validate()?;

        let store = Arc::new(TokenStore::new(storage));
        let client = Arc::new(ApiClient::new(
            config.api_base_url.clone(),
            transport.clone(),
            store.clone(),
        ));

        let identity: Option<Arc<dyn IdentityProvider>> =
            match (config.auth_strategy, &config.firebase_api_key) {
                (AuthStrategy::Firebase, Some(key)) => Some(Arc::new(
                    FirebaseIdentityProvider::new(transport, &config.firebase_auth_url, key.clone()),
                )),
                _ => None,
            };

        let session = Arc::new(AuthSession::new(
            client.clone(),
            identity,
            config.auth_strategy,
        ));
        let admin_service = Arc::new(AdminService::new(client.clone()));
        let exam_service = Arc::new(ExamService::new(client.clone()));
        let upload_service = Arc::new(UploadService::new(
            client.clone(),
            config.upload_strategy,
            config.max_upload_bytes,
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            client,
            session,
            admin_service,
            exam_service,
            upload_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::transport::MockHttpTransport,
        auth::SessionState,
        config::UploadStrategy,
        errors::AppError,
        storage::MemoryStorage,
    };

    #[test]
    fn test_app_state_is_cloneable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_wiring_shares_one_store() {
        let state = AppState::with_transport(
            Config::test_config(),
            Arc::new(MemoryStorage::new()),
            Arc::new(MockHttpTransport::new()),
        )
        .unwrap();

        state.store.set(Some("abc123"));
        assert_eq!(state.client.store().get().as_deref(), Some("abc123"));
        assert_eq!(state.session.store().get().as_deref(), Some("abc123"));
        assert_eq!(state.client.base_url(), "https://api.example.test");
        assert_eq!(state.upload_service.strategy(), UploadStrategy::Multipart);
        assert_eq!(state.session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::test_config();
        config.api_base_url = String::new();

        let result = AppState::with_transport(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(MockHttpTransport::new()),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_backend_strategy() {
        let mut config = Config::test_config();
        config.auth_strategy = AuthStrategy::Backend;
        config.firebase_api_key = None;

        let state = AppState::with_transport(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(MockHttpTransport::new()),
        )
        .unwrap();
        assert_eq!(state.session.strategy(), AuthStrategy::Backend);
    }
}
