use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{
    auth::state::SessionState,
    errors::{AppError, AppResult},
    models::domain::User,
    storage::{SlotStorage, TOKEN_SLOT, USER_SLOT},
};

/// The session token and cached user snapshot, persisted in durable slots.
///
/// Every token write bumps a version counter. Requests capture the version
/// at dispatch so the client can tell whether the session changed under them.
/// State transitions are broadcast over a watch channel.
pub struct TokenStore {
    storage: Arc<dyn SlotStorage>,
    version: AtomicU64,
    write_lock: Mutex<()>,
    state: watch::Sender<SessionState>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            storage,
            version: AtomicU64::new(0),
            write_lock: Mutex::new(()),
            state,
        }
    }

    pub fn get(&self) -> Option<String> {
        self.storage.load(TOKEN_SLOT).filter(|t| !t.is_empty())
    }

    /// Writes the token, or clears the session when `None` is given.
    ///
    /// A bare token write announces Authenticated only when a user snapshot
    /// is already cached; otherwise observers stay at Unauthenticated until
    /// [`TokenStore::persist`] supplies the user.
    pub fn set(&self, token: Option<&str>) {
        match token {
            Some(token) => {
                {
                    let _guard = self.write_lock.lock();
                    self.storage.save(TOKEN_SLOT, token);
                    self.bump();
                }
                self.republish();
            }
            None => self.clear(),
        }
    }

    pub fn load_user(&self) -> AppResult<Option<User>> {
        match self.storage.load(USER_SLOT) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn user(&self) -> Option<User> {
        self.load_user().unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable user snapshot: {}", e);
            None
        })
    }

    /// Replaces the cached snapshot for the current session. The version is
    /// left alone: the token did not change.
    pub fn set_user(&self, user: &User) -> AppResult<()> {
        let snapshot = serde_json::to_string(user)?;
        {
            let _guard = self.write_lock.lock();
            if self.get().is_none() {
                return Err(AppError::MissingToken);
            }
            self.storage.save(USER_SLOT, &snapshot);
        }
        self.publish(SessionState::Authenticated(user.clone()));
        Ok(())
    }

    /// Stores a fresh session and announces it.
    pub fn persist(&self, token: &str, user: &User) -> AppResult<()> {
        let snapshot = serde_json::to_string(user)?;
        {
            let _guard = self.write_lock.lock();
            self.storage.save(USER_SLOT, &snapshot);
            self.storage.save(TOKEN_SLOT, token);
            self.bump();
        }
        self.publish(SessionState::Authenticated(user.clone()));
        Ok(())
    }

    /// Removes token and user snapshot together.
    pub fn clear(&self) {
        {
            let _guard = self.write_lock.lock();
            self.clear_slots();
        }
        self.publish(SessionState::Unauthenticated);
    }

    /// Clears only if nothing was written since `stamp` was taken.
    pub fn clear_if_current(&self, stamp: u64) -> bool {
        {
            let _guard = self.write_lock.lock();
            if self.version() != stamp {
                return false;
            }
            self.clear_slots();
        }
        self.publish(SessionState::Unauthenticated);
        true
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Announces whatever the slots currently hold.
    pub fn republish(&self) {
        match (self.get(), self.user()) {
            (Some(_), Some(user)) => self.publish(SessionState::Authenticated(user)),
            _ => self.publish(SessionState::Unauthenticated),
        }
    }

    pub fn publish(&self, state: SessionState) {
        log::info!("Session state: {}", state);
        self.state.send_replace(state);
    }

    fn clear_slots(&self) {
        self.storage.remove(TOKEN_SLOT);
        self.storage.remove(USER_SLOT);
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}
