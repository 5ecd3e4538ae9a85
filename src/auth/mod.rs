pub mod identity;
pub mod session;
pub mod state;
pub mod token_store;

pub use identity::{FirebaseIdentityProvider, IdentityCredential, IdentityProvider};
pub use session::AuthSession;
pub use state::SessionState;
pub use token_store::TokenStore;
