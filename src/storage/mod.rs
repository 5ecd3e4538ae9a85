pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Slot holding the backend-issued session token.
pub const TOKEN_SLOT: &str = "accessToken";
/// Slot holding the JSON snapshot of the signed-in user.
pub const USER_SLOT: &str = "user";

/// Durable client storage made of named string slots.
///
/// Reads are synchronous and side-effect free. Writes are last-write-wins;
/// implementations log and swallow write failures instead of surfacing them.
pub trait SlotStorage: Send + Sync {
    fn load(&self, slot: &str) -> Option<String>;
    fn save(&self, slot: &str, value: &str);
    fn remove(&self, slot: &str);
}
