//! Local settings
//!
//! Theme, avatars, system role and API key, kept in a local key-value store.

pub mod preferences;
pub mod store;

pub use preferences::{
    Preferences, Theme, API_KEY_KEY, DEFAULT_ROBOT_AVATAR, DEFAULT_USER_AVATAR, ROBOT_AVATAR_KEY,
    SYSTEM_ROLE_KEY, THEME_KEY, USER_AVATAR_KEY,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
