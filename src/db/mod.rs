//! Persistence split across logical submodules: the key-value capability and
//! its SQLite backend, generic collection CRUD, the prayer board mutations and
//! the built-in seed content.

mod collections;
mod community;
mod connection;
mod kv;
mod seed;

pub use collections::{ContentStore, Record};
pub use connection::SqliteStore;
pub use kv::{KeyValueStore, MemoryStore};

/// Storage keys, one JSON array per collection.
pub mod keys {
    pub const STUDIES: &str = "ebd_studies";
    pub const ARTICLES: &str = "ebd_articles";
    pub const PRAYERS: &str = "ebd_prayers";
    pub const QUIZ: &str = "ebd_quiz";
    pub const COMMUNITY_PRAYERS: &str = "ebd_community_prayers";
}
