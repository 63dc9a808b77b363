//! Core library surface for the Daily Bread devotional TUI.
//!
//! The binary only wires these pieces together; tests and other tooling can
//! drive the content store, the quiz engine and the generative client
//! directly.
pub mod config;
pub mod db;
pub mod error;
pub mod genai;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod quiz;
pub mod ui;

pub use config::{AppConfig, GenAiConfig};
pub use db::{ContentStore, KeyValueStore, MemoryStore, SqliteStore};
pub use error::{AudioError, ConfigError, QuizError, ServiceError, StoreError};
pub use genai::GenAiClient;
pub use models::{
    Article, Comment, ContentItem, ContentKind, Prayer, PrayerKind, PrayerRequest, QuizQuestion,
    Study,
};
pub use quiz::{QuizSession, QuizState};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
