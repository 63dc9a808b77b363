//! Typed errors for the library seams. The TUI and `main` wrap these in
//! `anyhow` the same way they wrap everything else.

use thiserror::Error;

/// Failures raised by the content store. Display reads never produce these: a
/// missing or unreadable collection falls back to its defaults instead. A
/// mutation whose read fails reports the failure and writes nothing.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Persisting a collection failed. The caller may retry or ignore it; the
    /// in-memory view already reflects the attempted mutation.
    #[error("failed to write collection `{key}`: {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend could not read a collection. Mutations stop here rather
    /// than writing defaults over data they could not see.
    #[error("failed to read collection `{key}`: {source}")]
    StorageRead {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// SQLite error outside of a collection write (opening, schema).
    #[error("database error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// Filesystem error while preparing the data directory.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No platform data directory could be resolved.
    #[error("could not determine application data directory")]
    NoDataDir,

    /// A record could not be encoded as JSON.
    #[error("failed to encode collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn read<E>(key: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::StorageRead {
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn write<E>(key: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::StorageWrite {
            key: key.to_string(),
            source: Box::new(source),
        }
    }
}

/// Rejected quiz transitions. None of these change session state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("a quiz needs at least one question")]
    EmptyQuiz,

    #[error("this question was already answered")]
    AlreadyAnswered,

    #[error("answer the question before moving on")]
    NotAnswered,

    #[error("the quiz is finished")]
    Finished,

    #[error("option {index} does not exist (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },
}

/// Errors talking to the generative content service. They never leave the
/// `genai` module: every capability reports them and returns `None`.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No API key is configured.
    #[error("generative service is not configured")]
    Unavailable,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("request timed out")]
    Timeout,
}

/// Errors decoding synthesized speech.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PCM payload has an odd byte length ({0})")]
    OddByteLength(usize),

    #[error("audio payload is empty")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Layered configuration could not be extracted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}
