use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Failure fetching an ad list or a job. Unlike tracking errors these
/// reach the UI, which shows a retry action with a message keyed off
/// the variant.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Resource not found")]
    NotFound,

    #[error("Server error (HTTP {status})")]
    Server { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] crate::db::DatabaseError),
}

impl FetchError {
    /// User-facing message. The UI distinguishes not-found, server and
    /// network/offline failures.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NotFound => "This content is no longer available.",
            FetchError::Server { .. } => "Something went wrong on our side. Please try again.",
            FetchError::Network(_) => "You appear to be offline. Check your connection and retry.",
            FetchError::Decode { .. } | FetchError::Storage(_) => {
                "Something went wrong loading this content."
            }
        }
    }
}

/// All media URL candidates failed, or the manual retry budget ran out.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("No media candidates to try")]
    NoCandidates,

    #[error("All {attempts} media URL candidates failed to load")]
    AllCandidatesFailed { attempts: usize },

    #[error("Media retry budget exhausted")]
    RetriesExhausted,
}

/// Click/impression/view tracking failure. Always logged, never surfaced
/// to the user, never allowed to block navigation or display.
#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Tracking request failed: {0}")]
    Http(String),

    #[error("Tracking storage failed: {0}")]
    Storage(#[source] crate::db::DatabaseError),
}

pub type Result<T> = std::result::Result<T, AdboardError>;
