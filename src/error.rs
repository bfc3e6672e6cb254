use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by ComfyUI operations.
#[derive(Error, Debug)]
pub enum ComfyError {
    /// ComfyUI returned a non-success HTTP status.
    #[error("ComfyUI returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// A request URL could not be built from the configured base address.
    #[error("Invalid ComfyUI URL: {0}")]
    InvalidUrl(String),

    /// A response body was not the JSON document we expected.
    #[error("{context}: {source}")]
    Decode {
        context: String,
        source: serde_json::Error,
    },

    /// A decoded response was missing an expected field.
    #[error("ComfyUI response is missing {0}")]
    MissingField(String),

    /// Writing a downloaded image to disk failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `max_wait` elapsed before the prompt showed up in history.
    #[error("Prompt {prompt_id} did not finish within {waited:?} ({attempts} polls)")]
    Timeout {
        prompt_id: String,
        waited: Duration,
        attempts: u32,
    },

    /// The caller raised the cancellation flag while we were waiting.
    #[error("Waiting for prompt {prompt_id} was cancelled")]
    Cancelled { prompt_id: String },
}

impl ComfyError {
    /// True for failures of the HTTP exchange itself (connect, status, URL).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ComfyError::Http { .. } | ComfyError::Network { .. } | ComfyError::InvalidUrl(_)
        )
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        ComfyError::MissingField(field.into())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ComfyError>;
