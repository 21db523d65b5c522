//! Error taxonomy for CMS access and page rendering

use thiserror::Error;

/// Errors raised while talking to the content API or rendering pages
#[derive(Debug, Error)]
pub enum BlogError {
    /// Transport failure, timeout, or an unexpected status from the API
    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Unknown document identifier
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body did not match the expected document shape
    #[error("malformed response: {message}: {source}")]
    MalformedResponse {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The "load more" path failed; the caller should offer a retry
    #[error("failed to load more posts: {0}")]
    ClientFetchFailed(String),

    /// A pagination cursor that does not point at the configured API
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// The API root advertised no master ref
    #[error("content API returned no master ref")]
    MissingRef,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BlogError>;

/// Attaches a message to lower-level errors while converting them
pub trait WithMessage<T> {
    fn with_message(self, message: &str) -> Result<T>;
}

impl<T> WithMessage<T> for std::result::Result<T, reqwest::Error> {
    fn with_message(self, message: &str) -> Result<T> {
        self.map_err(|e| BlogError::BackendUnavailable {
            message: format!("{}: {}", message, e),
            source: Some(e),
        })
    }
}

impl<T> WithMessage<T> for std::result::Result<T, serde_json::Error> {
    fn with_message(self, message: &str) -> Result<T> {
        self.map_err(|e| BlogError::MalformedResponse {
            message: message.to_string(),
            source: e,
        })
    }
}

impl BlogError {
    /// Whether the error came from the remote side rather than from our input
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            BlogError::BackendUnavailable { .. } | BlogError::MalformedResponse { .. }
        )
    }
}
