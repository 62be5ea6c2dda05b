//! Error types for the summariser.

use thiserror::Error;

/// Classification shared by every provider adapter for request-time failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider rejected the API key.
    AuthError,
    /// Too many requests or exhausted quota.
    RateLimited,
    /// The model identifier is unknown or malformed.
    ModelNotFound,
    /// Connection, timeout or broken stream.
    NetworkError,
    /// Anything the adapter could not classify.
    UnknownProviderError,
}

impl ErrorKind {
    /// HTTP status the web layer answers with for this kind.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::AuthError => 401,
            ErrorKind::RateLimited => 429,
            ErrorKind::ModelNotFound => 404,
            ErrorKind::NetworkError | ErrorKind::UnknownProviderError => 502,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::AuthError => write!(f, "authentication failed"),
            ErrorKind::RateLimited => write!(f, "rate limited"),
            ErrorKind::ModelNotFound => write!(f, "model not found"),
            ErrorKind::NetworkError => write!(f, "network error"),
            ErrorKind::UnknownProviderError => write!(f, "provider error"),
        }
    }
}

/// A classified failure reported by a provider adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    /// The backend's original message, kept for diagnostics.
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownProviderError, message)
    }
}

/// Library-level error type for summariser operations.
#[derive(Error, Debug)]
pub enum SummariserError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{source}")]
    Provider {
        #[source]
        source: ProviderError,
        /// Text streamed before the failure. Empty when nothing arrived.
        partial_text: String,
    },

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SummariserError {
    /// The provider classification, for request-time failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SummariserError::Provider { source, .. } => Some(source.kind),
            _ => None,
        }
    }

    /// Text accumulated before a request-time failure, if any.
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            SummariserError::Provider { partial_text, .. } if !partial_text.is_empty() => {
                Some(partial_text)
            }
            _ => None,
        }
    }
}

impl From<ProviderError> for SummariserError {
    fn from(source: ProviderError) -> Self {
        SummariserError::Provider {
            source,
            partial_text: String::new(),
        }
    }
}

/// Result type alias for summariser operations.
pub type Result<T> = std::result::Result<T, SummariserError>;
