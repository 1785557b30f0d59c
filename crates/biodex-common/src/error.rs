use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiodexError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session is not authenticated")]
    Unauthenticated,

    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BiodexError {
    /// True for the "upstream unavailable" class: network failures, timeouts,
    /// non-2xx statuses other than 401, and payloads that could not be read.
    pub fn needs_fallback(&self) -> bool {
        match self {
            BiodexError::Http(_)
            | BiodexError::Serialization(_)
            | BiodexError::UpstreamStatus { .. }
            | BiodexError::MalformedPayload(_) => true,
            BiodexError::Unauthenticated
            | BiodexError::SecurityError(_)
            | BiodexError::InvalidInput(_)
            | BiodexError::Config(_)
            | BiodexError::Other(_) => false,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, BiodexError::Unauthenticated)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BiodexError::Http(e) if e.is_timeout())
    }
}

pub type Result<T> = std::result::Result<T, BiodexError>;
