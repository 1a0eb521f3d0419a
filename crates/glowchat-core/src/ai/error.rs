//! Chat endpoint error types

use reqwest::StatusCode;
use thiserror::Error;

/// Why an exchange with the chat endpoint failed.
///
/// The controller shows the same apology for all of these; the variant only
/// matters for logs and tests.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Connection refused, DNS failure, timeout, or the body couldn't be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-2xx status
    #[error("endpoint returned {status}: {body}")]
    Protocol { status: StatusCode, body: String },

    /// Body didn't match the chat-completion schema
    #[error("malformed response: {0}")]
    Format(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeErrorKind {
    Transport,
    Protocol,
    Format,
}

impl ExchangeError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn kind(&self) -> ExchangeErrorKind {
        match self {
            Self::Transport(_) => ExchangeErrorKind::Transport,
            Self::Protocol { .. } => ExchangeErrorKind::Protocol,
            Self::Format(_) => ExchangeErrorKind::Format,
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}
