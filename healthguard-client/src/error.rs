//! Error taxonomy shared by every controller
//!
//! Nothing here is fatal: each variant maps to a user-visible notice and the
//! view returns to an interactive state.

use crate::config::ConfigError;
use crate::session::SessionError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Generic notice for transport failures.
pub const CONNECTION_FAILED: &str = "Server connection failed, please try again later";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Caught locally, before any request is issued
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// `success: false` payload or non-2xx status
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },
    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("a request is already in progress")]
    Busy,
    #[error("already checked in today")]
    AlreadyCheckedIn,
    #[error("not authenticated")]
    NotAuthenticated,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ClientError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        ClientError::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation { .. })
    }

    /// Text to show the user. Backend messages are passed verbatim, an empty
    /// one falls back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Transport(_) => CONNECTION_FAILED.to_string(),
            ClientError::Backend { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Backend { .. } | ClientError::Decode { .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}
