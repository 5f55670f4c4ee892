//! Error types used throughout the client layer

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impl_label_conversions;

/// Kinds of authentication failure surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorKind {
    /// No auth context is established
    MissingApiKey,
    /// Upstream rejected the key even after a refresh
    InvalidApiKey,
    /// The credential provider could not refresh the key
    ExpiredToken,
    /// The key is valid but not allowed to perform the operation
    InsufficientPermissions,
    /// The auth context is incomplete or malformed
    InvalidContext,
}

impl_label_conversions!(AuthErrorKind {
    MissingApiKey => "missing_api_key",
    InvalidApiKey => "invalid_api_key",
    ExpiredToken => "expired_token",
    InsufficientPermissions => "insufficient_permissions",
    InvalidContext => "invalid_context",
});

impl AuthErrorKind {
    /// HTTP status a UI layer should associate with this failure.
    pub fn status_hint(self) -> u16 {
        match self {
            Self::MissingApiKey | Self::InvalidApiKey | Self::ExpiredToken => 401,
            Self::InsufficientPermissions => 403,
            Self::InvalidContext => 400,
        }
    }
}

/// Authentication failure with its HTTP status hint
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub status: u16,
    pub message: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        Self { kind, status: kind.status_hint(), message: message.into() }
    }

    /// Override the status hint with the status actually observed upstream.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn missing_api_key() -> Self {
        Self::new(AuthErrorKind::MissingApiKey, "no auth context is established")
    }

    pub fn invalid_context(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidContext, message)
    }

    pub fn expired_token(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::ExpiredToken, message)
    }

    pub fn invalid_api_key(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidApiKey, message)
    }

    pub fn insufficient_permissions(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InsufficientPermissions, message)
    }

    /// Context errors are never retried and never masked by cached data.
    pub fn is_context_error(&self) -> bool {
        matches!(self.kind, AuthErrorKind::MissingApiKey | AuthErrorKind::InvalidContext)
    }

    /// Whether the UI should send the user back through login.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self.kind, AuthErrorKind::ExpiredToken | AuthErrorKind::MissingApiKey)
    }
}

/// Transport-level failures, distinct from HTTP error statuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<TransportError> },
}

impl TransportError {
    /// Timeouts and connection failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::ConnectionFailed(_))
    }
}

/// Main error type returned by the client facade
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("upstream returned status {status}: {message}")]
    Http { status: u16, code: Option<String>, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Stable label suitable for metrics and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http",
            Self::Decode(_) => "decode",
            Self::Config(_) => "config",
        }
    }

    pub fn auth_kind(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Auth(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Only an expired token or a missing session warrants a login redirect;
    /// transport and permission errors never do.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, Self::Auth(err) if err.requires_reauthentication())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
