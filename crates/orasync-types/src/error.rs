//! Typed error model shared across the engine layers.
//!
//! Lower layers return rich [`EntityError`]s rather than bare booleans
//! so the discovery coordinator can tell "source unreachable" from
//! "source reachable but discovery unsupported", and so the retry
//! wrapper can decide backoff from the error itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connect::AttemptRecord;

#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    #[error("config")]
    Config,
    #[error("auth")]
    Auth,
    #[error("transient_network")]
    TransientNetwork,
    #[error("transient_db")]
    TransientDb,
    #[error("protocol")]
    Protocol,
    #[error("schema")]
    Schema,
    #[error("synthesis")]
    Synthesis,
    #[error("internal")]
    Internal,
    #[error("cancelled")]
    Cancelled,
}

/// Backoff pacing hint attached to retryable errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BackoffClass {
    Fast,
    Normal,
    Slow,
}

/// Opaque error code following SCREAMING_SNAKE_CASE convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ErrorCode(pub String);

impl ErrorCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ErrorCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[error(
    "[{category}] {code} ({retryability}): {message}",
    retryability = if *.retryable { "retryable" } else { "fatal" }
)]
pub struct EntityError {
    pub category: ErrorCategory,
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
    pub backoff_class: BackoffClass,
    /// Connection-attempt trail, populated when the error came out of
    /// the resilience layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptRecord>,
}

impl EntityError {
    /// Configuration error (never retried).
    pub fn config(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Config,
            code: code.into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Authentication error (never retried).
    pub fn auth(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Auth,
            code: code.into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Transient network error (retryable, normal backoff).
    pub fn transient_network(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::TransientNetwork,
            code: code.into(),
            message: message.into(),
            retryable: true,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Transient database error (retryable, normal backoff).
    pub fn transient_db(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::TransientDb,
            code: code.into(),
            message: message.into(),
            retryable: true,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Protocol/compatibility error (one fallback escalation, no retry loop).
    pub fn protocol(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Protocol,
            code: code.into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Schema-resolution error: every discovery strategy exhausted.
    pub fn schema(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Schema,
            code: code.into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Synthesis error (fatal for the entity, never downgraded).
    pub fn synthesis(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Synthesis,
            code: code.into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Internal error (never retried).
    pub fn internal(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Internal,
            code: code.into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Caller deadline expired; distinct from "source unreachable".
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Cancelled,
            code: "DEADLINE_EXCEEDED".into(),
            message: message.into(),
            retryable: false,
            backoff_class: BackoffClass::Normal,
            attempts: Vec::new(),
        }
    }

    /// Attach the connection-attempt trail for diagnostics.
    pub fn with_attempts(mut self, attempts: Vec<AttemptRecord>) -> Self {
        self.attempts = attempts;
        self
    }

    /// Override the default backoff pacing.
    pub fn with_backoff(mut self, class: BackoffClass) -> Self {
        self.backoff_class = class;
        self
    }
}
