//! Engine error model and retry backoff helpers.

use std::time::Duration;

use orasync_types::{BackoffClass, EntityError};

const BACKOFF_FAST_BASE_MS: u64 = 100;
const BACKOFF_NORMAL_BASE_MS: u64 = 1_000;
const BACKOFF_SLOW_BASE_MS: u64 = 5_000;
const BACKOFF_MAX_MS: u64 = 60_000;

/// Categorized sync error for retry decisions.
///
/// `Entity` wraps a typed [`EntityError`] carrying retry metadata.
/// `Infrastructure` wraps opaque host-side errors (task join failures,
/// config file I/O, etc.) that are never retryable.
#[derive(Debug)]
pub enum SyncError {
    /// Typed per-entity error with retry metadata.
    Entity(EntityError),
    /// Infrastructure error (task panic, config I/O, etc.)
    Infrastructure(anyhow::Error),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity(e) => write!(f, "{e}"),
            Self::Infrastructure(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<anyhow::Error> for SyncError {
    fn from(e: anyhow::Error) -> Self {
        Self::Infrastructure(e)
    }
}

impl From<EntityError> for SyncError {
    fn from(e: EntityError) -> Self {
        Self::Entity(e)
    }
}

impl SyncError {
    /// True if this is a typed entity error marked retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Entity(e) => e.retryable,
            Self::Infrastructure(_) => false,
        }
    }

    /// The typed entity error, if this is an `Entity` variant.
    pub fn as_entity_error(&self) -> Option<&EntityError> {
        match self {
            Self::Entity(e) => Some(e),
            Self::Infrastructure(_) => None,
        }
    }
}

/// Compute retry delay from the error's backoff class and attempt number.
pub(crate) fn compute_backoff(err: &EntityError, attempt: u32) -> Duration {
    let base_ms: u64 = match err.backoff_class {
        BackoffClass::Fast => BACKOFF_FAST_BASE_MS,
        BackoffClass::Normal => BACKOFF_NORMAL_BASE_MS,
        BackoffClass::Slow => BACKOFF_SLOW_BASE_MS,
    };

    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    Duration::from_millis(delay_ms.min(BACKOFF_MAX_MS))
}
