use rust_decimal::Decimal;
use thiserror::Error;

use crate::driver::SyncStep;

/// A variant whose prices cannot produce a sell price. The variant is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPricingInput {
    #[error("retail price must be positive, got {retail}")]
    NonPositiveRetail { retail: Decimal },

    #[error("wholesale price must not be negative, got {wholesale}")]
    NegativeWholesale { wholesale: Decimal },
}

/// Two items of one product share the same option tuple.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate variant ({color}, {size}) in product {grouping_key}: skus {first_sku} and {duplicate_sku}")]
pub struct DuplicateVariant {
    pub grouping_key: String,
    pub color: String,
    pub size: String,
    pub first_sku: String,
    pub duplicate_sku: String,
}

/// Failure reading or writing persisted sync state. Always fatal for the run.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of one remote call after classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("remote validation error (HTTP {status}): {message}")]
    Validation { status: u16, message: String },

    #[error("transient remote error (HTTP {status:?}): {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },

    #[error("unexpected remote response: {0}")]
    InvalidResponse(String),
}

impl PlatformError {
    /// `true` for conditions that may clear up on their own: 429s, 5xx and
    /// network failures.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient { .. })
    }

    /// HTTP status for log fields, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Validation { status, .. } => Some(*status),
            Self::Transient { status, .. } => *status,
            Self::InvalidResponse(_) => None,
        }
    }
}

/// Why a single product was not (fully) synced. The run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error(transparent)]
    DuplicateVariant(#[from] DuplicateVariant),

    #[error("product {grouping_key} has no sellable variants")]
    NoSellableVariants { grouping_key: String },

    #[error("{step} failed: {source}")]
    Remote {
        step: SyncStep,
        #[source]
        source: PlatformError,
    },
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("state persistence failed: {0}")]
    StatePersistence(#[from] StateError),
}
