//! Application-level errors
//!
//! The taxonomy callers see: lookup failures, malformed input, business
//! rejections, race losses, and transient storage trouble are all distinct,
//! so a caller never mistakes infrastructure failure for "seat taken".

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Referenced trip, stop, or booking reference does not exist
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Malformed request; the caller must correct its input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Business-rule rejection (past travel, trip not running, seat taken)
    #[error("Booking rejected: {0}")]
    Rejected(String),

    /// Commit lost a race with a concurrent writer
    ///
    /// Caller-equivalent to a "seat unavailable" rejection, but kept
    /// distinguishable for metrics.
    #[error("Booking conflict: {0}")]
    Conflict(String),

    /// Bounded wait for the trip/date booking lock expired
    #[error("Timed out waiting for the booking lock on {0}")]
    LockTimeout(String),

    /// Transient failure at the persistence boundary
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Rejection for a seat that is already claimed over the segment
    pub fn seat_unavailable(seat: impl std::fmt::Display) -> Self {
        Self::Rejected(format!("Seat {seat} is not available"))
    }

    /// Check if this error is retryable by the caller as-is
    ///
    /// Business rejections are not: resubmitting the same request cannot
    /// succeed until state changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::LockTimeout(_))
    }
}
