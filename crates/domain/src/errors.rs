//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Journey segment has a boarding index at or past the alighting index
    #[error("Invalid journey segment: board {board} must be before alight {alight}")]
    InvalidSegment { board: u32, alight: u32 },

    /// Seat label is empty or malformed
    #[error("Invalid seat number: {0}")]
    InvalidSeatNumber(String),

    /// Booking reference string is not a well-formed PNR
    #[error("Invalid booking reference: {0}")]
    InvalidPnr(String),

    /// Trip stop list violates the route topology invariants
    #[error("Invalid route topology: {0}")]
    InvalidTopology(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Date/time parsing error
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
