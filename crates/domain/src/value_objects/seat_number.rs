//! Seat number value object
//!
//! Seat labels are opaque strings scoped to a bus ("1".."28", "U4", ...).
//! Seats carry no state of their own; availability is always derived from
//! confirmed bookings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A seat label scoped to a bus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatNumber(String);

impl SeatNumber {
    /// Create a seat number from a label
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSeatNumber`] if the label is empty or
    /// whitespace-only.
    pub fn new(label: impl Into<String>) -> Result<Self, DomainError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidSeatNumber(label));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Seat number for a 1-based position in the bus
    #[must_use]
    pub fn from_position(position: u32) -> Self {
        Self(position.to_string())
    }

    /// Get the seat label
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric position of the seat, when the label is numeric
    #[must_use]
    pub fn position(&self) -> Option<u32> {
        self.0.parse().ok()
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SeatNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
