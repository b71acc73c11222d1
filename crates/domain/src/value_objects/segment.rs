//! Journey segment - the half-open stop-sequence range a passenger occupies
//!
//! A segment `[board, alight)` claims the seat from the boarding stop up to,
//! but not including, the alighting stop. Two bookings for the same seat can
//! coexist exactly when their segments do not overlap, so every overlap test
//! in the system goes through [`Segment::overlaps`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A half-open range `[board, alight)` of stop sequence indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    board: u32,
    alight: u32,
}

impl Segment {
    /// Create a segment from boarding and alighting sequence indices
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSegment`] unless `board < alight`.
    pub fn new(board: u32, alight: u32) -> Result<Self, DomainError> {
        if board >= alight {
            return Err(DomainError::InvalidSegment { board, alight });
        }
        Ok(Self { board, alight })
    }

    /// Boarding stop sequence index
    #[must_use]
    pub const fn board(&self) -> u32 {
        self.board
    }

    /// Alighting stop sequence index
    #[must_use]
    pub const fn alight(&self) -> u32 {
        self.alight
    }

    /// Half-open interval intersection test
    ///
    /// Adjacent segments such as `[0,2)` and `[2,4)` do not overlap: a
    /// passenger alighting at stop 2 frees the seat for one boarding there.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.board < other.alight && other.board < self.alight
    }

    /// Number of stop-to-stop hops covered
    #[must_use]
    pub const fn hops(&self) -> u32 {
        self.alight - self.board
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.board, self.alight)
    }
}
