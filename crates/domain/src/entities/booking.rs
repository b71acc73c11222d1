//! Booking entity - one confirmed seat claim on a trip segment
//!
//! Bookings are created atomically by the booking transaction engine and are
//! never physically deleted; the only permitted mutation is the transition
//! to CANCELLED, which frees the seat interval for future overlap checks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;
use crate::value_objects::{AccountId, BookingId, Pnr, SeatNumber, Segment, TripId};

/// Lifecycle status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Seat claim is live and blocks overlapping sales
    Confirmed,
    /// Claim released; no longer counted by availability
    Cancelled,
}

impl BookingStatus {
    /// Whether this booking still claims its seat interval
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Storage representation
    #[must_use]
    pub const fn as_db_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse the storage representation
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ValidationError`] for unknown status strings.
    pub fn from_db_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "CONFIRMED" => Ok(Self::Confirmed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(DomainError::ValidationError(format!(
                "unknown booking status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Passenger details carried on a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Passenger {
    /// Passenger name
    #[validate(length(min = 1, max = 120, message = "name is required"))]
    pub name: String,
    /// Contact phone number
    #[validate(length(min = 4, max = 20, message = "phone must be 4-20 characters"))]
    pub phone: String,
}

impl Passenger {
    /// Create a validated passenger record
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ValidationError`] when the name is empty or
    /// the phone number is out of shape.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Result<Self, DomainError> {
        let name: String = name.into();
        let phone: String = phone.into();
        let passenger = Self {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
        };
        passenger
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        Ok(passenger)
    }
}

/// One seat claim on a trip segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique row identifier
    pub id: BookingId,
    /// Booking reference shared by all seats of one request
    pub pnr: Pnr,
    /// Trip being travelled
    pub trip_id: TripId,
    /// Concrete calendar date of travel
    pub travel_date: NaiveDate,
    /// Claimed seat
    pub seat_no: SeatNumber,
    /// Claimed stop-sequence interval
    pub segment: Segment,
    /// Passenger occupying the seat
    pub passenger: Passenger,
    /// Fare charged, in whole currency units
    pub fare_amount: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Creation timestamp
    pub booked_at: DateTime<Utc>,
    /// Owning account; None for guest bookings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
}

impl Booking {
    /// Create a confirmed booking
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn confirmed(
        pnr: Pnr,
        trip_id: TripId,
        travel_date: NaiveDate,
        seat_no: SeatNumber,
        segment: Segment,
        passenger: Passenger,
        fare_amount: u32,
        booked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            pnr,
            trip_id,
            travel_date,
            seat_no,
            segment,
            passenger,
            fare_amount,
            status: BookingStatus::Confirmed,
            booked_at,
            account_id: None,
        }
    }

    /// Attach an owning account
    #[must_use]
    pub const fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Cancel this booking
    ///
    /// Returns `true` if the status changed; cancelling an already-cancelled
    /// booking has no further effect.
    pub fn cancel(&mut self) -> bool {
        if self.status == BookingStatus::Cancelled {
            return false;
        }
        self.status = BookingStatus::Cancelled;
        true
    }

    /// Whether this booking blocks the given seat over the given segment
    #[must_use]
    pub fn conflicts_with(&self, seat: &SeatNumber, segment: &Segment) -> bool {
        self.status.is_active() && self.seat_no == *seat && self.segment.overlaps(segment)
    }
}

impl std::fmt::Display for Booking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} seat {} {} on {} ({})",
            self.pnr, self.seat_no, self.segment, self.travel_date, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample_booking() -> Booking {
        Booking::confirmed(
            Pnr::generate(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
            TripId::new(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            SeatNumber::from_position(5),
            Segment::new(0, 2).unwrap(),
            Passenger::new("Priya", "9876543210").unwrap(),
            690,
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn new_booking_is_confirmed_guest() {
        let booking = sample_booking();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.account_id.is_none());
    }

    #[test]
    fn with_account_attaches_owner() {
        let account = AccountId::new();
        let booking = sample_booking().with_account(account);
        assert_eq!(booking.account_id, Some(account));
    }

    #[test]
    fn cancel_transitions_once() {
        let mut booking = sample_booking();
        assert!(booking.cancel());
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(!booking.cancel());
        assert_eq!(booking.status, BookingStatus::Cancelled);
    }

    #[test]
    fn conflicts_when_seat_and_segment_overlap() {
        let booking = sample_booking();
        let overlapping = Segment::new(0, 1).unwrap();
        assert!(booking.conflicts_with(&SeatNumber::from_position(5), &overlapping));
    }

    #[test]
    fn no_conflict_on_other_seat() {
        let booking = sample_booking();
        let overlapping = Segment::new(0, 1).unwrap();
        assert!(!booking.conflicts_with(&SeatNumber::from_position(6), &overlapping));
    }

    #[test]
    fn no_conflict_on_disjoint_segment() {
        let booking = sample_booking();
        let disjoint = Segment::new(2, 3).unwrap();
        assert!(!booking.conflicts_with(&SeatNumber::from_position(5), &disjoint));
    }

    #[test]
    fn cancelled_booking_never_conflicts() {
        let mut booking = sample_booking();
        booking.cancel();
        let overlapping = Segment::new(0, 2).unwrap();
        assert!(!booking.conflicts_with(&SeatNumber::from_position(5), &overlapping));
    }

    #[test]
    fn passenger_validation() {
        assert!(Passenger::new("", "9876543210").is_err());
        assert!(Passenger::new("Priya", "12").is_err());
        assert!(Passenger::new("Priya", "9876543210").is_ok());
    }

    #[test]
    fn status_db_roundtrip() {
        for status in [BookingStatus::Confirmed, BookingStatus::Cancelled] {
            assert_eq!(BookingStatus::from_db_str(status.as_db_str()).unwrap(), status);
        }
        assert!(BookingStatus::from_db_str("PENDING").is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let booking = sample_booking();
        let json = serde_json::to_string(&booking).unwrap();
        let parsed: Booking = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.pnr, booking.pnr);
        assert_eq!(parsed.seat_no, booking.seat_no);
        assert_eq!(parsed.status, booking.status);
    }
}
