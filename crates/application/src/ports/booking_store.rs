//! Booking storage port
//!
//! Defines the persistence interface for bookings. The one hard requirement
//! on adapters: `save_all` commits every row of a request in a single atomic
//! unit, and reports a uniqueness-constraint violation as
//! [`ApplicationError::Conflict`] rather than a generic storage failure.

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::entities::Booking;
use domain::value_objects::{AccountId, Pnr, TripId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for booking persistence operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookingStorePort: Send + Sync {
    /// Persist all rows of one booking request atomically
    ///
    /// Either every row is committed or none; a crash mid-commit must leave
    /// zero seats claimed for the request.
    async fn save_all(&self, bookings: &[Booking]) -> Result<(), ApplicationError>;

    /// All CONFIRMED bookings for a trip and travel date
    async fn confirmed_for_trip_date(
        &self,
        trip_id: &TripId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, ApplicationError>;

    /// All rows sharing a booking reference (one per seat)
    async fn find_by_pnr(&self, pnr: &Pnr) -> Result<Vec<Booking>, ApplicationError>;

    /// Bookings owned by an account, most recent first
    async fn list_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Booking>, ApplicationError>;

    /// Mark all still-confirmed rows of a reference CANCELLED
    ///
    /// Returns the number of rows that actually transitioned; cancelling an
    /// already-cancelled reference returns 0 and is not an error.
    async fn cancel_by_pnr(&self, pnr: &Pnr) -> Result<u64, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn BookingStorePort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn BookingStorePort>();
    }
}
