//! Trip directory port
//!
//! Read-only view of the trip/stop/fare data owned by the route-import
//! collaborator. The booking core never writes through this port; adapters
//! in the infrastructure layer implement it over the imported tables.

use async_trait::async_trait;
use domain::entities::{Bus, Trip};
use domain::fare::FareTable;
use domain::value_objects::{BusId, TripId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for read-only trip, bus, and fare-rate lookups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TripDirectoryPort: Send + Sync {
    /// Get a trip with its ordered stop list
    async fn trip(&self, id: &TripId) -> Result<Option<Trip>, ApplicationError>;

    /// All trips scheduled for a day-number slot (1-31)
    async fn trips_for_day(&self, day_no: u8) -> Result<Vec<Trip>, ApplicationError>;

    /// Get a bus by ID
    async fn bus(&self, id: &BusId) -> Result<Option<Bus>, ApplicationError>;

    /// Current fare rate table
    async fn fare_table(&self) -> Result<FareTable, ApplicationError>;
}
