//! Ports - interfaces implemented by infrastructure adapters

mod booking_store;
mod clock;
mod trip_directory;

pub use booking_store::BookingStorePort;
pub use clock::{ClockPort, FixedClock};
pub use trip_directory::TripDirectoryPort;

#[cfg(test)]
pub use booking_store::MockBookingStorePort;
#[cfg(test)]
pub use clock::MockClockPort;
#[cfg(test)]
pub use trip_directory::MockTripDirectoryPort;
