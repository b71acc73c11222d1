//! Value objects - validated, immutable domain primitives

mod account_id;
mod booking_id;
mod bus_category;
mod bus_id;
mod pnr;
mod seat_number;
mod segment;
mod trip_id;

pub use account_id::AccountId;
pub use booking_id::BookingId;
pub use bus_category::BusCategory;
pub use bus_id::BusId;
pub use pnr::Pnr;
pub use seat_number::SeatNumber;
pub use segment::Segment;
pub use trip_id::TripId;
