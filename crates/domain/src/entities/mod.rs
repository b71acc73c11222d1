//! Domain entities

mod booking;
mod bus;
mod trip;

pub use booking::{Booking, BookingStatus, Passenger};
pub use bus::{Bus, SeatLayout};
pub use trip::{Trip, TripStatus, TripStop};
