//! Application services - the availability and booking engines

mod availability_service;
mod booking_service;

pub use availability_service::{
    AvailabilityConfig, AvailabilityService, SeatMap, SeatMapEntry, TripMatch, TripSearch,
};
pub use booking_service::{
    BookedSeat, BookingConfirmation, BookingRecord, BookingRequest, BookingService,
    BookingServiceConfig, CancellationReceipt, ConfirmedSeat,
};
