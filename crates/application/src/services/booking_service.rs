//! Booking transaction engine
//!
//! Validates a booking request against the clock, trip status, and segment
//! availability, then commits every seat of the request as one atomic unit.
//! Writers for the same trip and travel date are serialized by an exclusive
//! in-process lock held from the availability read through the commit, so
//! two requests can never both pass the availability check for the same
//! seat and overlapping segments. Unrelated trip/dates use unrelated locks.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use std::{fmt, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use domain::entities::{Booking, BookingStatus, Passenger, Trip};
use domain::value_objects::{AccountId, Pnr, SeatNumber, Segment, TripId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{BookingStorePort, ClockPort, TripDirectoryPort},
    services::availability_service::booked_seats_for_segment,
};

/// Configuration for the booking engine
#[derive(Debug, Clone)]
pub struct BookingServiceConfig {
    /// Operating timezone for past-date/past-departure rejection
    pub timezone: Tz,
    /// Bounded wait for the per-trip/date booking lock
    pub lock_wait: Duration,
    /// Attempts to commit under a fresh reference before giving up
    pub pnr_commit_attempts: u32,
}

impl Default for BookingServiceConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
            lock_wait: Duration::from_secs(5),
            pnr_commit_attempts: 3,
        }
    }
}

/// A booking request, one or more seats on one trip segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Trip to travel
    pub trip_id: TripId,
    /// Concrete calendar date of travel
    pub travel_date: NaiveDate,
    /// Boarding stop sequence index
    pub board_seq: u32,
    /// Alighting stop sequence index
    pub alight_seq: u32,
    /// Requested seats
    pub seats: Vec<SeatNumber>,
    /// One passenger per requested seat, in seat order
    pub passengers: Vec<Passenger>,
    /// Owning account; None for guest bookings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
}

/// One confirmed seat in a booking confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedSeat {
    /// Seat label
    pub seat_no: SeatNumber,
    /// Passenger occupying the seat
    pub passenger: Passenger,
}

/// Result of a successful booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    /// Booking reference shared by all seats of the request
    pub pnr: Pnr,
    /// Always CONFIRMED on the success path
    pub status: BookingStatus,
    /// Trip booked
    pub trip_id: TripId,
    /// Route summary
    pub route: String,
    /// Travel date
    pub travel_date: NaiveDate,
    /// Boarding stop name
    pub board_stop: String,
    /// Alighting stop name
    pub alight_stop: String,
    /// Boarding sequence index
    pub board_seq: u32,
    /// Alighting sequence index
    pub alight_seq: u32,
    /// Fare per seat over the segment
    pub fare_per_seat: u32,
    /// Total fare for the request
    pub total_fare: u32,
    /// When the booking was committed
    pub booked_at: DateTime<Utc>,
    /// The claimed seats
    pub seats: Vec<ConfirmedSeat>,
}

/// One seat row in a booking record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedSeat {
    /// Seat label
    pub seat_no: SeatNumber,
    /// Passenger occupying the seat
    pub passenger: Passenger,
    /// Fare charged for this seat
    pub fare_amount: u32,
    /// Row status
    pub status: BookingStatus,
}

/// Full details behind a booking reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    /// Booking reference
    pub pnr: Pnr,
    /// CONFIRMED while any seat row is still active
    pub status: BookingStatus,
    /// Trip booked
    pub trip_id: TripId,
    /// Route summary
    pub route: String,
    /// Travel date
    pub travel_date: NaiveDate,
    /// Boarding stop name
    pub board_stop: String,
    /// Alighting stop name
    pub alight_stop: String,
    /// Boarding sequence index
    pub board_seq: u32,
    /// Alighting sequence index
    pub alight_seq: u32,
    /// When the booking was committed
    pub booked_at: DateTime<Utc>,
    /// Total fare across all seat rows
    pub total_fare: u32,
    /// Per-seat rows
    pub seats: Vec<BookedSeat>,
}

/// Outcome of a cancellation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationReceipt {
    /// Booking reference cancelled
    pub pnr: Pnr,
    /// Seat rows that transitioned to CANCELLED in this call
    pub released_seats: u64,
    /// True when every row was already cancelled before the call
    pub already_cancelled: bool,
}

type SegmentLockMap = HashMap<(TripId, NaiveDate), Arc<TokioMutex<()>>>;

/// The booking transaction engine
pub struct BookingService<D: TripDirectoryPort, B: BookingStorePort> {
    directory: Arc<D>,
    bookings: Arc<B>,
    clock: Arc<dyn ClockPort>,
    config: BookingServiceConfig,
    segment_locks: Arc<Mutex<SegmentLockMap>>,
}

impl<D: TripDirectoryPort, B: BookingStorePort> fmt::Debug for BookingService<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingService")
            .field("timezone", &self.config.timezone)
            .field("lock_wait", &self.config.lock_wait)
            .finish_non_exhaustive()
    }
}

impl<D: TripDirectoryPort, B: BookingStorePort> Clone for BookingService<D, B> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            bookings: Arc::clone(&self.bookings),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            // Clones share the lock map; the serialization guarantee spans them
            segment_locks: Arc::clone(&self.segment_locks),
        }
    }
}

impl<D: TripDirectoryPort, B: BookingStorePort> BookingService<D, B> {
    /// Create a new booking service
    #[must_use]
    pub fn new(
        directory: Arc<D>,
        bookings: Arc<B>,
        clock: Arc<dyn ClockPort>,
        config: BookingServiceConfig,
    ) -> Self {
        Self {
            directory,
            bookings,
            clock,
            config,
            segment_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validate and atomically commit a booking request
    #[instrument(skip(self, request), fields(trip_id = %request.trip_id, date = %request.travel_date))]
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
    ) -> Result<BookingConfirmation, ApplicationError> {
        info!(
            seats = request.seats.len(),
            board = request.board_seq,
            alight = request.alight_seq,
            "Creating booking"
        );
        validate_request_shape(request)?;

        let trip = self
            .directory
            .trip(&request.trip_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Trip", request.trip_id.to_string()))?;

        // Past-date / past-departure rejection against the injected clock
        let now_local = self.clock.now_utc().with_timezone(&self.config.timezone);
        let today = now_local.date_naive();
        if request.travel_date < today {
            return Err(ApplicationError::Rejected(
                "Cannot book for past dates".to_string(),
            ));
        }
        if request.travel_date == today
            && trip
                .stop_by_seq(request.board_seq)
                .and_then(|s| s.depart_time)
                .is_some_and(|dep| dep < now_local.time())
        {
            return Err(ApplicationError::Rejected(
                "Cannot book past departure times".to_string(),
            ));
        }

        if !trip.status.is_bookable() {
            return Err(ApplicationError::Rejected(format!(
                "Trip is not open for booking ({})",
                trip.status
            )));
        }

        let board_stop = trip
            .stop_by_seq(request.board_seq)
            .ok_or_else(|| ApplicationError::not_found("Stop", request.board_seq.to_string()))?
            .clone();
        let alight_stop = trip
            .stop_by_seq(request.alight_seq)
            .ok_or_else(|| ApplicationError::not_found("Stop", request.alight_seq.to_string()))?
            .clone();
        let segment = Segment::new(request.board_seq, request.alight_seq)
            .map_err(|e| ApplicationError::InvalidRequest(e.to_string()))?;

        let bus = self.directory.bus(&trip.bus_id).await?.ok_or_else(|| {
            ApplicationError::Internal(format!(
                "bus {} referenced by trip {} is missing",
                trip.bus_id, trip.id
            ))
        })?;

        // Serialize against other writers for this trip/date, bounded wait
        let lock = self.lock_for(trip.id, request.travel_date);
        let _guard = timeout(self.config.lock_wait, lock.lock_owned())
            .await
            .map_err(|_| {
                ApplicationError::LockTimeout(format!("{}/{}", trip.id, request.travel_date))
            })?;

        // Availability at commit time, under the lock
        let confirmed = self
            .bookings
            .confirmed_for_trip_date(&trip.id, request.travel_date)
            .await?;
        let blocked = booked_seats_for_segment(&confirmed, &segment);
        let available: BTreeSet<SeatNumber> = bus
            .seat_set()
            .into_iter()
            .filter(|seat| !blocked.contains(seat))
            .collect();
        for seat in &request.seats {
            if !available.contains(seat) {
                return Err(ApplicationError::seat_unavailable(seat));
            }
        }

        let distance_km = trip.segment_distance_km(&segment)?;
        let fare_table = self.directory.fare_table().await?;
        let fare_per_seat = fare_table.fare(&bus.category, distance_km);

        // Commit, regenerating the reference on a uniqueness collision
        let mut attempt = 0;
        let (pnr, booked_at) = loop {
            attempt += 1;
            let booked_at = self.clock.now_utc();
            let pnr = Pnr::generate(booked_at);
            let rows: Vec<Booking> = request
                .seats
                .iter()
                .zip(&request.passengers)
                .map(|(seat, passenger)| {
                    let mut booking = Booking::confirmed(
                        pnr.clone(),
                        trip.id,
                        request.travel_date,
                        seat.clone(),
                        segment,
                        passenger.clone(),
                        fare_per_seat,
                        booked_at,
                    );
                    if let Some(account) = request.account_id {
                        booking = booking.with_account(account);
                    }
                    booking
                })
                .collect();

            match self.bookings.save_all(&rows).await {
                Ok(()) => break (pnr, booked_at),
                Err(ApplicationError::Conflict(reason))
                    if attempt < self.config.pnr_commit_attempts =>
                {
                    warn!(%pnr, attempt, %reason, "Booking reference collided, regenerating");
                },
                Err(e) => return Err(e),
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let total_fare = fare_per_seat * request.seats.len() as u32;
        debug!(%pnr, total_fare, "Booking committed");

        Ok(BookingConfirmation {
            pnr,
            status: BookingStatus::Confirmed,
            trip_id: trip.id,
            route: trip.route(),
            travel_date: request.travel_date,
            board_stop: board_stop.stop_name,
            alight_stop: alight_stop.stop_name,
            board_seq: request.board_seq,
            alight_seq: request.alight_seq,
            fare_per_seat,
            total_fare,
            booked_at,
            seats: request
                .seats
                .iter()
                .zip(&request.passengers)
                .map(|(seat, passenger)| ConfirmedSeat {
                    seat_no: seat.clone(),
                    passenger: passenger.clone(),
                })
                .collect(),
        })
    }

    /// Cancel a booking by reference
    ///
    /// Never deletes; sets all still-confirmed rows to CANCELLED so the
    /// seat intervals stop counting against availability. Idempotent.
    #[instrument(skip(self), fields(%pnr))]
    pub async fn cancel_booking(&self, pnr: &Pnr) -> Result<CancellationReceipt, ApplicationError> {
        let rows = self.bookings.find_by_pnr(pnr).await?;
        if rows.is_empty() {
            return Err(ApplicationError::not_found("Booking", pnr.to_string()));
        }

        let released = self.bookings.cancel_by_pnr(pnr).await?;
        if released > 0 {
            info!(%pnr, released, "Booking cancelled");
        } else {
            debug!(%pnr, "Cancellation was a no-op; already cancelled");
        }
        Ok(CancellationReceipt {
            pnr: pnr.clone(),
            released_seats: released,
            already_cancelled: released == 0,
        })
    }

    /// Look up a booking by reference
    #[instrument(skip(self), fields(%pnr))]
    pub async fn booking_by_pnr(&self, pnr: &Pnr) -> Result<BookingRecord, ApplicationError> {
        let rows = self.bookings.find_by_pnr(pnr).await?;
        let Some(first) = rows.first() else {
            return Err(ApplicationError::not_found("Booking", pnr.to_string()));
        };

        let trip = self.directory.trip(&first.trip_id).await?;
        let stop_name = |seq: u32| {
            trip.as_ref()
                .and_then(|t| t.stop_by_seq(seq))
                .map_or_else(|| "Unknown".to_string(), |s| s.stop_name.clone())
        };

        let status = if rows.iter().any(|r| r.status.is_active()) {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Cancelled
        };

        Ok(BookingRecord {
            pnr: pnr.clone(),
            status,
            trip_id: first.trip_id,
            route: trip.as_ref().map(Trip::route).unwrap_or_default(),
            travel_date: first.travel_date,
            board_stop: stop_name(first.segment.board()),
            alight_stop: stop_name(first.segment.alight()),
            board_seq: first.segment.board(),
            alight_seq: first.segment.alight(),
            booked_at: first.booked_at,
            total_fare: rows.iter().map(|r| r.fare_amount).sum(),
            seats: rows
                .iter()
                .map(|r| BookedSeat {
                    seat_no: r.seat_no.clone(),
                    passenger: r.passenger.clone(),
                    fare_amount: r.fare_amount,
                    status: r.status,
                })
                .collect(),
        })
    }

    /// Bookings owned by an account, most recent first
    #[instrument(skip(self), fields(%account_id))]
    pub async fn bookings_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Booking>, ApplicationError> {
        self.bookings.list_for_account(account_id).await
    }

    fn lock_for(&self, trip_id: TripId, date: NaiveDate) -> Arc<TokioMutex<()>> {
        let mut locks = self.segment_locks.lock();
        Arc::clone(locks.entry((trip_id, date)).or_default())
    }
}

fn validate_request_shape(request: &BookingRequest) -> Result<(), ApplicationError> {
    if request.seats.is_empty() {
        return Err(ApplicationError::InvalidRequest(
            "at least one seat must be requested".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for seat in &request.seats {
        if !seen.insert(seat.clone()) {
            return Err(ApplicationError::InvalidRequest(format!(
                "seat {seat} requested more than once"
            )));
        }
    }
    if request.passengers.len() != request.seats.len() {
        return Err(ApplicationError::InvalidRequest(format!(
            "{} passengers supplied for {} seats",
            request.passengers.len(),
            request.seats.len()
        )));
    }
    Ok(())
}
