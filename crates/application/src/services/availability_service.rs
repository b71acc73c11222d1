//! Seat availability engine
//!
//! Availability is always derived: start from the bus's full seat set and
//! subtract every seat claimed by a CONFIRMED booking whose segment overlaps
//! the requested one. The set must be exact - a false "available" lets a
//! seat be sold twice, a false "unavailable" rejects a valid sale.

use std::collections::{BTreeSet, HashSet};
use std::{fmt, sync::Arc};

use chrono::{Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use domain::entities::{Booking, SeatLayout};
use domain::value_objects::{SeatNumber, Segment, TripId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{BookingStorePort, ClockPort, TripDirectoryPort},
};

/// Configuration for availability queries
#[derive(Debug, Clone)]
pub struct AvailabilityConfig {
    /// Operating timezone for "today" and departure-time comparisons
    pub timezone: Tz,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
        }
    }
}

/// A trip search query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSearch {
    /// Boarding stop name
    pub from: String,
    /// Alighting stop name
    pub to: String,
    /// Requested travel date
    pub date: NaiveDate,
    /// Optional bus category filter, matched case-insensitively
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Number of seats the caller wants
    pub seats_requested: u32,
}

/// One trip matching a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripMatch {
    /// Trip identifier for follow-up seat-map and booking calls
    pub trip_id: TripId,
    /// Route summary, e.g. "Chennai → Madurai"
    pub route: String,
    /// Operator name
    pub bus_name: String,
    /// Bus category label
    pub category: String,
    /// Trip departure from its origin
    pub departure_time: NaiveTime,
    /// Trip arrival at its destination
    pub arrival_time: NaiveTime,
    /// Departure from the requested boarding stop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boarding_time: Option<NaiveTime>,
    /// Arrival at the requested alighting stop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dropping_time: Option<NaiveTime>,
    /// Resolved boarding sequence index
    pub board_seq: u32,
    /// Resolved alighting sequence index
    pub alight_seq: u32,
    /// Segment length in kilometres
    pub distance_km: u32,
    /// Fare per seat over the segment
    pub fare_amount: u32,
    /// Seats free over the segment
    pub available_seats: u32,
}

/// One seat in a seat map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMapEntry {
    /// Seat label
    pub seat_no: SeatNumber,
    /// Whether the seat is free over the requested segment
    pub available: bool,
    /// Cosmetic position label
    pub layout: SeatLayout,
}

/// Seat map for a trip/date/segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMap {
    /// Trip queried
    pub trip_id: TripId,
    /// Travel date queried
    pub travel_date: NaiveDate,
    /// Boarding sequence index
    pub board_seq: u32,
    /// Alighting sequence index
    pub alight_seq: u32,
    /// Every seat of the bus with its availability flag
    pub seats: Vec<SeatMapEntry>,
}

/// Seats claimed by confirmed bookings overlapping the segment
///
/// The one overlap formula lives in [`Segment::overlaps`]; this helper and
/// everything above it go through it.
pub(crate) fn booked_seats_for_segment(
    bookings: &[Booking],
    segment: &Segment,
) -> HashSet<SeatNumber> {
    bookings
        .iter()
        .filter(|b| b.status.is_active() && b.segment.overlaps(segment))
        .map(|b| b.seat_no.clone())
        .collect()
}

/// Service answering availability and search queries
pub struct AvailabilityService<D: TripDirectoryPort, B: BookingStorePort> {
    directory: Arc<D>,
    bookings: Arc<B>,
    clock: Arc<dyn ClockPort>,
    config: AvailabilityConfig,
}

impl<D: TripDirectoryPort, B: BookingStorePort> fmt::Debug for AvailabilityService<D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityService")
            .field("timezone", &self.config.timezone)
            .finish_non_exhaustive()
    }
}

impl<D: TripDirectoryPort, B: BookingStorePort> Clone for AvailabilityService<D, B> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            bookings: Arc::clone(&self.bookings),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<D: TripDirectoryPort, B: BookingStorePort> AvailabilityService<D, B> {
    /// Create a new availability service
    #[must_use]
    pub fn new(
        directory: Arc<D>,
        bookings: Arc<B>,
        clock: Arc<dyn ClockPort>,
        config: AvailabilityConfig,
    ) -> Self {
        Self {
            directory,
            bookings,
            clock,
            config,
        }
    }

    /// Free seats for a trip, date, and segment
    #[instrument(skip(self), fields(%trip_id, %date, %segment))]
    pub async fn available_seats(
        &self,
        trip_id: &TripId,
        date: NaiveDate,
        segment: &Segment,
    ) -> Result<BTreeSet<SeatNumber>, ApplicationError> {
        let trip = self
            .directory
            .trip(trip_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Trip", trip_id.to_string()))?;

        for seq in [segment.board(), segment.alight()] {
            if trip.stop_by_seq(seq).is_none() {
                return Err(ApplicationError::not_found("Stop", seq.to_string()));
            }
        }

        let bus = self.directory.bus(&trip.bus_id).await?.ok_or_else(|| {
            ApplicationError::Internal(format!(
                "bus {} referenced by trip {trip_id} is missing",
                trip.bus_id
            ))
        })?;

        let confirmed = self.bookings.confirmed_for_trip_date(trip_id, date).await?;
        let blocked = booked_seats_for_segment(&confirmed, segment);

        let available: BTreeSet<SeatNumber> = bus
            .seat_set()
            .into_iter()
            .filter(|seat| !blocked.contains(seat))
            .collect();

        debug!(
            total = bus.total_seats,
            blocked = blocked.len(),
            free = available.len(),
            "Computed segment availability"
        );
        Ok(available)
    }

    /// Per-seat availability flags for a trip, date, and segment
    #[instrument(skip(self), fields(%trip_id, %date))]
    pub async fn seat_map(
        &self,
        trip_id: &TripId,
        date: NaiveDate,
        board_seq: u32,
        alight_seq: u32,
    ) -> Result<SeatMap, ApplicationError> {
        let segment = Segment::new(board_seq, alight_seq)
            .map_err(|e| ApplicationError::InvalidRequest(e.to_string()))?;

        let trip = self
            .directory
            .trip(trip_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Trip", trip_id.to_string()))?;
        let bus = self.directory.bus(&trip.bus_id).await?.ok_or_else(|| {
            ApplicationError::Internal(format!(
                "bus {} referenced by trip {trip_id} is missing",
                trip.bus_id
            ))
        })?;

        let confirmed = self.bookings.confirmed_for_trip_date(trip_id, date).await?;
        let blocked = booked_seats_for_segment(&confirmed, &segment);

        let seats = bus
            .seat_set()
            .into_iter()
            .map(|seat_no| SeatMapEntry {
                available: !blocked.contains(&seat_no),
                layout: bus.seat_layout(&seat_no),
                seat_no,
            })
            .collect();

        Ok(SeatMap {
            trip_id: *trip_id,
            travel_date: date,
            board_seq,
            alight_seq,
            seats,
        })
    }

    /// Trips serving a named stop pair on a date, with fares and seat counts
    #[instrument(skip(self), fields(from = %query.from, to = %query.to, date = %query.date))]
    pub async fn search_trips(
        &self,
        query: &TripSearch,
    ) -> Result<Vec<TripMatch>, ApplicationError> {
        if query.seats_requested == 0 {
            return Err(ApplicationError::InvalidRequest(
                "at least one seat must be requested".to_string(),
            ));
        }

        let now_local = self.clock.now_utc().with_timezone(&self.config.timezone);
        let today = now_local.date_naive();
        if query.date < today {
            return Err(ApplicationError::Rejected(
                "Cannot book for past dates".to_string(),
            ));
        }

        #[allow(clippy::cast_possible_truncation)]
        let day_no = query.date.day() as u8;
        let trips = self.directory.trips_for_day(day_no).await?;
        let fare_table = self.directory.fare_table().await?;

        let mut matches = Vec::new();
        for trip in trips {
            if !trip.status.is_bookable() {
                continue;
            }
            let Some(from_stop) = trip.stop_by_name(&query.from) else {
                continue;
            };
            let Some(to_stop) = trip.stop_by_name(&query.to) else {
                continue;
            };
            if from_stop.seq_no >= to_stop.seq_no {
                continue;
            }
            // Today's departures that already left are not offered
            if query.date == today
                && from_stop.depart_time.is_some_and(|dep| dep < now_local.time())
            {
                continue;
            }

            let Some(bus) = self.directory.bus(&trip.bus_id).await? else {
                warn!(trip_id = %trip.id, bus_id = %trip.bus_id, "Skipping trip with missing bus");
                continue;
            };
            if query
                .category
                .as_deref()
                .is_some_and(|wanted| !bus.category.matches(wanted))
            {
                continue;
            }

            let segment = Segment::new(from_stop.seq_no, to_stop.seq_no)
                .map_err(|e| ApplicationError::Internal(e.to_string()))?;
            let confirmed = self
                .bookings
                .confirmed_for_trip_date(&trip.id, query.date)
                .await?;
            let blocked = booked_seats_for_segment(&confirmed, &segment);
            #[allow(clippy::cast_possible_truncation)]
            let available = bus
                .seat_set()
                .into_iter()
                .filter(|seat| !blocked.contains(seat))
                .count() as u32;

            if available < query.seats_requested {
                continue;
            }

            let distance_km = trip.segment_distance_km(&segment)?;
            matches.push(TripMatch {
                trip_id: trip.id,
                route: trip.route(),
                bus_name: bus.name.clone(),
                category: bus.category.as_str().to_string(),
                departure_time: trip.departure_time,
                arrival_time: trip.arrival_time,
                boarding_time: from_stop.depart_time,
                dropping_time: to_stop.arrive_time,
                board_seq: from_stop.seq_no,
                alight_seq: to_stop.seq_no,
                distance_km,
                fare_amount: fare_table.fare(&bus.category, distance_km),
                available_seats: available,
            });
        }

        debug!(matches = matches.len(), "Trip search complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone, Utc};
    use domain::entities::{Bus, Passenger, Trip, TripStatus, TripStop};
    use domain::value_objects::{BusCategory, BusId, Pnr};

    use super::*;
    use crate::ports::{FixedClock, MockBookingStorePort, MockTripDirectoryPort};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sample_trip(bus_id: BusId) -> Trip {
        Trip::new(
            TripId::new(),
            bus_id,
            15,
            "Chennai",
            "Madurai",
            t(6, 0),
            t(13, 0),
            460,
            550,
            TripStatus::Running,
            vec![
                TripStop::new(0, "Chennai", 0).with_departure(t(6, 0)),
                TripStop::new(1, "Tindivanam", 80)
                    .with_arrival(t(7, 30))
                    .with_departure(t(7, 40)),
                TripStop::new(2, "Madurai", 460).with_arrival(t(13, 0)),
            ],
        )
        .unwrap()
    }

    fn sample_bus(bus_id: BusId) -> Bus {
        Bus::new(bus_id, "KPN Travels", BusCategory::new("AC Seater"), 4)
    }

    fn booking_on(trip_id: TripId, date: NaiveDate, seat: u32, board: u32, alight: u32) -> Booking {
        Booking::confirmed(
            Pnr::generate(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
            trip_id,
            date,
            SeatNumber::from_position(seat),
            Segment::new(board, alight).unwrap(),
            Passenger::new("Priya", "9876543210").unwrap(),
            690,
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        )
    }

    fn noon_clock() -> Arc<dyn ClockPort> {
        // 2024-06-01 06:30 UTC = 12:00 IST
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 6, 1, 6, 30, 0).unwrap(),
        ))
    }

    fn travel_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn service_with(
        trip: Trip,
        bus: Bus,
        bookings: Vec<Booking>,
    ) -> AvailabilityService<MockTripDirectoryPort, MockBookingStorePort> {
        let mut directory = MockTripDirectoryPort::new();
        let trip_clone = trip.clone();
        directory
            .expect_trip()
            .returning(move |_| Ok(Some(trip_clone.clone())));
        let bus_clone = bus.clone();
        directory
            .expect_bus()
            .returning(move |_| Ok(Some(bus_clone.clone())));

        let mut store = MockBookingStorePort::new();
        store
            .expect_confirmed_for_trip_date()
            .returning(move |_, _| Ok(bookings.clone()));

        AvailabilityService::new(
            Arc::new(directory),
            Arc::new(store),
            noon_clock(),
            AvailabilityConfig::default(),
        )
    }

    #[tokio::test]
    async fn full_bus_is_available_without_bookings() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let service = service_with(trip, sample_bus(bus_id), vec![]);

        let free = service
            .available_seats(&trip_id, travel_date(), &Segment::new(0, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(free.len(), 4);
    }

    #[tokio::test]
    async fn overlapping_booking_blocks_its_seat() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let existing = booking_on(trip_id, travel_date(), 2, 0, 2);
        let service = service_with(trip, sample_bus(bus_id), vec![existing]);

        let free = service
            .available_seats(&trip_id, travel_date(), &Segment::new(0, 1).unwrap())
            .await
            .unwrap();
        assert!(!free.contains(&SeatNumber::from_position(2)));
        assert_eq!(free.len(), 3);
    }

    #[tokio::test]
    async fn disjoint_booking_does_not_block() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let existing = booking_on(trip_id, travel_date(), 2, 0, 1);
        let service = service_with(trip, sample_bus(bus_id), vec![existing]);

        let free = service
            .available_seats(&trip_id, travel_date(), &Segment::new(1, 2).unwrap())
            .await
            .unwrap();
        assert!(free.contains(&SeatNumber::from_position(2)));
        assert_eq!(free.len(), 4);
    }

    #[tokio::test]
    async fn cancelled_booking_does_not_block() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let mut existing = booking_on(trip_id, travel_date(), 2, 0, 2);
        existing.cancel();
        let service = service_with(trip, sample_bus(bus_id), vec![existing]);

        let free = service
            .available_seats(&trip_id, travel_date(), &Segment::new(0, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(free.len(), 4);
    }

    #[tokio::test]
    async fn availability_is_conserved() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let bookings = vec![
            booking_on(trip_id, travel_date(), 1, 0, 2),
            booking_on(trip_id, travel_date(), 3, 1, 2),
        ];
        let service = service_with(trip, sample_bus(bus_id), bookings.clone());

        let segment = Segment::new(0, 2).unwrap();
        let free = service
            .available_seats(&trip_id, travel_date(), &segment)
            .await
            .unwrap();
        let blocked = booked_seats_for_segment(&bookings, &segment);
        assert_eq!(free.len() + blocked.len(), 4);
    }

    #[tokio::test]
    async fn unknown_trip_is_not_found() {
        let mut directory = MockTripDirectoryPort::new();
        directory.expect_trip().returning(|_| Ok(None));
        let store = MockBookingStorePort::new();
        let service = AvailabilityService::new(
            Arc::new(directory),
            Arc::new(store),
            noon_clock(),
            AvailabilityConfig::default(),
        );

        let result = service
            .available_seats(&TripId::new(), travel_date(), &Segment::new(0, 1).unwrap())
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let service = service_with(trip, sample_bus(bus_id), vec![]);

        let result = service
            .available_seats(&trip_id, travel_date(), &Segment::new(2, 7).unwrap())
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn seat_map_flags_blocked_seats_and_layouts() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let existing = booking_on(trip_id, travel_date(), 2, 0, 2);
        let service = service_with(trip, sample_bus(bus_id), vec![existing]);

        let map = service
            .seat_map(&trip_id, travel_date(), 0, 2)
            .await
            .unwrap();
        assert_eq!(map.seats.len(), 4);
        let seat2 = map
            .seats
            .iter()
            .find(|s| s.seat_no.as_str() == "2")
            .unwrap();
        assert!(!seat2.available);
        assert_eq!(seat2.layout, SeatLayout::Aisle);
        assert!(map.seats.iter().filter(|s| s.available).count() == 3);
    }

    #[tokio::test]
    async fn seat_map_rejects_degenerate_segment() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let service = service_with(trip, sample_bus(bus_id), vec![]);

        let result = service.seat_map(&trip_id, travel_date(), 2, 2).await;
        assert!(matches!(result, Err(ApplicationError::InvalidRequest(_))));
    }

    fn search_service(
        trips: Vec<Trip>,
        bus: Bus,
        bookings: Vec<Booking>,
    ) -> AvailabilityService<MockTripDirectoryPort, MockBookingStorePort> {
        let mut directory = MockTripDirectoryPort::new();
        directory
            .expect_trips_for_day()
            .returning(move |_| Ok(trips.clone()));
        let bus_clone = bus.clone();
        directory
            .expect_bus()
            .returning(move |_| Ok(Some(bus_clone.clone())));
        directory.expect_fare_table().returning(|| {
            Ok(domain::fare::FareTable::from_rates([("AC Seater", 1.5)]))
        });

        let mut store = MockBookingStorePort::new();
        store
            .expect_confirmed_for_trip_date()
            .returning(move |_, _| Ok(bookings.clone()));

        AvailabilityService::new(
            Arc::new(directory),
            Arc::new(store),
            noon_clock(),
            AvailabilityConfig::default(),
        )
    }

    fn base_query() -> TripSearch {
        TripSearch {
            from: "Chennai".to_string(),
            to: "Madurai".to_string(),
            date: travel_date(),
            category: None,
            seats_requested: 1,
        }
    }

    #[tokio::test]
    async fn search_returns_fare_and_count() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let service = search_service(vec![trip], sample_bus(bus_id), vec![]);

        let matches = service.search_trips(&base_query()).await.unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.route, "Chennai → Madurai");
        assert_eq!(m.distance_km, 460);
        assert_eq!(m.fare_amount, 690);
        assert_eq!(m.available_seats, 4);
        assert_eq!(m.board_seq, 0);
        assert_eq!(m.alight_seq, 2);
    }

    #[tokio::test]
    async fn search_rejects_past_date() {
        let bus_id = BusId::new();
        let service = search_service(vec![sample_trip(bus_id)], sample_bus(bus_id), vec![]);

        let mut query = base_query();
        query.date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let result = service.search_trips(&query).await;
        assert!(matches!(result, Err(ApplicationError::Rejected(_))));
    }

    #[tokio::test]
    async fn search_rejects_zero_seats() {
        let bus_id = BusId::new();
        let service = search_service(vec![sample_trip(bus_id)], sample_bus(bus_id), vec![]);

        let mut query = base_query();
        query.seats_requested = 0;
        let result = service.search_trips(&query).await;
        assert!(matches!(result, Err(ApplicationError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn search_skips_non_running_trips() {
        let bus_id = BusId::new();
        let mut trip = sample_trip(bus_id);
        trip.status = TripStatus::Maintenance;
        let service = search_service(vec![trip], sample_bus(bus_id), vec![]);

        let matches = service.search_trips(&base_query()).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn search_skips_reversed_stop_pair() {
        let bus_id = BusId::new();
        let service = search_service(vec![sample_trip(bus_id)], sample_bus(bus_id), vec![]);

        let mut query = base_query();
        query.from = "Madurai".to_string();
        query.to = "Chennai".to_string();
        let matches = service.search_trips(&query).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn search_filters_by_category() {
        let bus_id = BusId::new();
        let service = search_service(vec![sample_trip(bus_id)], sample_bus(bus_id), vec![]);

        let mut query = base_query();
        query.category = Some("AC Sleeper".to_string());
        assert!(service.search_trips(&query).await.unwrap().is_empty());

        query.category = Some("ac seater".to_string());
        assert_eq!(service.search_trips(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_skips_todays_departed_trips() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let service = search_service(vec![trip], sample_bus(bus_id), vec![]);

        // Clock is 12:00 IST; the 06:00 departure on the same day is gone
        let mut query = base_query();
        query.date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let matches = service.search_trips(&query).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn search_skips_trips_without_enough_seats() {
        let bus_id = BusId::new();
        let trip = sample_trip(bus_id);
        let trip_id = trip.id;
        let bookings = vec![
            booking_on(trip_id, travel_date(), 1, 0, 2),
            booking_on(trip_id, travel_date(), 2, 0, 2),
        ];
        let service = search_service(vec![trip], sample_bus(bus_id), bookings);

        let mut query = base_query();
        query.seats_requested = 3;
        let matches = service.search_trips(&query).await.unwrap();
        assert!(matches.is_empty());
    }
}
