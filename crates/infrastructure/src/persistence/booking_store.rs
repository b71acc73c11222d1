//! SQLite-based booking persistence
//!
//! All rows of one booking request are written inside a single transaction,
//! so a crash mid-commit leaves zero seats claimed. Constraint violations
//! surface as [`ApplicationError::Conflict`] for the service-level PNR
//! regeneration loop.

use std::sync::Arc;

use application::{error::ApplicationError, ports::BookingStorePort};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use domain::entities::{Booking, BookingStatus, Passenger};
use domain::value_objects::{AccountId, BookingId, Pnr, SeatNumber, Segment, TripId};
use metrics::counter;
use rusqlite::{Row, params};
use tokio::task;
use tracing::{debug, instrument};

use super::connection::ConnectionPool;
use super::error::{get_conn, map_sqlite_error};

const BOOKING_COLUMNS: &str = "id, pnr, trip_id, travel_date, seat_no, board_seq, alight_seq,
     passenger_name, passenger_phone, fare_amount, status, booked_at, account_id";

/// SQLite-based booking store
#[derive(Debug, Clone)]
pub struct SqliteBookingStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteBookingStore {
    /// Create a new SQLite booking store
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStorePort for SqliteBookingStore {
    #[instrument(skip(self, bookings), fields(rows = bookings.len()))]
    async fn save_all(&self, bookings: &[Booking]) -> Result<(), ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let rows = bookings.to_vec();

        task::spawn_blocking(move || {
            let mut conn = get_conn(&pool)?;
            let tx = conn
                .transaction()
                .map_err(|e| map_sqlite_error(&e))?;

            for booking in &rows {
                tx.execute(
                    "INSERT INTO bookings (
                        id, pnr, trip_id, travel_date, seat_no, board_seq, alight_seq,
                        passenger_name, passenger_phone, fare_amount, status, booked_at,
                        account_id
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        booking.id.to_string(),
                        booking.pnr.to_string(),
                        booking.trip_id.to_string(),
                        booking.travel_date.to_string(),
                        booking.seat_no.to_string(),
                        booking.segment.board(),
                        booking.segment.alight(),
                        booking.passenger.name,
                        booking.passenger.phone,
                        booking.fare_amount,
                        booking.status.as_db_str(),
                        booking.booked_at.to_rfc3339(),
                        booking.account_id.map(|a| a.to_string()),
                    ],
                )
                .map_err(|e| {
                    let mapped = map_sqlite_error(&e);
                    if matches!(mapped, ApplicationError::Conflict(_)) {
                        counter!("booking_commit_conflicts_total").increment(1);
                    }
                    mapped
                })?;
            }

            tx.commit().map_err(|e| map_sqlite_error(&e))?;
            counter!("bookings_committed_total").increment(1);
            counter!("booking_seats_sold_total").increment(rows.len() as u64);
            debug!(rows = rows.len(), "Booking rows committed");
            Ok(())
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self), fields(%trip_id, %date))]
    async fn confirmed_for_trip_date(
        &self,
        trip_id: &TripId,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let trip_id = trip_id.to_string();
        let date = date.to_string();

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE trip_id = ?1 AND travel_date = ?2 AND status = 'CONFIRMED'"
                ))
                .map_err(|e| map_sqlite_error(&e))?;

            let bookings = stmt
                .query_map(params![trip_id, date], row_to_booking)
                .map_err(|e| map_sqlite_error(&e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| map_sqlite_error(&e))?;
            Ok(bookings)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self), fields(%pnr))]
    async fn find_by_pnr(&self, pnr: &Pnr) -> Result<Vec<Booking>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let pnr = pnr.to_string();

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE pnr = ?1 ORDER BY seat_no"
                ))
                .map_err(|e| map_sqlite_error(&e))?;

            let bookings = stmt
                .query_map([&pnr], row_to_booking)
                .map_err(|e| map_sqlite_error(&e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| map_sqlite_error(&e))?;
            Ok(bookings)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self), fields(%account_id))]
    async fn list_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<Booking>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let account_id = account_id.to_string();

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE account_id = ?1 ORDER BY booked_at DESC, seat_no"
                ))
                .map_err(|e| map_sqlite_error(&e))?;

            let bookings = stmt
                .query_map([&account_id], row_to_booking)
                .map_err(|e| map_sqlite_error(&e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| map_sqlite_error(&e))?;
            Ok(bookings)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self), fields(%pnr))]
    async fn cancel_by_pnr(&self, pnr: &Pnr) -> Result<u64, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let pnr = pnr.to_string();

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let affected = conn
                .execute(
                    "UPDATE bookings SET status = 'CANCELLED'
                     WHERE pnr = ?1 AND status = 'CONFIRMED'",
                    [&pnr],
                )
                .map_err(|e| map_sqlite_error(&e))?;

            if affected > 0 {
                counter!("bookings_cancelled_total").increment(affected as u64);
            }
            debug!(affected, "Cancellation applied");
            Ok(affected as u64)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}

fn row_to_booking(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let id_str: String = row.get(0)?;
    let pnr_str: String = row.get(1)?;
    let trip_str: String = row.get(2)?;
    let date_str: String = row.get(3)?;
    let seat_str: String = row.get(4)?;
    let board_seq: u32 = row.get(5)?;
    let alight_seq: u32 = row.get(6)?;
    let passenger_name: String = row.get(7)?;
    let passenger_phone: String = row.get(8)?;
    let fare_amount: u32 = row.get(9)?;
    let status_str: String = row.get(10)?;
    let booked_at_str: String = row.get(11)?;
    let account_str: Option<String> = row.get(12)?;

    Ok(Booking {
        id: BookingId::parse(&id_str).map_err(|e| bad_column(0, e))?,
        pnr: Pnr::parse(&pnr_str).map_err(|e| bad_column(1, e))?,
        trip_id: TripId::parse(&trip_str).map_err(|e| bad_column(2, e))?,
        travel_date: date_str.parse::<NaiveDate>().map_err(|e| bad_column(3, e))?,
        seat_no: SeatNumber::new(seat_str).map_err(|e| bad_column(4, e))?,
        segment: Segment::new(board_seq, alight_seq).map_err(|e| bad_column(5, e))?,
        passenger: Passenger {
            name: passenger_name,
            phone: passenger_phone,
        },
        fare_amount,
        status: BookingStatus::from_db_str(&status_str).map_err(|e| bad_column(10, e))?,
        booked_at: DateTime::parse_from_rfc3339(&booked_at_str)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| bad_column(11, e))?,
        account_id: account_str
            .map(|s| AccountId::parse(&s).map_err(|e| bad_column(12, e)))
            .transpose()?,
    })
}

fn bad_column(
    index: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(error))
}
