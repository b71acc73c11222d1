//! SQLite-based trip directory
//!
//! Read-only adapter over the tables the route-import collaborator
//! maintains. Topology invariants are re-validated when a trip is loaded,
//! so corrupt import data is caught here rather than inside a booking.

use std::sync::Arc;

use application::{error::ApplicationError, ports::TripDirectoryPort};
use async_trait::async_trait;
use chrono::NaiveTime;
use domain::entities::{Bus, Trip, TripStatus, TripStop};
use domain::fare::FareTable;
use domain::value_objects::{BusCategory, BusId, TripId};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tokio::task;
use tracing::instrument;

use super::connection::ConnectionPool;
use super::error::{get_conn, map_sqlite_error};

const TIME_FORMAT: &str = "%H:%M:%S";

/// SQLite-based trip directory
#[derive(Debug, Clone)]
pub struct SqliteTripDirectory {
    pool: Arc<ConnectionPool>,
}

impl SqliteTripDirectory {
    /// Create a new SQLite trip directory
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripDirectoryPort for SqliteTripDirectory {
    #[instrument(skip(self), fields(trip_id = %id))]
    async fn trip(&self, id: &TripId) -> Result<Option<Trip>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = *id;

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let Some(raw) = conn
                .query_row(
                    "SELECT id, bus_id, day_no, from_city, to_city, departure_time,
                        arrival_time, total_km, base_price, status
                     FROM trips WHERE id = ?1",
                    [id.to_string()],
                    row_to_raw_trip,
                )
                .optional()
                .map_err(|e| map_sqlite_error(&e))?
            else {
                return Ok(None);
            };

            let stops = load_stops(&conn, &id)?;
            Ok(Some(assemble_trip(raw, stops)?))
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn trips_for_day(&self, day_no: u8) -> Result<Vec<Trip>, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, bus_id, day_no, from_city, to_city, departure_time,
                        arrival_time, total_km, base_price, status
                     FROM trips WHERE day_no = ?1",
                )
                .map_err(|e| map_sqlite_error(&e))?;

            let raws = stmt
                .query_map([day_no], row_to_raw_trip)
                .map_err(|e| map_sqlite_error(&e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| map_sqlite_error(&e))?;

            let mut trips = Vec::with_capacity(raws.len());
            for raw in raws {
                let stops = load_stops(&conn, &raw.id)?;
                trips.push(assemble_trip(raw, stops)?);
            }
            Ok(trips)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self), fields(bus_id = %id))]
    async fn bus(&self, id: &BusId) -> Result<Option<Bus>, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let id = *id;

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            conn.query_row(
                "SELECT id, name, category, total_seats FROM buses WHERE id = ?1",
                [id.to_string()],
                |row| {
                    let id_str: String = row.get(0)?;
                    let name: String = row.get(1)?;
                    let category: String = row.get(2)?;
                    let total_seats: u32 = row.get(3)?;
                    Ok((id_str, name, category, total_seats))
                },
            )
            .optional()
            .map_err(|e| map_sqlite_error(&e))?
            .map(|(id_str, name, category, total_seats)| {
                let bus_id = BusId::parse(&id_str)
                    .map_err(|e| ApplicationError::Internal(format!("bad bus id: {e}")))?;
                Ok(Bus::new(bus_id, name, BusCategory::new(category), total_seats))
            })
            .transpose()
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn fare_table(&self) -> Result<FareTable, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            let mut stmt = conn
                .prepare("SELECT category, rate_per_km FROM fare_rates")
                .map_err(|e| map_sqlite_error(&e))?;

            let rates = stmt
                .query_map([], |row| {
                    let category: String = row.get(0)?;
                    let rate: f64 = row.get(1)?;
                    Ok((category, rate))
                })
                .map_err(|e| map_sqlite_error(&e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| map_sqlite_error(&e))?;

            Ok(FareTable::from_rates(rates))
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}

struct RawTrip {
    id: TripId,
    bus_id: BusId,
    day_no: u8,
    from_city: String,
    to_city: String,
    departure_time: NaiveTime,
    arrival_time: NaiveTime,
    total_km: u32,
    base_price: u32,
    status: TripStatus,
}

fn row_to_raw_trip(row: &Row<'_>) -> rusqlite::Result<RawTrip> {
    let id_str: String = row.get(0)?;
    let bus_str: String = row.get(1)?;
    let day_no: u8 = row.get(2)?;
    let from_city: String = row.get(3)?;
    let to_city: String = row.get(4)?;
    let departure_str: String = row.get(5)?;
    let arrival_str: String = row.get(6)?;
    let total_km: u32 = row.get(7)?;
    let base_price: u32 = row.get(8)?;
    let status_str: String = row.get(9)?;

    Ok(RawTrip {
        id: TripId::parse(&id_str).map_err(|e| bad_column(0, e))?,
        bus_id: BusId::parse(&bus_str).map_err(|e| bad_column(1, e))?,
        day_no,
        from_city,
        to_city,
        departure_time: NaiveTime::parse_from_str(&departure_str, TIME_FORMAT)
            .map_err(|e| bad_column(5, e))?,
        arrival_time: NaiveTime::parse_from_str(&arrival_str, TIME_FORMAT)
            .map_err(|e| bad_column(6, e))?,
        total_km,
        base_price,
        status: status_str.parse().map_err(|e| bad_column(9, e))?,
    })
}

fn load_stops(conn: &Connection, trip_id: &TripId) -> Result<Vec<TripStop>, ApplicationError> {
    let mut stmt = conn
        .prepare(
            "SELECT seq_no, stop_name, arrive_time, depart_time, cumulative_km
             FROM trip_stops WHERE trip_id = ?1 ORDER BY seq_no ASC",
        )
        .map_err(|e| map_sqlite_error(&e))?;

    stmt.query_map(params![trip_id.to_string()], |row| {
        let seq_no: u32 = row.get(0)?;
        let stop_name: String = row.get(1)?;
        let arrive_str: Option<String> = row.get(2)?;
        let depart_str: Option<String> = row.get(3)?;
        let cumulative_km: u32 = row.get(4)?;

        let mut stop = TripStop::new(seq_no, stop_name, cumulative_km);
        if let Some(s) = arrive_str {
            stop.arrive_time =
                Some(NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(|e| bad_column(2, e))?);
        }
        if let Some(s) = depart_str {
            stop.depart_time =
                Some(NaiveTime::parse_from_str(&s, TIME_FORMAT).map_err(|e| bad_column(3, e))?);
        }
        Ok(stop)
    })
    .map_err(|e| map_sqlite_error(&e))?
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| map_sqlite_error(&e))
}

fn assemble_trip(raw: RawTrip, stops: Vec<TripStop>) -> Result<Trip, ApplicationError> {
    let trip_id = raw.id;
    Trip::new(
        raw.id,
        raw.bus_id,
        raw.day_no,
        raw.from_city,
        raw.to_city,
        raw.departure_time,
        raw.arrival_time,
        raw.total_km,
        raw.base_price,
        raw.status,
        stops,
    )
    .map_err(|e| ApplicationError::Internal(format!("trip {trip_id} failed validation: {e}")))
}

fn bad_column(
    index: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(error))
}
