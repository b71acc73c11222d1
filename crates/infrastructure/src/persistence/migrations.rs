//! Database migrations
//!
//! Schema versioning with migrations embedded for runtime execution. The
//! trip, stop, and fare-rate tables are populated by the route-import
//! collaborator; only the bookings table is written by this engine.

use rusqlite::Connection;
use tracing::{debug, error, info};

use super::connection::DatabaseError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all pending migrations
///
/// # Errors
///
/// Returns [`DatabaseError`] when a migration statement fails.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_schema_version(conn)?;

    if current_version < SCHEMA_VERSION {
        info!(
            from_version = current_version,
            to_version = SCHEMA_VERSION,
            "Running database migrations"
        );

        if current_version < 1 {
            if let Err(e) = migrate_v1(conn) {
                error!(version = 1, error = %e, "Migration V001 (initial schema) failed");
                return Err(e);
            }
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!(version = SCHEMA_VERSION, "Migrations complete");
    } else {
        debug!(version = current_version, "Schema is up to date");
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;
    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// V001: buses, trips, trip stops, fare rates, bookings
///
/// `UNIQUE(pnr, seat_no)` backs reference-collision detection at commit
/// time; the index on `(trip_id, travel_date, status)` serves the
/// availability read on every booking and seat-map request.
fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS buses (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            total_seats INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS trips (
            id TEXT PRIMARY KEY,
            bus_id TEXT NOT NULL REFERENCES buses(id),
            day_no INTEGER NOT NULL,
            from_city TEXT NOT NULL,
            to_city TEXT NOT NULL,
            departure_time TEXT NOT NULL,
            arrival_time TEXT NOT NULL,
            total_km INTEGER NOT NULL,
            base_price INTEGER NOT NULL,
            status TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_trips_day ON trips(day_no, status);

        CREATE TABLE IF NOT EXISTS trip_stops (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            trip_id TEXT NOT NULL REFERENCES trips(id),
            seq_no INTEGER NOT NULL,
            stop_name TEXT NOT NULL,
            arrive_time TEXT,
            depart_time TEXT,
            cumulative_km INTEGER NOT NULL,
            UNIQUE(trip_id, seq_no)
        );

        CREATE TABLE IF NOT EXISTS fare_rates (
            category TEXT PRIMARY KEY,
            rate_per_km REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bookings (
            id TEXT PRIMARY KEY,
            pnr TEXT NOT NULL,
            trip_id TEXT NOT NULL REFERENCES trips(id),
            travel_date TEXT NOT NULL,
            seat_no TEXT NOT NULL,
            board_seq INTEGER NOT NULL,
            alight_seq INTEGER NOT NULL,
            passenger_name TEXT NOT NULL,
            passenger_phone TEXT NOT NULL,
            fare_amount INTEGER NOT NULL,
            status TEXT NOT NULL,
            booked_at TEXT NOT NULL,
            account_id TEXT,
            UNIQUE(pnr, seat_no)
        );
        CREATE INDEX IF NOT EXISTS idx_bookings_trip_date
            ON bookings(trip_id, travel_date, status);
        CREATE INDEX IF NOT EXISTS idx_bookings_account
            ON bookings(account_id, booked_at);
        ",
    )?;
    debug!("Migration V001 applied");
    Ok(())
}
