//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer: SQLite-backed
//! booking storage, the read-only trip directory, the system clock, and
//! configuration loading.

pub mod adapters;
pub mod config;
pub mod persistence;

pub use adapters::SystemClock;
pub use config::{BookingConfig, DatabaseConfig, Settings};
pub use persistence::{
    ConnectionPool, SqliteBookingStore, SqliteTripDirectory, create_pool, run_migrations,
};
