//! Persistence layer - SQLite stores and connection management

mod booking_store;
mod connection;
mod error;
mod migrations;
mod trip_directory;

pub use booking_store::SqliteBookingStore;
pub use connection::{ConnectionPool, DatabaseError, PooledConn, create_pool};
pub use error::{get_conn, map_sqlite_error};
pub use migrations::run_migrations;
pub use trip_directory::SqliteTripDirectory;
