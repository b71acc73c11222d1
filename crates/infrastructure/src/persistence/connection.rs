//! Database connection management
//!
//! Provides SQLite connection pooling via r2d2.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DatabaseConfig;

/// Database errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// SQLite connection pool type alias
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Pooled connection type alias
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Create a new connection pool
///
/// # Errors
///
/// Returns [`DatabaseError`] when the pool cannot be built, the database
/// directory cannot be created, or migrations fail.
pub fn create_pool(config: &DatabaseConfig) -> Result<ConnectionPool, DatabaseError> {
    info!(path = %config.path, max_connections = config.max_connections, "Creating database connection pool");

    let manager = if config.path == ":memory:" {
        // Each in-memory connection is its own database; keep the pool at
        // one connection when using this mode
        SqliteConnectionManager::memory()
    } else {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::Migration(format!("Failed to create database directory: {e}"))
                })?;
            }
        }
        SqliteConnectionManager::file(&config.path)
    };
    // foreign_keys and busy_timeout are per-connection settings
    let manager = manager.with_init(|conn| apply_pragmas(conn));

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)?;

    if config.run_migrations {
        let conn = pool.get()?;
        crate::persistence::migrations::run_migrations(&conn)?;
    }

    debug!("Database connection pool created successfully");
    Ok(pool)
}

/// Session settings every connection relies on
fn apply_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_in_memory_pool() {
        let pool = create_pool(&DatabaseConfig::in_memory());
        assert!(pool.is_ok());
    }

    #[test]
    fn pool_connection_works() {
        let pool = create_pool(&DatabaseConfig::in_memory()).unwrap();
        let conn = pool.get();
        assert!(conn.is_ok());
    }

    #[test]
    fn create_file_pool_in_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir
                .path()
                .join("nested/seatline.db")
                .to_string_lossy()
                .into_owned(),
            max_connections: 2,
            run_migrations: true,
        };
        let pool = create_pool(&config);
        assert!(pool.is_ok());
    }
}
