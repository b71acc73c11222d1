//! Shared error mapping for the SQLite persistence layer
//!
//! Keeps the application-layer taxonomy honest: constraint violations are
//! race losses (Conflict), busy/locked/IO trouble is transient (Storage),
//! and everything else is an internal fault. Callers must never see a
//! transient failure dressed up as "seat taken".

use application::error::ApplicationError;
use rusqlite::ErrorCode;

use super::connection::{ConnectionPool, PooledConn};

/// Map a rusqlite error to an application-layer error
pub fn map_sqlite_error(e: &rusqlite::Error) -> ApplicationError {
    match e {
        rusqlite::Error::SqliteFailure(failure, message) => {
            let detail = message
                .clone()
                .unwrap_or_else(|| failure.to_string());
            match failure.code {
                ErrorCode::ConstraintViolation => ApplicationError::Conflict(detail),
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull => ApplicationError::Storage(detail),
                _ => ApplicationError::Internal(format!("Database error: {detail}")),
            }
        },
        other => ApplicationError::Internal(format!("Database error: {other}")),
    }
}

/// Check out a pooled connection, mapping exhaustion/timeouts as transient
pub fn get_conn(pool: &ConnectionPool) -> Result<PooledConn, ApplicationError> {
    pool.get()
        .map_err(|e| ApplicationError::Storage(format!("connection pool: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: ErrorCode) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code,
                extended_code: 0,
            },
            Some("detail".to_string()),
        )
    }

    #[test]
    fn constraint_violation_is_conflict() {
        assert!(matches!(
            map_sqlite_error(&failure(ErrorCode::ConstraintViolation)),
            ApplicationError::Conflict(_)
        ));
    }

    #[test]
    fn busy_database_is_transient() {
        assert!(matches!(
            map_sqlite_error(&failure(ErrorCode::DatabaseBusy)),
            ApplicationError::Storage(_)
        ));
    }

    #[test]
    fn other_errors_are_internal() {
        assert!(matches!(
            map_sqlite_error(&rusqlite::Error::InvalidQuery),
            ApplicationError::Internal(_)
        ));
    }
}
