//! Booking engine configuration.

use std::time::Duration;

use application::error::ApplicationError;
use application::services::{AvailabilityConfig, BookingServiceConfig};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Booking engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// IANA name of the operating timezone for date/departure cutoffs
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Bounded wait for the per-trip/date booking lock, in milliseconds
    #[serde(default = "default_lock_wait_ms")]
    pub lock_wait_ms: u64,

    /// Attempts to commit under a fresh booking reference before giving up
    #[serde(default = "default_pnr_commit_attempts")]
    pub pnr_commit_attempts: u32,
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

const fn default_lock_wait_ms() -> u64 {
    5000
}

const fn default_pnr_commit_attempts() -> u32 {
    3
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            lock_wait_ms: default_lock_wait_ms(),
            pnr_commit_attempts: default_pnr_commit_attempts(),
        }
    }
}

impl BookingConfig {
    /// Parse and validate the configured timezone
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] when the name is not in
    /// the IANA database.
    pub fn parse_timezone(&self) -> Result<Tz, ApplicationError> {
        self.timezone.parse().map_err(|_| {
            ApplicationError::Configuration(format!("unknown timezone: {}", self.timezone))
        })
    }

    /// Build the booking service configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] for an invalid timezone.
    pub fn to_service_config(&self) -> Result<BookingServiceConfig, ApplicationError> {
        Ok(BookingServiceConfig {
            timezone: self.parse_timezone()?,
            lock_wait: Duration::from_millis(self.lock_wait_ms),
            pnr_commit_attempts: self.pnr_commit_attempts.max(1),
        })
    }

    /// Build the availability service configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Configuration`] for an invalid timezone.
    pub fn to_availability_config(&self) -> Result<AvailabilityConfig, ApplicationError> {
        Ok(AvailabilityConfig {
            timezone: self.parse_timezone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BookingConfig::default();
        assert_eq!(config.timezone, "Asia/Kolkata");
        assert_eq!(config.lock_wait_ms, 5000);
        assert_eq!(config.pnr_commit_attempts, 3);
    }

    #[test]
    fn default_timezone_parses() {
        let tz = BookingConfig::default().parse_timezone().unwrap();
        assert_eq!(tz, chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn bad_timezone_is_a_configuration_error() {
        let config = BookingConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.parse_timezone(),
            Err(ApplicationError::Configuration(_))
        ));
    }

    #[test]
    fn service_config_carries_lock_wait() {
        let config = BookingConfig {
            lock_wait_ms: 250,
            ..Default::default()
        };
        let service = config.to_service_config().unwrap();
        assert_eq!(service.lock_wait, Duration::from_millis(250));
    }

    #[test]
    fn commit_attempts_never_zero() {
        let config = BookingConfig {
            pnr_commit_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.to_service_config().unwrap().pnr_commit_attempts, 1);
    }
}
