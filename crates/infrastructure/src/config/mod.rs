//! Application configuration
//!
//! Split into focused sub-modules:
//! - `database`: SQLite settings
//! - `booking`: booking engine settings (timezone, lock wait, PNR retries)

mod booking;
mod database;

use serde::{Deserialize, Serialize};

pub use booking::BookingConfig;
pub use database::DatabaseConfig;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Booking engine configuration
    #[serde(default)]
    pub booking: BookingConfig,
}

impl Settings {
    /// Load configuration from `seatline.toml` and the environment
    ///
    /// Environment variables override file values, e.g.
    /// `SEATLINE_DATABASE_PATH` or `SEATLINE_BOOKING_TIMEZONE`.
    ///
    /// # Errors
    ///
    /// Returns a [`config::ConfigError`] when a source fails to parse.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("seatline").required(false))
            .add_source(
                config::Environment::with_prefix("SEATLINE")
                    .separator("_")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
