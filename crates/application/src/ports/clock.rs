//! Clock capability
//!
//! Past-date and past-departure rejections depend on "now", so the current
//! time is injected as a capability instead of read from ambient global
//! state. Tests supply a fixed clock for the time-boundary scenarios.

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

/// Port supplying the current instant
#[cfg_attr(test, automock)]
pub trait ClockPort: Send + Sync {
    /// Current instant in UTC
    fn now_utc(&self) -> DateTime<Utc>;
}

/// A clock pinned to one instant
///
/// Intended for tests that exercise the date and departure-time boundaries.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl ClockPort for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
