//! Trip entity - one scheduled run of a bus on a day-number slot
//!
//! Trips and their ordered stop lists are owned by the route-import
//! collaborator and are strictly read-only to the booking core. The
//! topology invariants (contiguous sequence indices, strictly increasing
//! cumulative distance) are what make segment arithmetic well-defined, so
//! they are enforced at construction.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{BusId, Segment, TripId};

/// Operational status of a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    /// Trip is in service and bookable
    Running,
    /// Bus is under maintenance; no bookings accepted
    Maintenance,
    /// Trip withdrawn from service
    Cancelled,
}

impl TripStatus {
    /// Whether bookings may be created against this trip
    #[must_use]
    pub const fn is_bookable(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Maintenance => "Maintenance",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TripStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "maintenance" => Ok(Self::Maintenance),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(DomainError::ValidationError(format!(
                "unknown trip status: {other}"
            ))),
        }
    }
}

/// One stop on a trip's route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripStop {
    /// 0-based position in the route, contiguous
    pub seq_no: u32,
    /// Stop name as supplied by the import collaborator
    pub stop_name: String,
    /// Scheduled arrival; None at the origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrive_time: Option<NaiveTime>,
    /// Scheduled departure; None at the destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depart_time: Option<NaiveTime>,
    /// Distance from the origin in kilometres
    pub cumulative_km: u32,
}

impl TripStop {
    /// Create a stop
    #[must_use]
    pub fn new(seq_no: u32, stop_name: impl Into<String>, cumulative_km: u32) -> Self {
        Self {
            seq_no,
            stop_name: stop_name.into(),
            arrive_time: None,
            depart_time: None,
            cumulative_km,
        }
    }

    /// Set the scheduled arrival time
    #[must_use]
    pub const fn with_arrival(mut self, at: NaiveTime) -> Self {
        self.arrive_time = Some(at);
        self
    }

    /// Set the scheduled departure time
    #[must_use]
    pub const fn with_departure(mut self, at: NaiveTime) -> Self {
        self.depart_time = Some(at);
        self
    }
}

/// One scheduled run of a bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier
    pub id: TripId,
    /// Bus operating this trip
    pub bus_id: BusId,
    /// Calendar day-of-month slot (1-31) from the import template
    pub day_no: u8,
    /// Origin city
    pub from_city: String,
    /// Destination city
    pub to_city: String,
    /// Departure from the origin
    pub departure_time: NaiveTime,
    /// Arrival at the destination
    pub arrival_time: NaiveTime,
    /// Full route length in kilometres
    pub total_km: u32,
    /// Per-seat base price from the import sheet
    pub base_price: u32,
    /// Operational status
    pub status: TripStatus,
    /// Ordered stop list
    stops: Vec<TripStop>,
}

impl Trip {
    /// Create a trip, validating its route topology
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTopology`] if the stop list is empty,
    /// sequence indices are not 0-based and contiguous, or cumulative
    /// distance does not strictly increase. Returns
    /// [`DomainError::ValidationError`] for a day number outside 1-31.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TripId,
        bus_id: BusId,
        day_no: u8,
        from_city: impl Into<String>,
        to_city: impl Into<String>,
        departure_time: NaiveTime,
        arrival_time: NaiveTime,
        total_km: u32,
        base_price: u32,
        status: TripStatus,
        stops: Vec<TripStop>,
    ) -> Result<Self, DomainError> {
        if !(1..=31).contains(&day_no) {
            return Err(DomainError::ValidationError(format!(
                "day number {day_no} outside 1-31"
            )));
        }
        validate_topology(&stops)?;
        Ok(Self {
            id,
            bus_id,
            day_no,
            from_city: from_city.into(),
            to_city: to_city.into(),
            departure_time,
            arrival_time,
            total_km,
            base_price,
            status,
            stops,
        })
    }

    /// Ordered stop list
    #[must_use]
    pub fn stops(&self) -> &[TripStop] {
        &self.stops
    }

    /// Sequence index of the final stop
    #[must_use]
    pub fn final_seq(&self) -> u32 {
        // stops is non-empty by construction
        self.stops.last().map_or(0, |s| s.seq_no)
    }

    /// Look up a stop by its sequence index
    #[must_use]
    pub fn stop_by_seq(&self, seq_no: u32) -> Option<&TripStop> {
        self.stops.iter().find(|s| s.seq_no == seq_no)
    }

    /// Look up a stop by name, case-insensitively
    #[must_use]
    pub fn stop_by_name(&self, name: &str) -> Option<&TripStop> {
        let wanted = name.trim().to_lowercase();
        self.stops
            .iter()
            .find(|s| s.stop_name.to_lowercase() == wanted)
    }

    /// Distance in kilometres covered by a segment of this route
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if either endpoint is not a stop of
    /// this trip.
    pub fn segment_distance_km(&self, segment: &Segment) -> Result<u32, DomainError> {
        let from = self
            .stop_by_seq(segment.board())
            .ok_or_else(|| DomainError::not_found("Stop", segment.board().to_string()))?;
        let to = self
            .stop_by_seq(segment.alight())
            .ok_or_else(|| DomainError::not_found("Stop", segment.alight().to_string()))?;
        // cumulative_km strictly increases with seq_no, so this is positive
        Ok(to.cumulative_km - from.cumulative_km)
    }

    /// Route summary, e.g. "Chennai → Madurai"
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} → {}", self.from_city, self.to_city)
    }
}

fn validate_topology(stops: &[TripStop]) -> Result<(), DomainError> {
    if stops.is_empty() {
        return Err(DomainError::InvalidTopology("empty stop list".to_string()));
    }
    for (idx, stop) in stops.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let expected = idx as u32;
        if stop.seq_no != expected {
            return Err(DomainError::InvalidTopology(format!(
                "stop '{}' has sequence {} where {} was expected",
                stop.stop_name, stop.seq_no, expected
            )));
        }
    }
    for pair in stops.windows(2) {
        if pair[1].cumulative_km <= pair[0].cumulative_km {
            return Err(DomainError::InvalidTopology(format!(
                "cumulative distance does not increase between '{}' ({} km) and '{}' ({} km)",
                pair[0].stop_name, pair[0].cumulative_km, pair[1].stop_name, pair[1].cumulative_km
            )));
        }
    }
    Ok(())
}
