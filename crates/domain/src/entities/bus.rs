//! Bus entity - a physical coach with a fixed seat count
//!
//! Seat geometry is a cosmetic label only; the booking core never stores
//! per-seat state. The full seat set is derived from the capacity.

use serde::{Deserialize, Serialize};

use crate::value_objects::{BusCategory, BusId, SeatNumber};

/// Cosmetic position label for a seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatLayout {
    /// Window-side seat
    Window,
    /// Aisle-side seat
    Aisle,
    /// Non-numeric label, no position known
    Standard,
}

impl SeatLayout {
    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Aisle => "aisle",
            Self::Standard => "standard",
        }
    }
}

impl std::fmt::Display for SeatLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A physical bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    /// Unique identifier
    pub id: BusId,
    /// Operator/travel name
    pub name: String,
    /// Fare category ("AC Seater", "Non-AC Sleeper", ...)
    pub category: BusCategory,
    /// Fixed seat count
    pub total_seats: u32,
}

impl Bus {
    /// Create a bus
    #[must_use]
    pub fn new(
        id: BusId,
        name: impl Into<String>,
        category: BusCategory,
        total_seats: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            total_seats,
        }
    }

    /// The full seat set, labelled "1" through the capacity
    #[must_use]
    pub fn seat_set(&self) -> Vec<SeatNumber> {
        (1..=self.total_seats).map(SeatNumber::from_position).collect()
    }

    /// Whether a seat label belongs to this bus
    #[must_use]
    pub fn has_seat(&self, seat: &SeatNumber) -> bool {
        seat.position().is_some_and(|p| p >= 1 && p <= self.total_seats)
    }

    /// Cosmetic layout label for a seat
    ///
    /// Sleeper coaches run a 2+1 berth arrangement, seaters 2+2; non-numeric
    /// labels get no position.
    #[must_use]
    pub fn seat_layout(&self, seat: &SeatNumber) -> SeatLayout {
        let Some(position) = seat.position() else {
            return SeatLayout::Standard;
        };
        if self.category.is_sleeper() {
            match position % 3 {
                1 | 2 => SeatLayout::Window,
                _ => SeatLayout::Aisle,
            }
        } else {
            match position % 4 {
                0 | 1 => SeatLayout::Window,
                _ => SeatLayout::Aisle,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seater() -> Bus {
        Bus::new(BusId::new(), "KPN Travels", BusCategory::new("AC Seater"), 4)
    }

    fn sleeper() -> Bus {
        Bus::new(
            BusId::new(),
            "SRM Travels",
            BusCategory::new("AC Sleeper"),
            6,
        )
    }

    #[test]
    fn seat_set_spans_capacity() {
        let seats = seater().seat_set();
        assert_eq!(seats.len(), 4);
        assert_eq!(seats[0].as_str(), "1");
        assert_eq!(seats[3].as_str(), "4");
    }

    #[test]
    fn has_seat_respects_capacity() {
        let bus = seater();
        assert!(bus.has_seat(&SeatNumber::from_position(1)));
        assert!(bus.has_seat(&SeatNumber::from_position(4)));
        assert!(!bus.has_seat(&SeatNumber::from_position(5)));
        assert!(!bus.has_seat(&SeatNumber::new("U2").unwrap()));
    }

    #[test]
    fn seater_layout_is_two_plus_two() {
        let bus = seater();
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(1)), SeatLayout::Window);
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(2)), SeatLayout::Aisle);
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(3)), SeatLayout::Aisle);
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(4)), SeatLayout::Window);
    }

    #[test]
    fn sleeper_layout_is_two_plus_one() {
        let bus = sleeper();
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(1)), SeatLayout::Window);
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(2)), SeatLayout::Window);
        assert_eq!(bus.seat_layout(&SeatNumber::from_position(3)), SeatLayout::Aisle);
    }

    #[test]
    fn non_numeric_label_is_standard() {
        let bus = seater();
        assert_eq!(
            bus.seat_layout(&SeatNumber::new("U4").unwrap()),
            SeatLayout::Standard
        );
    }
}
