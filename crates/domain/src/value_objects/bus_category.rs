//! Bus category value object
//!
//! Categories ("AC Seater", "Non-AC Sleeper", ...) key the fare rate table
//! and the search filter. The import collaborator supplies free-form casing,
//! so comparisons are case-insensitive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A bus category label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusCategory(String);

impl BusCategory {
    /// Create a new category
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Get the category label as supplied
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized form used as a lookup key
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.trim().to_lowercase()
    }

    /// Case-insensitive match against another category label
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.normalized() == other.trim().to_lowercase()
    }

    /// Whether the category describes a sleeper coach
    #[must_use]
    pub fn is_sleeper(&self) -> bool {
        self.normalized().contains("sleeper")
    }
}

impl PartialEq for BusCategory {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for BusCategory {}

impl std::hash::Hash for BusCategory {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for BusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BusCategory {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BusCategory {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_case_and_padding() {
        assert_eq!(BusCategory::new("AC Seater"), BusCategory::new(" ac seater "));
    }

    #[test]
    fn matches_ignores_case() {
        let cat = BusCategory::new("Non-AC Sleeper");
        assert!(cat.matches("non-ac sleeper"));
        assert!(!cat.matches("AC Sleeper"));
    }

    #[test]
    fn sleeper_detection() {
        assert!(BusCategory::new("AC Sleeper").is_sleeper());
        assert!(!BusCategory::new("AC Seater").is_sleeper());
    }

    #[test]
    fn display_keeps_original_casing() {
        assert_eq!(BusCategory::new("AC Seater").to_string(), "AC Seater");
    }
}
