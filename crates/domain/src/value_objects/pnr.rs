//! Booking reference (PNR) value object and generator
//!
//! A PNR is the external identifier of a booking: "MGT", the issuing
//! timestamp in base36, and a random suffix drawn from a CSPRNG. The suffix
//! gives ~2.2e9 distinct codes per millisecond, so concurrent issuance from
//! multiple service instances is practically collision-free; the storage
//! uniqueness constraint catches the residual case and callers regenerate.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const PNR_PREFIX: &str = "MGT";
const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A booking reference code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pnr(String);

impl Pnr {
    /// Generate a fresh reference for the given issuance instant
    ///
    /// The instant comes from the caller's clock capability so that issuance
    /// never reads ambient wall time.
    #[must_use]
    pub fn generate(issued_at: DateTime<Utc>) -> Self {
        let millis = issued_at.timestamp_millis().max(0);
        let mut code = String::with_capacity(PNR_PREFIX.len() + 9 + SUFFIX_LEN);
        code.push_str(PNR_PREFIX);
        #[allow(clippy::cast_sign_loss)]
        code.push_str(&to_base36(millis as u64));

        let mut rng = rand::rng();
        for _ in 0..SUFFIX_LEN {
            let idx = rng.random_range(0..ALPHABET.len());
            code.push(char::from(ALPHABET[idx]));
        }
        Self(code)
    }

    /// Parse a reference supplied by a caller
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPnr`] if the code does not carry the
    /// expected prefix or contains characters outside the PNR alphabet.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let code = code.trim().to_uppercase();
        let body = code
            .strip_prefix(PNR_PREFIX)
            .ok_or_else(|| DomainError::InvalidPnr(code.clone()))?;
        if body.len() < SUFFIX_LEN || !body.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(DomainError::InvalidPnr(code));
        }
        Ok(Self(code))
    }

    /// Get the reference code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pnr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Pnr {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        #[allow(clippy::cast_possible_truncation)]
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
