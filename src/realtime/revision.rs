//! # Revision Register
//!
//! Holds the latest known revision and only ever moves it forward.
//!
//! ## Invariant
//! The stored revision never decreases. Stale, duplicate and malformed
//! candidates are no-ops, not errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::RealtimeError;

/// A revision of the externally tracked state.
///
/// Ordered numerically. Encoded on the wire as its decimal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// Create a revision from its numeric value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Revision {
    type Err = RealtimeError;

    /// Parses decimal text. Surrounding whitespace is ignored; signs,
    /// fractions and anything non-numeric are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RealtimeError::MalformedRevision(s.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Revision)
            .map_err(|_| RealtimeError::MalformedRevision(s.to_string()))
    }
}

/// Monotonic revision register
#[derive(Debug)]
pub struct RevisionRegister {
    current: Revision,
}

impl RevisionRegister {
    /// Create a register seeded with the bootstrap revision
    pub fn new(initial: Revision) -> Self {
        Self { current: initial }
    }

    /// Current revision
    pub fn get(&self) -> Revision {
        self.current
    }

    /// Store `candidate` if it is strictly greater than the current value.
    ///
    /// Returns whether the register moved.
    pub fn try_advance(&mut self, candidate: Revision) -> bool {
        if candidate > self.current {
            self.current = candidate;
            true
        } else {
            false
        }
    }

    /// Parse `candidate` and advance with it.
    ///
    /// A malformed candidate leaves the register untouched and reports
    /// the parse error; callers treat it like a stale update.
    pub fn try_advance_str(&mut self, candidate: &str) -> Result<bool, RealtimeError> {
        let revision = candidate.parse::<Revision>()?;
        Ok(self.try_advance(revision))
    }
}
