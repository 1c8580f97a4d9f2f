//! Data models for stored locations.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A reported position in degrees.
///
/// Coordinates are taken as given; no range checks are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Location {
    /// Create a location from latitude and longitude.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A location together with the instant the store recorded it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// The reported position.
    pub location: Location,
    /// When the store appended this sample.
    pub created_at: OffsetDateTime,
}

impl Sample {
    /// Age of the sample relative to `now`.
    ///
    /// Negative if the clock moved backwards since the sample was recorded.
    pub fn age(&self, now: OffsetDateTime) -> time::Duration {
        now - self.created_at
    }

    /// Whether the sample is still visible under the given TTL.
    pub fn is_live(&self, now: OffsetDateTime, ttl: std::time::Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Snapshot of store occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of identifiers with a history entry (cleared ones included).
    pub identifiers: usize,
    /// Number of samples held in memory, expired ones included.
    pub samples: usize,
}
