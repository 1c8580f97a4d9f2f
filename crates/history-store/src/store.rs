//! Main store implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::models::{Location, Sample, StoreStats};

/// Concurrent per-identifier location history with time-windowed reads.
///
/// # Locking
///
/// A single [`RwLock`] guards the whole map. [`append`](Self::append) and
/// [`clear`](Self::clear) take it exclusively; [`get_window`](Self::get_window)
/// and [`stats`](Self::stats) hold a shared guard for their whole traversal.
/// Every operation is short and in-memory, so the lock is never held across
/// an await point or any I/O.
///
/// A poisoned lock is recovered rather than propagated: every mutation is a
/// single `push` or assignment, so the map is always consistent.
pub struct HistoryStore {
    histories: RwLock<HashMap<String, Vec<Sample>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl HistoryStore {
    /// Create an empty store using the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create an empty store reading time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Maximum age of a sample returned by [`get_window`](Self::get_window).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record `location` as the current position of `id`.
    ///
    /// Creates the history on first use. The sample is stamped with the
    /// store's clock while the write lock is held, so each history stays
    /// ordered by `created_at` as well as by insertion.
    pub fn append(&self, id: &str, location: Location) {
        let mut histories = self.write();
        let sample = Sample {
            location,
            created_at: self.clock.now(),
        };
        histories.entry(id.to_string()).or_default().push(sample);
        drop(histories);

        debug!(id, lat = location.lat, lng = location.lng, "Appended location");
    }

    /// Recent samples for `id`, oldest first.
    ///
    /// Only samples younger than the TTL are returned. When `max` is non-zero
    /// the result is further cut to the last `max` of those live samples;
    /// `max == 0` means no limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing was ever appended for `id`. A
    /// history that is empty because it was cleared or fully expired yields
    /// an empty vector instead.
    pub fn get_window(&self, id: &str, max: usize) -> Result<Vec<Sample>> {
        let now = self.clock.now();
        let histories = self.read();
        let history = histories
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut live: Vec<Sample> = history
            .iter()
            .filter(|sample| sample.is_live(now, self.ttl))
            .copied()
            .collect();
        drop(histories);

        if max != 0 && live.len() > max {
            live.drain(..live.len() - max);
        }

        Ok(live)
    }

    /// Forget every sample recorded for `id`.
    ///
    /// The identifier stays known, so later reads return an empty window
    /// rather than [`Error::NotFound`]. Clearing an already empty history
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing was ever appended for `id`.
    pub fn clear(&self, id: &str) -> Result<()> {
        let mut histories = self.write();
        let history = histories
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let dropped = history.len();
        *history = Vec::new();
        drop(histories);

        debug!(id, dropped, "Cleared location history");
        Ok(())
    }

    /// Count identifiers and stored samples.
    pub fn stats(&self) -> StoreStats {
        let histories = self.read();
        StoreStats {
            identifiers: histories.len(),
            samples: histories.values().map(Vec::len).sum(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<Sample>>> {
        self.histories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<Sample>>> {
        self.histories.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TTL)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
