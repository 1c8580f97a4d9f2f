//! In-memory location history for short-lived tracking.
//!
//! A [`HistoryStore`] keeps, per identifier, the sequence of locations that
//! were reported for it. Each sample is stamped by the store's [`Clock`] when
//! it is appended, and reads only return samples younger than the configured
//! time-to-live. Expiry is lazy: old samples are hidden at read time and stay
//! in memory until the identifier is cleared.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use history_store::{HistoryStore, Location};
//!
//! let store = HistoryStore::new(Duration::from_secs(60));
//! store.append("order-42", Location::new(52.52, 13.405));
//! store.append("order-42", Location::new(52.53, 13.41));
//!
//! // Most recent sample only
//! let window = store.get_window("order-42", 1)?;
//! assert_eq!(window[0].location, Location::new(52.53, 13.41));
//!
//! store.clear("order-42")?;
//! assert!(store.get_window("order-42", 0)?.is_empty());
//! # Ok::<(), history_store::Error>(())
//! ```

mod clock;
mod error;
mod models;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use models::{Location, Sample, StoreStats};
pub use store::HistoryStore;

/// TTL applied when none is configured.
pub const DEFAULT_TTL: std::time::Duration = std::time::Duration::from_secs(60);
