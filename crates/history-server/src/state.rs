//! Application state shared across handlers.

use std::sync::Arc;

use history_store::HistoryStore;
use time::OffsetDateTime;

use crate::config::Config;

/// Shared application state.
///
/// The store synchronizes internally, so handlers call it directly without an
/// outer lock.
pub struct AppState {
    /// Location histories.
    pub store: HistoryStore,
    /// Effective configuration the server was started with.
    pub config: Config,
    /// When the server started.
    pub started_at: OffsetDateTime,
}

impl AppState {
    /// Create new application state with an empty store using the configured TTL.
    pub fn new(config: Config) -> Arc<Self> {
        let store = HistoryStore::new(config.history.ttl());
        Self::with_store(store, config)
    }

    /// Create application state around an existing store.
    pub fn with_store(store: HistoryStore, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store,
            config,
            started_at: OffsetDateTime::now_utc(),
        })
    }

    /// Seconds since the server started.
    pub fn uptime_seconds(&self) -> u64 {
        (OffsetDateTime::now_utc() - self.started_at)
            .whole_seconds()
            .max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use history_store::Location;
    use std::time::Duration;

    #[test]
    fn test_app_state_new_uses_config_ttl() {
        let mut config = Config::default();
        config.history.ttl_secs = 5;
        let state = AppState::new(config);

        assert_eq!(state.store.ttl(), Duration::from_secs(5));
        assert_eq!(state.config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_app_state_store_access() {
        let state = AppState::new(Config::default());
        state.store.append("device", Location::new(1.0, 2.0));

        let window = state.store.get_window("device", 0).unwrap();
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_app_state_with_store() {
        let store = HistoryStore::new(Duration::from_secs(7));
        let state = AppState::with_store(store, Config::default());
        assert_eq!(state.store.ttl(), Duration::from_secs(7));
    }

    #[test]
    fn test_uptime_starts_near_zero() {
        let state = AppState::new(Config::default());
        assert!(state.uptime_seconds() < 5);
    }
}
