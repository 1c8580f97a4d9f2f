//! HTTP API for short-lived location history.
//!
//! Clients report the current coordinates of an identifier (an order, a
//! courier, a device) and later read back the recent trail. Locations older
//! than the configured TTL are left out of reads; nothing is persisted.
//!
//! # REST API Endpoints
//!
//! - `POST /location/{id}/now` - Record `{"lat": f64, "lng": f64}` for `id`
//! - `GET /location/{id}?max=N` - Recent locations, oldest first
//! - `DELETE /location/{id}` - Clear the history for `id`
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Uptime, TTL and store occupancy
//!
//! # Configuration
//!
//! The service reads `~/.config/history-server/server.toml` when present:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [history]
//! ttl_secs = 60
//! ```
//!
//! `HISTORY_SERVER_LISTEN_ADDR` and `LOCATION_HISTORY_TTL_SECONDS` override
//! the file, and command-line flags override both.

pub mod api;
pub mod config;
pub mod state;

pub use config::{Config, ConfigError, HistoryConfig, ServerConfig, ValidationError};
pub use state::AppState;
