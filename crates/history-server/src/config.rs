//! Server configuration.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults (`0.0.0.0:8080`, 60 second TTL)
//! 2. A TOML file (`--config`, or [`default_config_path`] if it exists)
//! 3. Environment variables ([`LISTEN_ADDR_ENV`], [`TTL_ENV`])
//! 4. Command-line flags
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [history]
//! ttl_secs = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the listen address.
///
/// Accepts a bare port (`8080`), `:port`, or `host:port`.
pub const LISTEN_ADDR_ENV: &str = "HISTORY_SERVER_LISTEN_ADDR";

/// Environment variable overriding the history TTL.
///
/// Accepts whole seconds (`90`) or a duration such as `1m30s`.
pub const TTL_ENV: &str = "LOCATION_HISTORY_TTL_SECONDS";

/// Minimum TTL in seconds.
pub const MIN_TTL_SECS: u64 = 1;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// History retention settings.
    pub history: HistoryConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// Unset and empty variables leave the current value untouched.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = read(LISTEN_ADDR_ENV) {
            self.server.bind = normalize_bind(&addr);
        }

        if let Some(ttl) = read(TTL_ENV) {
            self.history.ttl_secs = parse_ttl_secs(&ttl).map_err(|reason| ConfigError::InvalidEnv {
                var: TTL_ENV,
                value: ttl.clone(),
                reason,
            })?;
        }

        Ok(())
    }

    /// Apply command-line overrides.
    ///
    /// `bind` accepts the same forms as [`LISTEN_ADDR_ENV`].
    pub fn apply_overrides(&mut self, bind: Option<&str>, ttl_secs: Option<u64>) {
        if let Some(bind) = bind {
            self.server.bind = normalize_bind(bind);
        }
        if let Some(ttl_secs) = ttl_secs {
            self.history.ttl_secs = ttl_secs;
        }
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format, non-zero port)
    /// - History TTL is at least [`MIN_TTL_SECS`]
    ///
    /// # Example
    ///
    /// ```
    /// use history_server::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.history.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "bind address cannot be empty".to_string(),
            });
            return errors;
        }

        let parts: Vec<&str> = self.bind.rsplitn(2, ':').collect();
        if parts.len() != 2 {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            });
            return errors;
        }

        match parts[0].parse::<u16>() {
            Ok(0) => errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "port cannot be 0".to_string(),
            }),
            Err(_) => errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: format!("invalid port '{}': must be a number 1-65535", parts[0]),
            }),
            Ok(_) => {}
        }

        errors
    }
}

/// History retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum age of a returned sample, in seconds.
    pub ttl_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: history_store::DEFAULT_TTL.as_secs(),
        }
    }
}

impl HistoryConfig {
    /// The TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validate history configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.ttl_secs < MIN_TTL_SECS {
            errors.push(ValidationError {
                field: "history.ttl_secs".to_string(),
                message: format!("ttl must be at least {} second(s)", MIN_TTL_SECS),
            });
        }
        errors
    }
}

/// Turn a listen address from the environment or command line into `host:port`.
///
/// A bare port or `:port` listens on all interfaces.
pub fn normalize_bind(addr: &str) -> String {
    let addr = addr.trim();
    if !addr.is_empty() && addr.bytes().all(|b| b.is_ascii_digit()) {
        format!("0.0.0.0:{}", addr)
    } else if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{}", port)
    } else {
        addr.to_string()
    }
}

/// Parse a TTL given as whole seconds (`90`) or with `h`/`m`/`s` units (`1m30s`).
pub fn parse_ttl_secs(value: &str) -> Result<u64, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(secs);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(format!("unknown unit '{}' (expected h, m or s)", c)),
        };
        let amount: u64 = digits
            .parse()
            .map_err(|_| format!("missing number before '{}'", c))?;
        total = amount
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| "duration too large".to_string())?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(format!("missing unit after '{}'", digits));
    }

    Ok(total)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("history-server")
        .join("server.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.history.ttl_secs, 60);
        assert_eq!(config.history.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_full_toml() {
        let toml = r#"
            [server]
            bind = "127.0.0.1:9000"

            [history]
            ttl_secs = 300
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.history.ttl_secs, 300);
    }

    #[test]
    fn test_config_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[history]\nttl_secs = 5\n").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.history.ttl_secs, 5);
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("server.toml");
        std::fs::write(&config_path, "[server]\nbind = \"0.0.0.0:9090\"\n").unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:9090");
        assert_eq!(loaded.history.ttl_secs, 60);
    }

    #[test]
    fn test_config_to_toml_round_trip() {
        let mut config = Config::default();
        config.history.ttl_secs = 120;

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("ttl_secs = 120"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.history.ttl_secs, 120);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/server.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "this is not valid { toml").unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("history-server/server.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[(LISTEN_ADDR_ENV, "9999"), (TTL_ENV, "15")]))
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9999");
        assert_eq!(config.history.ttl_secs, 15);
    }

    #[test]
    fn test_env_unset_or_empty_keeps_values() {
        let mut config = Config::default();
        config.history.ttl_secs = 42;
        config
            .apply_env_from(env(&[(LISTEN_ADDR_ENV, ""), (TTL_ENV, "  ")]))
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.history.ttl_secs, 42);
    }

    #[test]
    fn test_env_invalid_ttl() {
        let mut config = Config::default();
        let result = config.apply_env_from(env(&[(TTL_ENV, "soon")]));

        match result {
            Err(ConfigError::InvalidEnv { var, value, .. }) => {
                assert_eq!(var, TTL_ENV);
                assert_eq!(value, "soon");
            }
            other => panic!("expected InvalidEnv, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_normalize_bind() {
        let mut config = Config::default();
        config.apply_overrides(Some("9000"), None);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(config.validate().is_ok());

        config.apply_overrides(Some("127.0.0.1:7000"), Some(30));
        assert_eq!(config.server.bind, "127.0.0.1:7000");
        assert_eq!(config.history.ttl_secs, 30);
    }

    #[test]
    fn test_overrides_take_precedence_over_env() {
        let mut config = Config::default();
        config
            .apply_env_from(env(&[(LISTEN_ADDR_ENV, "8081"), (TTL_ENV, "15")]))
            .unwrap();
        config.apply_overrides(Some(":9001"), None);

        assert_eq!(config.server.bind, "0.0.0.0:9001");
        assert_eq!(config.history.ttl_secs, 15);
    }

    #[test]
    fn test_normalize_bind() {
        assert_eq!(normalize_bind("8080"), "0.0.0.0:8080");
        assert_eq!(normalize_bind(":8081"), "0.0.0.0:8081");
        assert_eq!(normalize_bind("127.0.0.1:80"), "127.0.0.1:80");
        assert_eq!(normalize_bind(" [::1]:8080 "), "[::1]:8080");
    }

    #[test]
    fn test_parse_ttl_secs() {
        assert_eq!(parse_ttl_secs("60"), Ok(60));
        assert_eq!(parse_ttl_secs("60s"), Ok(60));
        assert_eq!(parse_ttl_secs("2m"), Ok(120));
        assert_eq!(parse_ttl_secs("1m30s"), Ok(90));
        assert_eq!(parse_ttl_secs("1h"), Ok(3600));
        assert_eq!(parse_ttl_secs(" 5 "), Ok(5));
    }

    #[test]
    fn test_parse_ttl_secs_invalid() {
        assert!(parse_ttl_secs("").is_err());
        assert!(parse_ttl_secs("-5").is_err());
        assert!(parse_ttl_secs("10d").is_err());
        assert!(parse_ttl_secs("1m30").is_err());
        assert!(parse_ttl_secs("s").is_err());
        assert!(parse_ttl_secs("500ms").is_err());
    }

    // ==========================================================================
    // Validation tests
    // ==========================================================================

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_server_bind_validation() {
        let valid = ServerConfig {
            bind: "127.0.0.1:8080".to_string(),
        };
        assert!(valid.validate().is_empty());

        let valid_ipv6 = ServerConfig {
            bind: "[::1]:8080".to_string(),
        };
        assert!(valid_ipv6.validate().is_empty());

        let empty = ServerConfig {
            bind: "".to_string(),
        };
        let errors = empty.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot be empty"));

        let no_port = ServerConfig {
            bind: "127.0.0.1".to_string(),
        };
        let errors = no_port.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("host:port"));

        let port_zero = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
        };
        let errors = port_zero.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot be 0"));

        let bad_port = ServerConfig {
            bind: "127.0.0.1:abc".to_string(),
        };
        let errors = bad_port.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("must be a number"));
    }

    #[test]
    fn test_history_ttl_validation() {
        let zero = HistoryConfig { ttl_secs: 0 };
        let errors = zero.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "history.ttl_secs");

        assert!(HistoryConfig { ttl_secs: 1 }.validate().is_empty());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let config = Config {
            server: ServerConfig {
                bind: "nowhere".to_string(),
            },
            history: HistoryConfig { ttl_secs: 0 },
        };

        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let error = ConfigError::Validation(vec![
            ValidationError {
                field: "server.bind".to_string(),
                message: "port cannot be 0".to_string(),
            },
            ValidationError {
                field: "history.ttl_secs".to_string(),
                message: "ttl must be at least 1 second(s)".to_string(),
            },
        ]);
        let display = format!("{}", error);
        assert!(display.contains("server.bind"));
        assert!(display.contains("history.ttl_secs"));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Read {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let display = format!("{}", error);
        assert!(display.contains("/test/path"));
        assert!(display.contains("not found"));
    }
}
