//! Configuration management
//!
//! Settings are resolved in this order:
//! 1. environment variables
//! 2. the `dayline.toml` file in the working directory
//! 3. defaults
//!
//! `${VAR_NAME}` inside the config file expands to the environment value.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::Error;
use crate::plan::{
    DEFAULT_END_HOUR, DEFAULT_START_HOUR, HOUR_HEIGHT, LOAD_BATCH, MAX_DAYS_AHEAD,
    MIN_EVENT_HEIGHT, NOW_TICK_SECS, RECURRENCE_WINDOW_DAYS,
};

/// Default config file name looked up by [`Config::load`]
pub const CONFIG_FILE: &str = "dayline.toml";

/// Main configuration for Dayline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means localhost only
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for bearer tokens
    #[serde(default, skip_serializing)]
    pub token_secret: String,

    /// Token lifetime. `None` issues tokens that never expire
    #[serde(default)]
    pub token_ttl_hours: Option<u64>,

    /// Login attempts allowed per client per minute
    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl_hours: None,
            login_attempts: default_login_attempts(),
        }
    }
}

/// Planner constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Days past the window start over which weekly tasks are materialized
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Pixel height of one timeline hour
    #[serde(default = "default_hour_height")]
    pub hour_height: f64,

    #[serde(default = "default_min_event_height")]
    pub min_event_height: f64,

    /// Hour range shown for a day without tasks
    #[serde(default = "default_start_hour")]
    pub default_start_hour: u32,

    #[serde(default = "default_end_hour")]
    pub default_end_hour: u32,

    #[serde(default = "default_max_days_ahead")]
    pub max_days_ahead: u32,

    #[serde(default = "default_load_batch")]
    pub load_batch: u32,

    /// Period of the live "now" marker refresh
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            hour_height: default_hour_height(),
            min_event_height: default_min_event_height(),
            default_start_hour: default_start_hour(),
            default_end_hour: default_end_hour(),
            max_days_ahead: default_max_days_ahead(),
            load_batch: default_load_batch(),
            tick_secs: default_tick_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "data/dayline.db".to_string()
}

fn default_login_attempts() -> u32 {
    10
}

fn default_window_days() -> u32 {
    RECURRENCE_WINDOW_DAYS
}

fn default_hour_height() -> f64 {
    HOUR_HEIGHT
}

fn default_min_event_height() -> f64 {
    MIN_EVENT_HEIGHT
}

fn default_start_hour() -> u32 {
    DEFAULT_START_HOUR
}

fn default_end_hour() -> u32 {
    DEFAULT_END_HOUR
}

fn default_max_days_ahead() -> u32 {
    MAX_DAYS_AHEAD
}

fn default_load_batch() -> u32 {
    LOAD_BATCH
}

fn default_tick_secs() -> u64 {
    NOW_TICK_SECS
}

impl Config {
    /// Replace `${VAR_NAME}` with the environment value.
    ///
    /// Unset variables expand to an empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next();

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();
        cfg.ensure_token_secret();

        Ok(cfg)
    }

    fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        let config: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        Ok(Self::from_toml_config(config))
    }

    /// Load `./dayline.toml` when present, otherwise environment only
    pub fn load() -> crate::Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_toml_file(CONFIG_FILE);
        }

        Self::from_env()
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let server = toml.server.unwrap_or_default();
        let database = toml.database.unwrap_or_default();
        let auth = toml.auth.unwrap_or_default();
        let calendar = toml.calendar.unwrap_or_default();

        Config {
            server: ServerConfig {
                host: server.host.unwrap_or_else(default_host),
                port: server.port.unwrap_or_else(default_port),
                allowed_origins: server.allowed_origins.unwrap_or_default(),
            },
            database: DatabaseConfig {
                db_path: database.db_path.unwrap_or_else(default_db_path),
            },
            auth: AuthConfig {
                token_secret: auth.token_secret.unwrap_or_default(),
                token_ttl_hours: auth.token_ttl_hours,
                login_attempts: auth.login_attempts.unwrap_or_else(default_login_attempts),
            },
            calendar: CalendarConfig {
                window_days: calendar.window_days.unwrap_or_else(default_window_days),
                hour_height: calendar.hour_height.unwrap_or_else(default_hour_height),
                min_event_height: calendar
                    .min_event_height
                    .unwrap_or_else(default_min_event_height),
                default_start_hour: calendar
                    .default_start_hour
                    .unwrap_or_else(default_start_hour),
                default_end_hour: calendar.default_end_hour.unwrap_or_else(default_end_hour),
                max_days_ahead: calendar
                    .max_days_ahead
                    .unwrap_or_else(default_max_days_ahead),
                load_batch: calendar.load_batch.unwrap_or_else(default_load_batch),
                tick_secs: calendar.tick_secs.unwrap_or_else(default_tick_secs),
            },
        }
    }

    /// Environment variables take precedence over the file
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("DAYLINE_HOST") {
            if !host.is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("DAYLINE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(origins) = std::env::var("DAYLINE_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(path) = std::env::var("DAYLINE_DB_PATH") {
            self.database.db_path = path;
        }

        if let Ok(secret) = std::env::var("DAYLINE_TOKEN_SECRET") {
            if !secret.is_empty() {
                self.auth.token_secret = secret;
            }
        }
        if let Ok(ttl) = std::env::var("DAYLINE_TOKEN_TTL_HOURS") {
            self.auth.token_ttl_hours = ttl.parse().ok().filter(|h| *h > 0);
        }

        if let Ok(height) = std::env::var("DAYLINE_HOUR_HEIGHT") {
            if let Ok(h) = height.parse::<f64>() {
                if h > 0.0 {
                    self.calendar.hour_height = h;
                }
            }
        }
        if let Ok(days) = std::env::var("DAYLINE_WINDOW_DAYS") {
            if let Ok(d) = days.parse() {
                self.calendar.window_days = d;
            }
        }
    }

    /// Without a configured secret, tokens are signed with a per-process key
    /// and stop verifying after a restart.
    fn ensure_token_secret(&mut self) {
        if self.auth.token_secret.is_empty() {
            warn!("DAYLINE_TOKEN_SECRET not set; using an ephemeral token secret");
            self.auth.token_secret = format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            );
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        cfg.ensure_token_secret();
        Ok(cfg)
    }
}

// ============================================================================
// TOML file layout
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    server: Option<TomlServerConfig>,
    database: Option<TomlDatabaseConfig>,
    auth: Option<TomlAuthConfig>,
    calendar: Option<TomlCalendarConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlServerConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlDatabaseConfig {
    #[serde(default)]
    db_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlAuthConfig {
    #[serde(default)]
    token_secret: Option<String>,
    #[serde(default)]
    token_ttl_hours: Option<u64>,
    #[serde(default)]
    login_attempts: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlCalendarConfig {
    window_days: Option<u32>,
    hour_height: Option<f64>,
    min_event_height: Option<f64>,
    default_start_hour: Option<u32>,
    default_end_hour: Option<u32>,
    max_days_ahead: Option<u32>,
    load_batch: Option<u32>,
    tick_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.db_path, "data/dayline.db");
    }

    #[test]
    fn test_calendar_config_default() {
        let config = CalendarConfig::default();
        assert_eq!(config.window_days, 56);
        assert_eq!(config.hour_height, 60.0);
        assert_eq!(config.min_event_height, 40.0);
        assert_eq!((config.default_start_hour, config.default_end_hour), (6, 22));
        assert_eq!(config.max_days_ahead, 365);
        assert_eq!(config.load_batch, 30);
        assert_eq!(config.tick_secs, 60);
    }

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(config.token_secret.is_empty());
        assert!(config.token_ttl_hours.is_none());
        assert_eq!(config.login_attempts, 10);
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("DAYLINE_CONFIG_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${DAYLINE_CONFIG_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        let result = Config::expand_env_vars("prefix_${DAYLINE_NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("DAYLINE_CONFIG_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        assert_eq!(Config::expand_env_vars("no_vars_here"), "no_vars_here");
        assert_eq!(Config::expand_env_vars("$PLAIN"), "$PLAIN");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[server]
host = "0.0.0.0"
port = 8080
allowed_origins = ["http://localhost:5173"]

[database]
db_path = "/tmp/dayline-test.db"

[auth]
token_secret = "secret"
token_ttl_hours = 24

[calendar]
hour_height = 48.0
window_days = 28
"#;

        let config = Config::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.database.db_path, "/tmp/dayline-test.db");
        assert_eq!(config.auth.token_secret, "secret");
        assert_eq!(config.auth.token_ttl_hours, Some(24));
        assert_eq!(config.auth.login_attempts, 10);
        assert_eq!(config.calendar.hour_height, 48.0);
        assert_eq!(config.calendar.window_days, 28);
        assert_eq!(config.calendar.load_batch, 30);
    }

    #[test]
    fn test_toml_config_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.calendar.window_days, 56);
    }

    #[test]
    fn test_toml_config_rejects_bad_syntax() {
        let err = Config::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dayline.toml");
        std::fs::write(&path, "[database]\ndb_path = \"tasks.db\"\n").unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        assert!(!config.auth.token_secret.is_empty());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file("/nonexistent/dayline.toml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
