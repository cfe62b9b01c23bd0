//! Server configuration.
//!
//! Loaded from environment variables with fallback to defaults.

use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use justcani_core::StoreClock;

const DEV_JWT_SECRET: &str = "justcani-dev-secret-change-in-production";

/// Log output format for `tracing-subscriber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub db_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// JWT secret key for signing tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// JWT lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Where processed profile pictures are written
    pub upload_dir: PathBuf,

    /// Upload size limit in bytes (default: 2MB)
    pub max_upload_bytes: usize,

    /// Store-local UTC offset for day buckets (default: +07:00 WIB)
    pub store_utc_offset_minutes: i32,

    /// Code128 generation switch
    pub barcode_enabled: bool,

    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            db_path: PathBuf::from("./data/justcani.db"),
            db_max_connections: 5,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_lifetime_secs: 43_200, // 12 hours, one shift
            upload_dir: PathBuf::from("./static/uploads/profile_pics"),
            max_upload_bytes: 2 * 1024 * 1024,
            store_utc_offset_minutes: 7 * 60,
            barcode_enabled: true,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from any variable source.
    ///
    /// Unset variables keep their defaults; set but unparseable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let config = ServerConfig {
            host: lookup("JUSTCANI_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "JUSTCANI_PORT", defaults.port)?,
            db_path: lookup("JUSTCANI_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_lifetime_secs: parse_var(&lookup, "JWT_LIFETIME_SECS", defaults.jwt_lifetime_secs)?,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            store_utc_offset_minutes: parse_var(
                &lookup,
                "STORE_UTC_OFFSET_MINUTES",
                defaults.store_utc_offset_minutes,
            )?,
            barcode_enabled: parse_var(&lookup, "BARCODE_ENABLED", defaults.barcode_enabled)?,
            log_format: match lookup("LOG_FORMAT").as_deref().map(str::trim) {
                None | Some("") | Some("pretty") => LogFormat::Pretty,
                Some("json") => LogFormat::Json,
                Some(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
            },
        };

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if StoreClock::from_offset_minutes(config.store_utc_offset_minutes).is_none() {
            return Err(ConfigError::InvalidValue(
                "STORE_UTC_OFFSET_MINUTES".to_string(),
            ));
        }

        Ok(config)
    }

    /// `host:port` for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The store's local clock. Offsets were range-checked in `from_lookup`.
    pub fn store_clock(&self) -> StoreClock {
        StoreClock::from_offset_minutes(self.store_utc_offset_minutes).unwrap_or_else(StoreClock::wib)
    }

    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.max_upload_bytes, 2_097_152);
        assert_eq!(config.store_utc_offset_minutes, 420);
        assert!(config.barcode_enabled);
        assert!(config.uses_dev_jwt_secret());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JUSTCANI_PORT", "9000"),
            ("BARCODE_ENABLED", "false"),
            ("LOG_FORMAT", "json"),
            ("JWT_SECRET", "s3cret"),
            ("STORE_UTC_OFFSET_MINUTES", "480"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert!(!config.barcode_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(!config.uses_dev_jwt_secret());
        assert_eq!(config.store_clock().offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("JUSTCANI_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref v) if v == "JUSTCANI_PORT"));

        assert!(load(&[("BARCODE_ENABLED", "maybe")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(load(&[("STORE_UTC_OFFSET_MINUTES", "100000")]).is_err());
        assert!(load(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(matches!(
            load(&[("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::MissingRequired(_)
        ));
    }
}
