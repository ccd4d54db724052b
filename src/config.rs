// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::env;

/// Western Indonesia Time (WIB), UTC+7.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// SQLite connection string
    pub database_url: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// Mark session cookies `Secure`
    pub secure_cookies: bool,
    /// Offset used to decide what "today" is
    pub utc_offset: FixedOffset,
    /// Prayer schedule API base URL
    pub prayer_api_url: String,
    /// Reverse geocoder base URL
    pub geocoder_url: String,
    /// Password for the initial admin account, if one should be seeded
    pub admin_initial_password: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offset_hours = match env::var("APP_UTC_OFFSET_HOURS") {
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::Invalid("APP_UTC_OFFSET_HOURS"))?,
            Err(_) => DEFAULT_UTC_OFFSET_HOURS,
        };
        let utc_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or(ConfigError::Invalid("APP_UTC_OFFSET_HOURS"))?;

        let jwt_signing_key = env::var("JWT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_signing_key.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        Ok(Self {
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://amaliah.db?mode=rwc".to_string()),
            jwt_signing_key: jwt_signing_key.into_bytes(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            secure_cookies: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            utc_offset,
            prayer_api_url: env::var("PRAYER_API_URL")
                .unwrap_or_else(|_| "https://equran.id/api/v2".to_string()),
            geocoder_url: env::var("GEOCODER_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            admin_initial_password: env::var("ADMIN_INITIAL_PASSWORD")
                .ok()
                .filter(|v| !v.is_empty()),
        })
    }

    /// Config for tests: in-memory database, fixed key, unreachable upstreams.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            frontend_url: "http://localhost:5173".to_string(),
            secure_cookies: false,
            utc_offset: default_offset(),
            prayer_api_url: "http://127.0.0.1:9".to_string(),
            geocoder_url: "http://127.0.0.1:9".to_string(),
            admin_initial_password: None,
        }
    }

    /// Today's calendar date in the configured offset.
    pub fn today(&self) -> NaiveDate {
        crate::time_utils::today_in(self.utc_offset)
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some("test_jwt_key_32_bytes_minimum!!")),
                ("APP_PORT", Some("9090")),
                ("APP_ENV", Some("production")),
                ("APP_UTC_OFFSET_HOURS", None),
                ("DATABASE_URL", None),
            ],
            || {
                let config = Config::from_env().expect("Config should load");

                assert_eq!(config.port, 9090);
                assert!(config.secure_cookies);
                assert_eq!(config.utc_offset.local_minus_utc(), 7 * 3600);
                assert_eq!(config.database_url, "sqlite://amaliah.db?mode=rwc");
            },
        );
    }

    #[test]
    #[serial]
    fn test_missing_jwt_secret() {
        temp_env::with_var("JWT_SECRET", None::<&str>, || {
            assert!(matches!(
                Config::from_env(),
                Err(ConfigError::Missing("JWT_SECRET"))
            ));
        });
    }

    #[test]
    #[serial]
    fn test_invalid_offset() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some("key")),
                ("APP_UTC_OFFSET_HOURS", Some("99")),
            ],
            || {
                assert!(matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid("APP_UTC_OFFSET_HOURS"))
                ));
            },
        );
    }
}
