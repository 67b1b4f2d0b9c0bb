// Runtime configuration read from the environment

use chrono::FixedOffset;

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid {expected}: {value}")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("PROPERTY_UTC_OFFSET_MINUTES must be within ±1439 minutes, got {0}")]
    OffsetOutOfRange(i32),
}

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Postgres connection string. In-memory stores are used when absent.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Property-local offset from UTC, applied to "now"
    pub utc_offset: FixedOffset,
    /// Seed the default inventory when the item store is empty
    pub seed_inventory: bool,
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                expected: "port number",
                value: raw,
            })?,
            None => 8080,
        };

        let offset_minutes = match lookup("PROPERTY_UTC_OFFSET_MINUTES") {
            Some(raw) => raw.trim().parse::<i32>().map_err(|_| ConfigError::InvalidValue {
                key: "PROPERTY_UTC_OFFSET_MINUTES",
                expected: "whole number of minutes",
                value: raw,
            })?,
            None => 0,
        };
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or(ConfigError::OffsetOutOfRange(offset_minutes))?;

        let seed_inventory = match lookup("SEED_INVENTORY") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SEED_INVENTORY",
                        expected: "boolean",
                        value: raw,
                    })
                }
            },
            None => true,
        };

        Ok(Self {
            database_url,
            host,
            port,
            utc_offset,
            seed_inventory,
        })
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
