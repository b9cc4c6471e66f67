// ABOUTME: Runtime configuration loaded from environment variables
// ABOUTME: Validates ports, durations, and connection limits before the server starts

pub mod constants;

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use constants::*;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// `None` means the default file under the data directory
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub cors_origin: String,
    pub snapshot_ttl: Duration,
    pub session_ttl_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_API_HOST
                .parse()
                .unwrap_or(IpAddr::from([127, 0, 0, 1])),
            port: DEFAULT_API_PORT,
            database_url: None,
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            snapshot_ttl: Duration::from_secs(DEFAULT_SNAPSHOT_TTL_SECS),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup(RFPDESK_API_HOST) {
            config.host = parse_var(RFPDESK_API_HOST, &host)?;
        }

        // New name wins over the legacy one
        if let Some(port) = lookup(RFPDESK_API_PORT).or_else(|| lookup(PORT)) {
            let port: u16 = parse_var(RFPDESK_API_PORT, &port)?;
            if port == 0 {
                return Err(ConfigError::PortOutOfRange(port));
            }
            config.port = port;
        }

        config.database_url = lookup(RFPDESK_DATABASE_URL).filter(|url| !url.trim().is_empty());

        if let Some(max) = lookup(RFPDESK_DB_MAX_CONNECTIONS) {
            let max: u32 = parse_var(RFPDESK_DB_MAX_CONNECTIONS, &max)?;
            if max == 0 {
                return Err(ConfigError::MustBePositive(RFPDESK_DB_MAX_CONNECTIONS));
            }
            config.max_connections = max;
        }

        if let Some(origin) = lookup(RFPDESK_CORS_ORIGIN) {
            config.cors_origin = origin;
        }

        if let Some(ttl) = lookup(RFPDESK_SNAPSHOT_TTL_SECS) {
            let secs: u64 = parse_var(RFPDESK_SNAPSHOT_TTL_SECS, &ttl)?;
            config.snapshot_ttl = Duration::from_secs(secs);
        }

        if let Some(ttl) = lookup(RFPDESK_SESSION_TTL_HOURS) {
            let hours: i64 = parse_var(RFPDESK_SESSION_TTL_HOURS, &ttl)?;
            if hours <= 0 {
                return Err(ConfigError::MustBePositive(RFPDESK_SESSION_TTL_HOURS));
            }
            config.session_ttl_hours = hours;
        }

        debug!(?config, "Loaded configuration");
        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
}
