//! Service configuration.
//!
//! Environment variables:
//! - `HOST`: bind host (default: 0.0.0.0)
//! - `PORT`: bind port (default: 8080)
//! - `CLAIMS_PREFIX`: path the claims routes are mounted under (default: /claims)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)

use std::net::SocketAddr;

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default mount prefix for the claims routes.
pub const DEFAULT_PREFIX: &str = "/claims";

/// Error loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),
    /// `CLAIMS_PREFIX` is not an absolute path.
    #[error("Invalid CLAIMS_PREFIX value: {0} (must start with '/')")]
    InvalidPrefix(String),
    /// Host and port do not form a socket address.
    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Flattened JSON events.
    #[default]
    Json,
    /// Human readable output.
    Pretty,
}

impl LogFormat {
    /// Parse a format name; anything other than "pretty" is JSON.
    pub fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("pretty") {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Mount prefix for the claims routes.
    pub prefix: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            prefix: DEFAULT_PREFIX.to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let prefix = match lookup("CLAIMS_PREFIX") {
            Some(raw) if raw.starts_with('/') => normalize_prefix(&raw),
            Some(raw) => return Err(ConfigError::InvalidPrefix(raw)),
            None => defaults.prefix,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            prefix,
            log_format: lookup("LOG_FORMAT")
                .map(|s| LogFormat::from_str(&s))
                .unwrap_or_default(),
        })
    }

    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

/// Strip trailing slashes, keeping a lone "/".
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
