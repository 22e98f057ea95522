use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use gupta_core::config::{env_or, ConfigError};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: IpAddr,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `8080`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `LOG_FORMAT`           | `text` (or `json`)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = env_or("PORT", 8080)?;
        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30)?;

        let raw_origins: String = env_or("CORS_ORIGINS", "http://localhost:5173".to_string())?;
        let cors_origins = parse_origins(&raw_origins)?;

        let log_format: String = env_or("LOG_FORMAT", "text".to_string())?;
        let json_logs = match log_format.as_str() {
            "text" => false,
            "json" => true,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: log_format,
                })
            }
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            json_logs,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Split a comma-separated origin list, rejecting values that are not valid
/// header values.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                name: "CORS_ORIGINS",
                value: origin.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_split_and_trimmed() {
        let origins = parse_origins("http://a.test, http://b.test,,").unwrap();
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn invalid_origin_is_rejected() {
        assert!(parse_origins("http://ok.test,bad\norigin").is_err());
    }
}
