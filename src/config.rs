//! Server configuration.
//!
//! Loaded from environment variables with defaults for everything.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PING_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_PONG_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address, "host:port"
    pub bind_address: String,

    /// How often each connection is pinged
    pub ping_interval: Duration,

    /// How long a ping may go unanswered
    pub pong_timeout: Duration,

    /// Bound of the room manager's command channel
    pub command_queue_capacity: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: format!("{}:{}", DEFAULT_BIND_HOST, DEFAULT_PORT),
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECONDS),
            pong_timeout: Duration::from_secs(DEFAULT_PONG_TIMEOUT_SECONDS),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = vars
            .get("BIND_HOST")
            .map(String::as_str)
            .unwrap_or(DEFAULT_BIND_HOST);
        let port: u16 = parse_var(vars, "PORT", DEFAULT_PORT)?;

        let ping_seconds: u64 =
            parse_var(vars, "PING_INTERVAL_SECONDS", DEFAULT_PING_INTERVAL_SECONDS)?;
        let pong_seconds: u64 =
            parse_var(vars, "PONG_TIMEOUT_SECONDS", DEFAULT_PONG_TIMEOUT_SECONDS)?;
        let command_queue_capacity: usize =
            parse_var(vars, "COMMAND_QUEUE_CAPACITY", DEFAULT_COMMAND_QUEUE_CAPACITY)?;

        // the pong timeout needs a whole second below the ping interval
        if ping_seconds < 2 {
            return Err(ConfigError::InvalidValue(
                "PING_INTERVAL_SECONDS must be at least 2".to_string(),
            ));
        }
        if pong_seconds == 0 || pong_seconds >= ping_seconds {
            return Err(ConfigError::InvalidValue(format!(
                "PONG_TIMEOUT_SECONDS must be between 1 and {}",
                ping_seconds - 1
            )));
        }
        if command_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "COMMAND_QUEUE_CAPACITY must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            bind_address: format!("{}:{}", host, port),
            ping_interval: Duration::from_secs(ping_seconds),
            pong_timeout: Duration::from_secs(pong_seconds),
            command_queue_capacity,
        })
    }
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{}={:?} is not valid", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.pong_timeout, Duration::from_secs(10));
        assert_eq!(config.command_queue_capacity, 1024);
    }

    #[test]
    fn default_impl_matches_empty_env() {
        let config = Config::default();
        let loaded = Config::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.bind_address, loaded.bind_address);
        assert_eq!(config.ping_interval, loaded.ping_interval);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_vars(&vars(&[
            ("BIND_HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("PING_INTERVAL_SECONDS", "15"),
            ("PONG_TIMEOUT_SECONDS", "5"),
            ("COMMAND_QUEUE_CAPACITY", "64"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.ping_interval, Duration::from_secs(15));
        assert_eq!(config.pong_timeout, Duration::from_secs(5));
        assert_eq!(config.command_queue_capacity, 64);
    }

    #[test]
    fn rejects_unparseable_port() {
        let err = Config::from_vars(&vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(Config::from_vars(&vars(&[("PORT", "70000")])).is_err());
    }

    #[test]
    fn rejects_zero_ping_interval() {
        assert!(Config::from_vars(&vars(&[("PING_INTERVAL_SECONDS", "0")])).is_err());
    }

    #[test]
    fn one_second_ping_interval_is_rejected_up_front() {
        let err = Config::from_vars(&vars(&[
            ("PING_INTERVAL_SECONDS", "1"),
            ("PONG_TIMEOUT_SECONDS", "1"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PING_INTERVAL_SECONDS must be at least 2"));

        let config = Config::from_vars(&vars(&[
            ("PING_INTERVAL_SECONDS", "2"),
            ("PONG_TIMEOUT_SECONDS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.ping_interval, Duration::from_secs(2));
        assert_eq!(config.pong_timeout, Duration::from_secs(1));
    }

    #[test]
    fn rejects_pong_timeout_not_below_ping_interval() {
        assert!(
            Config::from_vars(&vars(&[
                ("PING_INTERVAL_SECONDS", "10"),
                ("PONG_TIMEOUT_SECONDS", "10"),
            ]))
            .is_err()
        );
        assert!(Config::from_vars(&vars(&[("PONG_TIMEOUT_SECONDS", "0")])).is_err());
    }

    #[test]
    fn rejects_zero_queue_capacity() {
        assert!(Config::from_vars(&vars(&[("COMMAND_QUEUE_CAPACITY", "0")])).is_err());
    }
}
