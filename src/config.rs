//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

use crate::{domain::MAX_BALANCE, locks::DEFAULT_LOCK_CAPACITY};

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound for a balance when validating charges
    pub max_balance: u64,

    /// Number of idle per-user locks kept before they are reclaimed
    pub lock_capacity: usize,

    /// Tracing filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Config {
    /// Load `.env` if present, then read the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_balance = lookup("POINT_MAX_BALANCE")
            .map(|value| value.parse::<u64>())
            .transpose()
            .map_err(|_| ConfigError::InvalidValue("POINT_MAX_BALANCE"))?
            .unwrap_or(MAX_BALANCE);

        let lock_capacity = lookup("POINT_LOCK_CAPACITY")
            .map(|value| value.parse::<usize>())
            .transpose()
            .map_err(|_| ConfigError::InvalidValue("POINT_LOCK_CAPACITY"))?
            .unwrap_or(DEFAULT_LOCK_CAPACITY);
        if lock_capacity == 0 {
            return Err(ConfigError::InvalidValue("POINT_LOCK_CAPACITY"));
        }

        let log_filter = lookup("POINT_LOG_FILTER")
            .unwrap_or_else(|| "point_ledger_service=info".to_string());

        Ok(Self {
            max_balance,
            lock_capacity,
            log_filter,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_balance: MAX_BALANCE,
            lock_capacity: DEFAULT_LOCK_CAPACITY,
            log_filter: "point_ledger_service=info".to_string(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let res = Config::from_lookup(lookup(&[]));

        assert_that!(res).is_ok().is_equal_to(Config::default());
    }

    #[test]
    fn test_overrides() {
        let res = Config::from_lookup(lookup(&[
            ("POINT_MAX_BALANCE", "5000"),
            ("POINT_LOCK_CAPACITY", "16"),
            ("POINT_LOG_FILTER", "debug"),
        ]));

        assert_that!(res).is_ok().is_equal_to(Config {
            max_balance: 5000,
            lock_capacity: 16,
            log_filter: "debug".to_string(),
        });
    }

    #[test]
    fn test_load_reads_environment() {
        // The only test touching these variables, so nothing else races on them
        std::env::set_var("POINT_MAX_BALANCE", "2500");
        std::env::set_var("POINT_LOCK_CAPACITY", "64");
        std::env::set_var("POINT_LOG_FILTER", "point_ledger_service=trace");

        let res = Config::load();

        std::env::remove_var("POINT_MAX_BALANCE");
        std::env::remove_var("POINT_LOCK_CAPACITY");
        std::env::remove_var("POINT_LOG_FILTER");
        assert_that!(res).is_ok().is_equal_to(Config {
            max_balance: 2500,
            lock_capacity: 64,
            log_filter: "point_ledger_service=trace".to_string(),
        });
    }

    #[test]
    fn test_invalid_max_balance() {
        let res = Config::from_lookup(lookup(&[("POINT_MAX_BALANCE", "-1")]));

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, ConfigError::InvalidValue("POINT_MAX_BALANCE")));
    }

    #[test]
    fn test_zero_lock_capacity() {
        let res = Config::from_lookup(lookup(&[("POINT_LOCK_CAPACITY", "0")]));

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, ConfigError::InvalidValue("POINT_LOCK_CAPACITY")));
    }
}
