use crate::{error::Error, retry::RetryPolicy};
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://petstore.swagger.io/v2";
pub const DEFAULT_API_KEY: &str = "test_api_key";

/// Harness settings, sourced from the environment with defaults matching
/// the public demo pet store.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub logs_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. `from_env` is
    /// a thin wrapper; tests inject a map instead of mutating the process
    /// environment.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, Error> {
        let base_url = lookup("PETSTORE_BASE_URL")
            .unwrap_or_else(|| String::from(DEFAULT_BASE_URL))
            .trim_end_matches('/')
            .to_string();
        let api_key = lookup("PETSTORE_API_KEY").unwrap_or_else(|| String::from(DEFAULT_API_KEY));

        let timeout = Duration::from_secs(parse_number(&lookup, "PETSTORE_TIMEOUT_SECS", 30)?);
        let max_retries = parse_number(&lookup, "PETSTORE_MAX_RETRIES", 3)? as u32;
        let backoff_base =
            Duration::from_millis(parse_number(&lookup, "PETSTORE_BACKOFF_BASE_MS", 500)?);
        let backoff_cap =
            Duration::from_millis(parse_number(&lookup, "PETSTORE_BACKOFF_CAP_MS", 5000)?);

        let logs_dir = PathBuf::from(lookup("PETSTORE_LOGS_DIR").unwrap_or_else(|| String::from("logs")));
        let reports_dir =
            PathBuf::from(lookup("PETSTORE_REPORTS_DIR").unwrap_or_else(|| String::from("reports")));

        Ok(Self {
            base_url,
            api_key,
            timeout,
            max_retries,
            backoff_base,
            backoff_cap,
            logs_dir,
            reports_dir,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_base, self.backoff_cap)
    }
}

fn parse_number<F: Fn(&str) -> Option<String>>(
    lookup: &F,
    key: &str,
    default: u64,
) -> Result<u64, Error> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| Error::InvalidConfiguration {
            key: String::from(key),
            reason: format!("expected a non-negative integer, got {:?}", raw),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<HarnessConfig, Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (String::from(*key), String::from(*value)))
            .collect();
        HarnessConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_demo_pet_store() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, DEFAULT_API_KEY);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_base, Duration::from_millis(500));
        assert_eq!(config.backoff_cap, Duration::from_millis(5000));
    }

    #[test]
    fn overrides_are_read_from_the_lookup() {
        let config = config_from(&[
            ("PETSTORE_BASE_URL", "http://localhost:8080/v2/"),
            ("PETSTORE_API_KEY", "sekrit"),
            ("PETSTORE_MAX_RETRIES", "5"),
            ("PETSTORE_BACKOFF_BASE_MS", "10"),
        ])
        .unwrap();

        // trailing slash is trimmed so paths concatenate cleanly
        assert_eq!(config.base_url, "http://localhost:8080/v2");
        assert_eq!(config.api_key, "sekrit");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_policy().max_attempts(), 6);
        assert_eq!(config.backoff_base, Duration::from_millis(10));
    }

    #[test]
    fn malformed_numbers_are_configuration_errors() {
        let result = config_from(&[("PETSTORE_TIMEOUT_SECS", "thirty")]);

        match result {
            Err(Error::InvalidConfiguration { key, .. }) => {
                assert_eq!(key, "PETSTORE_TIMEOUT_SECS")
            }
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }
}
