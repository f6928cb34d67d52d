use crate::error::ConfigError;
use dotenv::dotenv;
use reqwest::Url;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    pub analysis_delay: Duration,
    pub demo_delay: Duration,
    /// Rows polars scans to guess column types in the upload preview.
    pub infer_schema_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            upload_timeout: Duration::from_secs(120),
            analysis_delay: Duration::from_millis(5000),
            demo_delay: Duration::from_millis(2000),
            infer_schema_length: 10_000,
        }
    }
}

impl Config {
    /// Reads `.env` and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let api_base_url = lookup("GENE_EXPLORER_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);
        if let Err(e) = Url::parse(&api_base_url) {
            return Err(ConfigError::InvalidUrl {
                url: api_base_url,
                reason: e.to_string(),
            });
        }

        Ok(Config {
            api_base_url,
            request_timeout: read_number(&lookup, "GENE_EXPLORER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            upload_timeout: read_number(&lookup, "GENE_EXPLORER_UPLOAD_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.upload_timeout),
            analysis_delay: read_number(&lookup, "GENE_EXPLORER_ANALYSIS_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.analysis_delay),
            demo_delay: read_number(&lookup, "GENE_EXPLORER_DEMO_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.demo_delay),
            infer_schema_length: read_number(&lookup, "INFER_SCHEMA_LENGTH")
                .unwrap_or(defaults.infer_schema_length),
        })
    }

    /// Simulated processing time before an analysis reload.
    pub fn analysis_wait(&self, backend_connected: bool) -> Duration {
        if backend_connected {
            self.analysis_delay
        } else {
            self.demo_delay
        }
    }
}

fn read_number<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let val = lookup(key)?;
    match val.trim().parse::<T>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(key, value = %val, "not a whole number, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn reads_overrides_and_trims_url() {
        let config = Config::from_lookup(lookup_from(&[
            ("GENE_EXPLORER_API_URL", "http://analytics.local:8080/api/"),
            ("GENE_EXPLORER_TIMEOUT_SECS", "15"),
            ("GENE_EXPLORER_DEMO_DELAY_MS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://analytics.local:8080/api");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.analysis_wait(false), Duration::from_millis(10));
        assert_eq!(config.analysis_wait(true), Duration::from_millis(5000));
    }

    #[test]
    fn bad_number_falls_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("GENE_EXPLORER_UPLOAD_TIMEOUT_SECS", "soon"),
            ("INFER_SCHEMA_LENGTH", "-5"),
        ]))
        .unwrap();
        assert_eq!(config.upload_timeout, Duration::from_secs(120));
        assert_eq!(config.infer_schema_length, 10_000);

        let config = Config::from_lookup(lookup_from(&[("INFER_SCHEMA_LENGTH", " 250 ")])).unwrap();
        assert_eq!(config.infer_schema_length, 250);
    }

    #[test]
    fn bad_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("GENE_EXPLORER_API_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
