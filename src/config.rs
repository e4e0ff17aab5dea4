use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::EmissionsError;

pub const DEFAULT_API_URL: &str = "https://travelimpactmodel.googleapis.com/v1";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_CALCULATOR_URL: &str = "https://travelimpactmodel.org/lookup/flight";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureSet {
    Plain,
    Easa,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Direct { api_url: String, api_key: String },
    Fixture(FixtureSet),
    Proxy { base_url: String },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub fake_data: bool,
    pub fake_easa_data: bool,
    pub proxy_url: Option<String>,
    pub timeout: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: non_empty("TIM_API_URL"),
            api_key: non_empty("TIM_API_KEY"),
            fake_data: non_empty("TIM_FAKE_API_DATA").is_some_and(|v| is_truthy(&v)),
            fake_easa_data: non_empty("TIM_FAKE_API_EASA_DATA").is_some_and(|v| is_truthy(&v)),
            proxy_url: non_empty("TIM_PROXY_URL"),
            timeout: non_empty("TIM_TIMEOUT_SECS").and_then(|v| parse_or_warn("TIM_TIMEOUT_SECS", &v)),
        }
    }

    /// First match wins: direct API (URL and key), plain fixtures, EASA
    /// fixtures, then the proxy.
    pub fn data_source(&self) -> DataSource {
        let source = match (&self.api_url, &self.api_key) {
            (Some(api_url), Some(api_key)) => DataSource::Direct {
                api_url: api_url.clone(),
                api_key: api_key.clone(),
            },
            _ if self.fake_data => DataSource::Fixture(FixtureSet::Plain),
            _ if self.fake_easa_data => DataSource::Fixture(FixtureSet::Easa),
            _ => DataSource::Proxy {
                base_url: self.proxy_url.clone().unwrap_or_else(|| {
                    debug!("TIM_PROXY_URL not set, using default: {DEFAULT_PROXY_URL}");
                    DEFAULT_PROXY_URL.to_string()
                }),
            },
        };

        if self.api_url.is_some() != self.api_key.is_some() {
            warn!("TIM_API_URL and TIM_API_KEY must both be set for direct API access");
        }
        source
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_url: String,
    pub api_key: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, EmissionsError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EmissionsError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("TIM_API_KEY")
            .ok_or_else(|| EmissionsError::Config("TIM_API_KEY is required to run the proxy".into()))?;

        let api_url = non_empty("TIM_API_URL").unwrap_or_else(|| {
            info!("TIM_API_URL not set, using default: {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });

        let port = match non_empty("PORT") {
            Some(v) => v
                .parse()
                .map_err(|e| EmissionsError::Config(format!("invalid PORT \"{v}\": {e}")))?,
            None => {
                info!("PORT not set, using default: {DEFAULT_PORT}");
                DEFAULT_PORT
            }
        };

        Ok(Self {
            api_url,
            api_key,
            port,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T>
where
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| warn!("Invalid {key} value \"{value}\": {e}, using default"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("0"));
    }

    #[test]
    fn invalid_timeout_is_ignored() {
        let config = Config::from_lookup(|key| {
            (key == "TIM_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.timeout_secs(), DEFAULT_TIMEOUT_SECS);
    }
}
