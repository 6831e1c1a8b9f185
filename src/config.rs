//! Dashboard settings.
//!
//! Values start from [`DashboardConfig::default`], are overlaid by an optional
//! TOML file and finally by `DASHBOARD__*` environment variables.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "DASHBOARD__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Where the backend services live and how often to poll them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Employee service, hosts the five transition routes.
    pub employees_url: String,
    /// Customer service, hosts order listing and status lookups.
    pub customers_url: String,
    /// Analytics service, hosts the per-location KPI queries.
    pub analytics_url: String,
    /// Restaurant location this dashboard works for.
    pub local_id: String,
    /// Path of the order listing on the customer service.
    pub orders_path: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            employees_url: "http://127.0.0.1:8080".into(),
            customers_url: "http://127.0.0.1:8080".into(),
            analytics_url: "http://127.0.0.1:8080".into(),
            local_id: "LOCAL-001".into(),
            orders_path: "/pedido/list".into(),
            poll_interval_secs: 30,
            request_timeout_secs: 10,
        }
    }
}

impl DashboardConfig {
    /// Loads settings from `path` (if given) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies `DASHBOARD__<FIELD>` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("EMPLOYEES_URL") {
            self.employees_url = v;
        }
        if let Some(v) = var("CUSTOMERS_URL") {
            self.customers_url = v;
        }
        if let Some(v) = var("ANALYTICS_URL") {
            self.analytics_url = v;
        }
        if let Some(v) = var("LOCAL_ID") {
            self.local_id = v;
        }
        if let Some(v) = var("ORDERS_PATH") {
            self.orders_path = v;
        }
        if let Some(v) = var("POLL_INTERVAL_SECS") {
            self.poll_interval_secs = parse_secs("poll_interval_secs", &v)?;
        }
        if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_secs("request_timeout_secs", &v)?;
        }
        Ok(())
    }

    /// Rejects settings the dashboard cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("employees_url", &self.employees_url),
            ("customers_url", &self.customers_url),
            ("analytics_url", &self.analytics_url),
            ("local_id", &self.local_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    value: value.clone(),
                });
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_secs".into(),
                value: "0".into(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalize(&mut self) {
        for url in [
            &mut self.employees_url,
            &mut self.customers_url,
            &mut self.analytics_url,
        ] {
            let trimmed = url.trim().trim_end_matches('/').to_string();
            *url = trimmed;
        }
        if !self.orders_path.starts_with('/') {
            self.orders_path.insert(0, '/');
        }
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.into(),
        value: raw.into(),
    })
}
