//! Run configuration.
//!
//! Everything except the service URL has a default. The URL comes from the
//! config file or `MARINE_ERDDAP_URL`; there is no built-in host, so
//! credentials are only ever sent to a server the user named. Credentials are
//! only ever taken from the environment (or `.env`), never from the file.

use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::datasets;
use crate::ingest::erddap::Credentials;
use crate::model::{VAR_SALINITY, VAR_TEMPERATURE};

pub const ENV_BASE_URL: &str = "MARINE_ERDDAP_URL";
pub const ENV_USERNAME: &str = "COPERNICUSMARINE_SERVICE_USERNAME";
pub const ENV_PASSWORD: &str = "COPERNICUSMARINE_SERVICE_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid depth probe range {min}..{max}")]
    DepthRange { min: f64, max: f64 },
    #[error("service.timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("No marine data service configured: set MARINE_ERDDAP_URL or [service] base_url")]
    MissingBaseUrl,
    #[error("Invalid service URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub temperature: VariableConfig,
    pub salinity: VariableConfig,
    pub depth_probe: DepthProbeConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableConfig {
    pub dataset_id: String,
    pub variable: String,
}

/// Depth window searched for available levels before snapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepthProbeConfig {
    pub min_depth: f64,
    pub max_depth: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Token written for a reading the provider had no value for.
    pub missing_value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            temperature: VariableConfig::registered(VAR_TEMPERATURE),
            salinity: VariableConfig::registered(VAR_SALINITY),
            depth_probe: DepthProbeConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 60,
        }
    }
}

impl VariableConfig {
    fn registered(variable: &str) -> Self {
        let dataset_id = datasets::dataset_for(variable)
            .map(|d| d.dataset_id.to_string())
            .unwrap_or_default();
        Self {
            dataset_id,
            variable: variable.to_string(),
        }
    }
}

impl Default for DepthProbeConfig {
    fn default() -> Self {
        Self {
            min_depth: 0.0,
            max_depth: 10.0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            missing_value: "nan".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::from_toml_str(&text, &origin)
    }

    /// Apply environment overrides. Only the base URL can be overridden.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.service.base_url = Some(url.trim().to_string());
            }
        }
        self
    }

    /// The configured service URL, checked to be an absolute http(s) URL.
    pub fn base_url(&self) -> Result<&str, ConfigError> {
        let url = self
            .service
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let parsed = Url::parse(url).map_err(|e| ConfigError::BaseUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::BaseUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(url)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let probe = &self.depth_probe;
        if !probe.min_depth.is_finite() || !probe.max_depth.is_finite() || probe.min_depth > probe.max_depth {
            return Err(ConfigError::DepthRange {
                min: probe.min_depth,
                max: probe.max_depth,
            });
        }
        Ok(())
    }
}

/// Service credentials from the environment, when both halves are set.
pub fn credentials_from_env() -> Option<Credentials> {
    let username = std::env::var(ENV_USERNAME).ok()?;
    let password = std::env::var(ENV_PASSWORD).ok()?;
    if username.is_empty() {
        return None;
    }
    Some(Credentials { username, password })
}
