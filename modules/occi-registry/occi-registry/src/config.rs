//! Configuration for the OCCI Registry module.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "OCCI_REGISTRY_";

/// Configuration for the OCCI Registry module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OcciRegistryConfig {
    /// Prefix for category locations synthesized from the term.
    /// Default: `"/"`
    pub location_root: String,

    /// Refuse a batch write that would duplicate an `occiId` or a location
    /// already stored. When unset, the last write wins.
    /// Default: `true`
    pub enforce_unique_on_write: bool,

    /// Tracing filter directive used when `RUST_LOG` is not set.
    /// Default: `"info"`
    pub log_filter: String,
}

impl Default for OcciRegistryConfig {
    fn default() -> Self {
        Self {
            location_root: "/".to_owned(),
            enforce_unique_on_write: true,
            log_filter: "info".to_owned(),
        }
    }
}

#[derive(Error, Debug)]
#[error("invalid occi-registry configuration: {0}")]
pub struct ConfigError(#[from] Box<figment::Error>);

impl OcciRegistryConfig {
    /// Loads the configuration from defaults, the YAML file at `path` if
    /// given, then `OCCI_REGISTRY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source holds an unknown key or a value of
    /// the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(&figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extracts the configuration from an already assembled figment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::from(Box::new(e)))
    }
}

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when `RUST_LOG` is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
#[must_use]
pub fn init_logging(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
