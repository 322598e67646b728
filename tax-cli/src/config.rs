//! Configuration file support.
//!
//! ```toml
//! [provider]
//! backend = "http"                  # or "csv"
//! source = "http://localhost:5000"  # base URL, CSV path, or "bundled"
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! file = "tax-estimator.log"
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tax_core::rates::ProviderConfig;
use thiserror::Error;

use crate::logging::DEFAULT_LEVEL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub provider: ProviderSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub backend: String,
    pub source: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        let defaults = ProviderConfig::default();
        Self {
            backend: defaults.backend,
            source: defaults.source,
            timeout_secs: defaults.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            backend: self.provider.backend.trim().to_lowercase(),
            source: self.provider.source.clone(),
            timeout_secs: self.provider.timeout_secs,
        }
    }
}
