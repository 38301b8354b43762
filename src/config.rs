use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::models::InstrumentVariant;

pub const CONFIG_ENV: &str = "TB_INTAKE_CONFIG";

/// Deployment settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// The one literacy instrument this deployment administers.
    pub instrument: InstrumentVariant,
    pub allow_partial_scoring: bool,
    pub sample: SampleConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleConfig {
    pub seed: u64,
    pub count: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentVariant::ShortForm,
            allow_partial_scoring: false,
            sample: SampleConfig::default(),
        }
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { seed: 42, count: 30 }
    }
}

impl StudyConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid study configuration")
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Explicit path first, then the environment, then built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => {
                let config = Self::from_path(&path)?;
                tracing::info!(path = %path.display(), instrument = %config.instrument, "loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
