use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level alea configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AleaConfig {
    /// Global RNG seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Estimator settings.
    #[serde(default)]
    pub estimator: EstimatorToml,

    /// Sampler settings.
    #[serde(default)]
    pub sampler: SamplerToml,
}

impl AleaConfig {
    /// Reads a TOML file, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&toml_str).context("failed to parse TOML config")
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatorToml {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for EstimatorToml {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
        }
    }
}

fn default_max_items() -> usize {
    alea_markov::config::DEFAULT_MAX_ITEMS
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerToml {
    #[serde(default)]
    pub n_states: Option<usize>,
    #[serde(default = "default_initial_state")]
    pub initial_state: usize,
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Authored matrix rows; rows that do not sum to 1 are normalized.
    #[serde(default)]
    pub matrix: Option<Vec<Vec<f64>>>,
}

impl Default for SamplerToml {
    fn default() -> Self {
        Self {
            n_states: None,
            initial_state: default_initial_state(),
            steps: default_steps(),
            matrix: None,
        }
    }
}

fn default_initial_state() -> usize {
    1
}
fn default_steps() -> usize {
    16
}
