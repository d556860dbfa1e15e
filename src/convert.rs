//! Pure conversion functions: TOML config structs -> crate API types.

use anyhow::{Context, Result, bail};

use alea_markov::{EstimatorConfig, SamplerConfig, TransitionMatrix};

use crate::config::{EstimatorToml, SamplerToml};

/// Builds an [`EstimatorConfig`] from the TOML estimator section.
pub fn build_estimator_config(est: &EstimatorToml) -> Result<EstimatorConfig> {
    let cfg = EstimatorConfig::new().with_max_items(est.max_items);
    cfg.validate().context("invalid [estimator] config")?;
    Ok(cfg)
}

/// Builds a [`SamplerConfig`] from the TOML sampler section.
///
/// When an authored matrix is present its row count is the state count, and
/// `n_states`, if also set, must agree with it.
pub fn build_sampler_config(sampler: &SamplerToml, seed: Option<u64>) -> Result<SamplerConfig> {
    let n_states = match (&sampler.matrix, sampler.n_states) {
        (Some(rows), Some(n)) if rows.len() != n => {
            bail!(
                "[sampler].n_states = {n} but [sampler].matrix has {} rows",
                rows.len()
            )
        }
        (Some(rows), _) => Some(rows.len()),
        (None, n) => n,
    };

    let mut cfg = SamplerConfig::new().with_initial_state(sampler.initial_state);
    if let Some(n) = n_states {
        cfg = cfg.with_n_states(n);
    }
    if let Some(s) = seed {
        cfg = cfg.with_seed(s);
    }
    cfg.validate().context("invalid [sampler] config")?;
    Ok(cfg)
}

/// Builds the authored matrix from the TOML sampler section, if present.
pub fn build_matrix(sampler: &SamplerToml) -> Result<Option<TransitionMatrix>> {
    sampler
        .matrix
        .as_deref()
        .map(|rows| TransitionMatrix::from_rows(rows).context("invalid [sampler].matrix"))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler_toml(n_states: Option<usize>, matrix: Option<Vec<Vec<f64>>>) -> SamplerToml {
        SamplerToml {
            n_states,
            matrix,
            ..SamplerToml::default()
        }
    }

    #[test]
    fn estimator_config_passes_capacity() {
        let cfg = build_estimator_config(&EstimatorToml { max_items: 12 }).unwrap();
        assert_eq!(cfg.max_items(), 12);
    }

    #[test]
    fn estimator_zero_capacity_rejected() {
        assert!(build_estimator_config(&EstimatorToml { max_items: 0 }).is_err());
    }

    #[test]
    fn matrix_implies_size() {
        let toml = sampler_toml(None, Some(vec![vec![1.0, 0.0], vec![0.0, 1.0]]));
        let cfg = build_sampler_config(&toml, Some(3)).unwrap();
        assert_eq!(cfg.n_states(), Some(2));
        assert_eq!(cfg.seed(), Some(3));
    }

    #[test]
    fn size_disagreement_rejected() {
        let toml = sampler_toml(Some(3), Some(vec![vec![1.0, 0.0], vec![0.0, 1.0]]));
        assert!(build_sampler_config(&toml, None).is_err());
    }

    #[test]
    fn initial_state_checked_against_size() {
        let toml = SamplerToml {
            n_states: Some(2),
            initial_state: 3,
            ..SamplerToml::default()
        };
        assert!(build_sampler_config(&toml, None).is_err());
    }

    #[test]
    fn matrix_rows_normalized() {
        let toml = sampler_toml(None, Some(vec![vec![1.0, 1.0], vec![0.0, 2.0]]));
        let tm = build_matrix(&toml).unwrap().unwrap();
        assert_eq!(tm.to_rows(), vec![vec![0.5, 0.5], vec![0.0, 1.0]]);
    }

    #[test]
    fn ragged_matrix_rejected() {
        let toml = sampler_toml(None, Some(vec![vec![1.0, 0.0], vec![1.0]]));
        assert!(build_matrix(&toml).is_err());
    }

    #[test]
    fn missing_matrix_is_none() {
        assert!(build_matrix(&SamplerToml::default()).unwrap().is_none());
    }
}
