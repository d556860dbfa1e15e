//! Sample command: generate a trajectory from a transition matrix.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::{info, info_span};

use alea_markov::{MarkovSampler, SamplerConfig, TransitionMatrix};

use crate::cli::SampleArgs;
use crate::config::AleaConfig;
use crate::convert;
use crate::report::AnalysisReport;

/// Run the sampling pipeline.
pub fn run(args: SampleArgs) -> Result<()> {
    let _cmd = info_span!("sample").entered();
    let mut config = AleaConfig::load(args.config.as_deref())?;
    if let Some(state) = args.state {
        config.sampler.initial_state = state;
    }
    let steps = args.steps.unwrap_or(config.sampler.steps);
    let seed = args.seed.or(config.seed);

    // A report matrix replaces whatever the config authored.
    let mut labels = None;
    let report_matrix = match &args.matrix {
        Some(path) => {
            info!(path = %path.display(), "reading matrix report");
            let report = AnalysisReport::read(path)?;
            let matrix = report.to_matrix()?;
            if matrix.is_empty() {
                bail!("report {} holds an empty matrix", path.display());
            }
            config.sampler.n_states = Some(matrix.n_states());
            config.sampler.matrix = None;
            if args.symbols {
                labels = Some(report.symbols);
            }
            Some(matrix)
        }
        None => None,
    };

    let sampler_cfg = convert::build_sampler_config(&config.sampler, seed)?;
    let matrix = match report_matrix {
        Some(m) => Some(m),
        None => convert::build_matrix(&config.sampler)?,
    };

    let sampler = build_sampler(&sampler_cfg, matrix)?;
    let trajectory = walk(sampler, steps)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match labels {
        Some(symbols) => {
            for symbol in to_symbols(&trajectory, &symbols)? {
                writeln!(out, "{symbol}").context("failed to write trajectory")?;
            }
        }
        None => {
            for k in trajectory {
                writeln!(out, "{k}").context("failed to write trajectory")?;
            }
        }
    }
    Ok(())
}

/// Maps 1-indexed states back to the symbols that label them.
fn to_symbols(trajectory: &[usize], symbols: &[i64]) -> Result<Vec<i64>> {
    trajectory
        .iter()
        .map(|&k| {
            k.checked_sub(1)
                .and_then(|i| symbols.get(i).copied())
                .with_context(|| format!("state {k} has no symbol in the report"))
        })
        .collect()
}

/// Creates a sampler from config, loading `matrix` when one was authored.
fn build_sampler(
    cfg: &SamplerConfig,
    matrix: Option<TransitionMatrix>,
) -> Result<MarkovSampler> {
    let mut sampler = MarkovSampler::from_config(cfg).context("failed to build sampler")?;
    if let Some(m) = matrix {
        sampler.load_matrix(m).context("failed to load matrix")?;
        sampler
            .set_state(cfg.initial_state() as i64)
            .context("invalid initial state")?;
    }
    if !sampler.is_sized() {
        bail!("no matrix: set [sampler].n_states or [sampler].matrix, or pass --matrix");
    }
    info!(
        n_states = sampler.n_states(),
        seed = sampler.seed_value(),
        "sampler ready"
    );
    Ok(sampler)
}

/// Draws `steps` states.
fn walk(mut sampler: MarkovSampler, steps: usize) -> Result<Vec<usize>> {
    let trajectory = sampler.sample_n(steps)?;
    info!(steps, "trajectory generated");
    Ok(trajectory)
}
