//! Analyze command: estimate a transition matrix from a symbol stream.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use alea_markov::message::{matrix_rows, pair_matrix_rows};
use alea_markov::{EstimatorConfig, Output, SecondOrderEstimator, TransitionEstimator};

use crate::cli::AnalyzeArgs;
use crate::config::AleaConfig;
use crate::report::AnalysisReport;
use crate::{convert, input};

/// Run the analysis pipeline.
pub fn run(args: AnalyzeArgs) -> Result<()> {
    let _cmd = info_span!("analyze", order = args.order).entered();
    let mut config = AleaConfig::load(args.config.as_deref())?;
    if let Some(n) = args.max_items {
        config.estimator.max_items = n;
    }
    let est_cfg = convert::build_estimator_config(&config.estimator)?;
    if args.order == 2 && args.output.is_some() {
        bail!("--output reports hold first-order matrices only; drop --order 2");
    }

    info!(path = %args.input.display(), "reading symbols");
    let symbols = input::parse_symbols(input::open(&args.input)?)?;
    info!(n = symbols.len(), "symbols loaded");

    let rows = if args.order == 2 {
        estimate_second_order(&est_cfg, symbols)?
    } else {
        let estimator = estimate(&est_cfg, symbols)?;
        if let Some(path) = &args.output {
            AnalysisReport::from_estimator(&estimator).write(path)?;
            info!(path = %path.display(), "report written");
        }
        matrix_rows(&estimator.build_matrix())
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in rows {
        writeln!(out, "{row}").context("failed to write matrix")?;
    }
    Ok(())
}

fn estimate(cfg: &EstimatorConfig, symbols: Vec<i64>) -> Result<TransitionEstimator> {
    let mut estimator = TransitionEstimator::from_config(cfg)?;
    let dropped = estimator.record_all(symbols);
    log_counts(dropped, estimator.capacity(), estimator.size());
    Ok(estimator)
}

fn estimate_second_order(cfg: &EstimatorConfig, symbols: Vec<i64>) -> Result<Vec<Output>> {
    let mut estimator = SecondOrderEstimator::from_config(cfg)?;
    let dropped = estimator.record_all(symbols);
    log_counts(dropped, estimator.capacity(), estimator.size());
    Ok(pair_matrix_rows(&estimator.build_matrix()))
}

fn log_counts(dropped: usize, max_items: usize, n_states: usize) {
    if dropped > 0 {
        warn!(
            dropped,
            max_items, "maximum number of unique items reached, symbols ignored"
        );
    }
    if n_states == 0 {
        warn!("no data to analyze, matrix is empty");
    }
    info!(n_states, "transition counts accumulated");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_order_rows() {
        let est = estimate(&EstimatorConfig::new(), vec![1, 2, 1, 3, 1, 2]).unwrap();
        let rows = matrix_rows(&est.build_matrix());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].to_string(), "set_matrix 3 1 0 0");
    }

    #[test]
    fn second_order_rows() {
        let rows = estimate_second_order(&EstimatorConfig::new(), vec![1, 2, 1, 2]).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].to_string(), "set_matrix 1 2 1 0");
    }

    #[test]
    fn capacity_applies_to_both_orders() {
        let cfg = EstimatorConfig::new().with_max_items(2);
        assert_eq!(estimate(&cfg, vec![1, 2, 3]).unwrap().size(), 2);
        let rows = estimate_second_order(&cfg, vec![1, 2, 3, 1]).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn empty_stream_emits_nothing() {
        assert!(estimate_second_order(&EstimatorConfig::new(), Vec::new())
            .unwrap()
            .is_empty());
        let est = estimate(&EstimatorConfig::new(), Vec::new()).unwrap();
        assert!(matrix_rows(&est.build_matrix()).is_empty());
    }
}
