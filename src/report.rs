//! JSON report written by `analyze` and read back by `sample`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use alea_markov::{TransitionEstimator, TransitionMatrix};

/// Everything an estimator learned from one symbol stream.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Registered symbols; position `i` labels row and column `i`.
    pub symbols: Vec<i64>,
    /// Non-zero transition counts.
    pub transitions: Vec<TransitionCount>,
    /// Derived transition matrix.
    pub matrix: Vec<Vec<f64>>,
}

/// One observed transition and how often it occurred.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TransitionCount {
    pub from: i64,
    pub to: i64,
    pub count: u64,
}

impl AnalysisReport {
    /// Snapshots an estimator.
    pub fn from_estimator(est: &TransitionEstimator) -> Self {
        Self {
            symbols: est.symbols().to_vec(),
            transitions: est
                .transitions()
                .map(|(t, count)| TransitionCount {
                    from: t.from,
                    to: t.to,
                    count,
                })
                .collect(),
            matrix: est.build_matrix().to_rows(),
        }
    }

    /// Rebuilds the transition matrix, checking its shape and rows.
    pub fn to_matrix(&self) -> Result<TransitionMatrix> {
        TransitionMatrix::from_rows(&self.matrix).context("report holds an invalid matrix")
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report: {}", path.display()))
    }

    /// Reads a report written by [`write`](Self::write).
    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report: {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("failed to parse report: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_from_known_sequence() {
        let mut est = TransitionEstimator::new();
        est.record_all([1, 2, 1, 3, 1, 2]);
        let report = AnalysisReport::from_estimator(&est);

        assert_eq!(report.symbols, vec![1, 2, 3]);
        assert_eq!(
            report.transitions,
            vec![
                TransitionCount { from: 1, to: 2, count: 2 },
                TransitionCount { from: 1, to: 3, count: 1 },
                TransitionCount { from: 2, to: 1, count: 1 },
                TransitionCount { from: 3, to: 1, count: 1 },
            ]
        );
        assert_eq!(report.matrix[1], vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn write_then_read() {
        let mut est = TransitionEstimator::new();
        est.record_all([4, 4, 5, 4]);
        let report = AnalysisReport::from_estimator(&est);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write(&path).unwrap();

        let back = AnalysisReport::read(&path).unwrap();
        assert_eq!(back.symbols, report.symbols);
        assert_eq!(back.to_matrix().unwrap(), est.build_matrix());
    }

    #[test]
    fn empty_report_matrix_is_unsized() {
        let report = AnalysisReport::from_estimator(&TransitionEstimator::new());
        assert!(report.to_matrix().unwrap().is_empty());
    }
}
