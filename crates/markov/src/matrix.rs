//! Dense row-stochastic transition matrix shared by estimator and sampler.

use tracing::warn;

use crate::error::MarkovError;

/// Maximum distance of a row sum from 1.0 before the row is rescaled.
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Outcome of storing a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowFit {
    /// The row already summed to 1 and was stored as given.
    Exact,
    /// The row was divided by `sum` before being stored.
    Rescaled {
        /// The sum of the supplied values.
        sum: f64,
    },
}

/// An `n x n` row-stochastic transition matrix.
///
/// Entry `(i, j)` is the probability of moving from state `i` to state `j`.
/// Rows are stored contiguously. A matrix with `n == 0` is unsized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionMatrix {
    n: usize,
    probs: Vec<f64>,
}

impl TransitionMatrix {
    /// Returns the unsized (0 x 0) matrix.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns an `n x n` matrix with every entry `1/n`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidDimension`] if `n == 0`.
    pub fn uniform(n: usize) -> Result<Self, MarkovError> {
        if n == 0 {
            return Err(MarkovError::InvalidDimension { n: 0 });
        }
        Ok(Self {
            n,
            probs: vec![1.0 / n as f64; n * n],
        })
    }

    /// Builds a matrix from rows, normalizing each row like [`set_row`](Self::set_row).
    ///
    /// An empty input yields the unsized matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::NonSquareMatrix`] if any row length differs from
    /// the number of rows, or [`MarkovError::InvalidRow`] if a row cannot be
    /// normalized.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, MarkovError> {
        let n = rows.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != n) {
            return Err(MarkovError::NonSquareMatrix {
                rows: n,
                row: row + 1,
                len: r.as_ref().len(),
            });
        }
        let mut probs = Vec::with_capacity(n * n);
        for (i, r) in rows.iter().enumerate() {
            let (fitted, fit) = fit_row(i, r.as_ref())?;
            if let RowFit::Rescaled { sum } = fit {
                warn!(row = i + 1, sum, "row does not sum to 1, normalizing");
            }
            probs.extend(fitted);
        }
        Ok(Self { n, probs })
    }

    /// Constructs a matrix from already row-stochastic data without checks.
    pub(crate) fn from_raw(n: usize, probs: Vec<f64>) -> Self {
        debug_assert_eq!(probs.len(), n * n);
        Self { n, probs }
    }

    /// Number of states.
    pub fn n_states(&self) -> usize {
        self.n
    }

    /// Returns `true` for the unsized matrix.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the transition probabilities out of state `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n`.
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.n, "row {i} out of range for {} states", self.n);
        &self.probs[i * self.n..(i + 1) * self.n]
    }

    /// Returns the probability of moving from `i` to `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn prob(&self, i: usize, j: usize) -> f64 {
        self.row(i)[j]
    }

    /// Iterates over the rows in state order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on 0, and the unsized matrix has no rows anyway.
        self.probs.chunks_exact(self.n.max(1))
    }

    /// Copies the matrix into nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Reallocates as an `n x n` uniform matrix, discarding prior contents.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidDimension`] if `n == 0`; the matrix is
    /// left unchanged.
    pub fn resize_uniform(&mut self, n: usize) -> Result<(), MarkovError> {
        *self = Self::uniform(n)?;
        Ok(())
    }

    /// Refills every row with `1/n`, keeping the size.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::UnsizedModel`] if the matrix is unsized.
    pub fn reset_to_uniform(&mut self) -> Result<(), MarkovError> {
        if self.is_empty() {
            return Err(MarkovError::UnsizedModel);
        }
        self.probs.fill(1.0 / self.n as f64);
        Ok(())
    }

    /// Replaces row `i`, rescaling it when it does not sum to 1.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::UnsizedModel`], [`MarkovError::RowOutOfRange`],
    /// [`MarkovError::RowLengthMismatch`] or [`MarkovError::InvalidRow`]; the
    /// matrix is left unchanged in every case.
    pub fn set_row(&mut self, i: usize, values: &[f64]) -> Result<RowFit, MarkovError> {
        if self.is_empty() {
            return Err(MarkovError::UnsizedModel);
        }
        if i >= self.n {
            return Err(MarkovError::RowOutOfRange {
                row: i as i64 + 1,
                n: self.n,
            });
        }
        if values.len() != self.n {
            return Err(MarkovError::RowLengthMismatch {
                row: i + 1,
                expected: self.n,
                got: values.len(),
            });
        }
        let (fitted, fit) = fit_row(i, values)?;
        if let RowFit::Rescaled { sum } = fit {
            warn!(row = i + 1, sum, "row does not sum to 1, normalizing");
        }
        self.probs[i * self.n..(i + 1) * self.n].copy_from_slice(&fitted);
        Ok(fit)
    }

    /// Validates that the matrix is row-stochastic.
    ///
    /// Checks that all values are finite, in `[0, 1]`, and that each row
    /// sums to 1.0 within [`ROW_SUM_TOLERANCE`].
    pub fn validate(&self) -> Result<(), MarkovError> {
        for (i, row) in self.rows().enumerate() {
            check_distribution(&format!("probs[{i}]"), row)?;
        }
        Ok(())
    }

    /// Picks the successor of `from` for a uniform draw `u` in `[0, 1)`.
    ///
    /// Walks the row accumulating probabilities and returns the first column
    /// whose cumulative sum strictly exceeds `u`. Falls back to the last
    /// column when rounding leaves the cumulative sum short of `u`.
    ///
    /// # Panics
    ///
    /// Panics if `from >= n`.
    pub fn next_state(&self, from: usize, u: f64) -> usize {
        let row = self.row(from);
        let mut cumulative = 0.0;
        for (j, &p) in row.iter().enumerate() {
            cumulative += p;
            if cumulative > u {
                return j;
            }
        }
        self.n - 1
    }

    /// Draws the successor of `from` using `rng`.
    ///
    /// # Panics
    ///
    /// Panics if `from >= n`.
    pub fn sample(&self, from: usize, rng: &mut impl rand::Rng) -> usize {
        let u: f64 = rng.random();
        self.next_state(from, u)
    }
}

/// Checks that `row` is a probability distribution.
///
/// `label` names the row in error messages, e.g. `probs[2]`.
pub(crate) fn check_distribution(label: &str, row: &[f64]) -> Result<(), MarkovError> {
    let mut sum = 0.0;
    for (j, &p) in row.iter().enumerate() {
        if !p.is_finite() {
            return Err(MarkovError::InvalidProbability {
                reason: format!("{label}[{j}] is not finite: {p}"),
            });
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(MarkovError::InvalidProbability {
                reason: format!("{label}[{j}] = {p} is outside [0, 1]"),
            });
        }
        sum += p;
    }
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        return Err(MarkovError::InvalidProbability {
            reason: format!("{label} sums to {sum}, expected ~1.0"),
        });
    }
    Ok(())
}

/// Checks a candidate row and rescales it to sum to 1 when needed.
///
/// `i` is the 0-indexed row, used for error reporting only.
fn fit_row(i: usize, values: &[f64]) -> Result<(Vec<f64>, RowFit), MarkovError> {
    let row = i + 1;
    if let Some(&p) = values.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(MarkovError::InvalidRow {
            row,
            reason: format!("entry {p} is not a finite non-negative number"),
        });
    }
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(MarkovError::InvalidRow {
            row,
            reason: format!("values sum to {sum}"),
        });
    }
    if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
        let rescaled = values.iter().map(|p| p / sum).collect();
        Ok((rescaled, RowFit::Rescaled { sum }))
    } else {
        Ok((values.to_vec(), RowFit::Exact))
    }
}
