//! Second-order estimation: the next symbol conditioned on the last two.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EstimatorConfig;
use crate::error::MarkovError;
use crate::estimator::{Recorded, normalize_counts};
use crate::matrix::check_distribution;
use crate::registry::{Symbol, SymbolRegistry};

/// A symbol observed after an ordered pair of symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairTransition {
    /// Older symbol of the conditioning pair.
    pub first: Symbol,
    /// Newer symbol of the conditioning pair.
    pub second: Symbol,
    /// Symbol that followed the pair.
    pub to: Symbol,
}

/// An `n x n x n` tensor of next-symbol distributions.
///
/// Entry `(i, j, k)` is the probability of symbol `k` after the pair
/// `(i, j)`. Every `(i, j)` slice is a distribution over `k`. A tensor with
/// `n == 0` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairMatrix {
    n: usize,
    probs: Vec<f64>,
}

impl PairMatrix {
    /// Returns the empty tensor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of states.
    pub fn n_states(&self) -> usize {
        self.n
    }

    /// Returns `true` when nothing has been estimated.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Next-symbol distribution after the pair `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn row(&self, i: usize, j: usize) -> &[f64] {
        assert!(
            i < self.n && j < self.n,
            "pair ({i}, {j}) out of range for {} states",
            self.n
        );
        let start = (i * self.n + j) * self.n;
        &self.probs[start..start + self.n]
    }

    /// Probability of `k` after the pair `(i, j)`.
    pub fn prob(&self, i: usize, j: usize, k: usize) -> f64 {
        self.row(i, j)[k]
    }

    /// Iterates over `((i, j), distribution)` in pair order.
    pub fn rows(&self) -> impl Iterator<Item = ((usize, usize), &[f64])> {
        let n = self.n.max(1);
        self.probs
            .chunks_exact(n)
            .enumerate()
            .map(move |(r, row)| ((r / n, r % n), row))
    }

    /// Validates that every pair slice is a distribution.
    pub fn validate(&self) -> Result<(), MarkovError> {
        for ((i, j), row) in self.rows() {
            check_distribution(&format!("probs[{i}][{j}]"), row)?;
        }
        Ok(())
    }
}

/// Learns next-symbol frequencies conditioned on the two previous symbols.
///
/// Registration and capacity behave like
/// [`TransitionEstimator`](crate::TransitionEstimator); a count needs two
/// admitted predecessors, so the first two symbols after a clear only fill
/// the history.
#[derive(Debug, Clone, Default)]
pub struct SecondOrderEstimator {
    registry: SymbolRegistry,
    counts: BTreeMap<PairTransition, u64>,
    history: [Option<Symbol>; 2],
}

impl SecondOrderEstimator {
    /// Creates an empty estimator with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty estimator from a validated configuration.
    pub fn from_config(config: &EstimatorConfig) -> Result<Self, MarkovError> {
        config.validate()?;
        Ok(Self {
            registry: SymbolRegistry::new(config.max_items()),
            ..Self::default()
        })
    }

    /// Records the next symbol of the stream.
    pub fn record(&mut self, symbol: Symbol) -> Recorded {
        let Some((index, is_new)) = self.registry.admit(symbol) else {
            debug!(
                symbol,
                max_items = self.registry.capacity(),
                "maximum number of unique items reached, ignoring new item"
            );
            return Recorded::Dropped;
        };

        if let [Some(first), Some(second)] = self.history {
            *self
                .counts
                .entry(PairTransition {
                    first,
                    second,
                    to: symbol,
                })
                .or_insert(0) += 1;
            trace!(first, second, to = symbol, "pair transition recorded");
        }
        self.history = [self.history[1], Some(symbol)];

        if is_new {
            debug!(symbol, index, "new item registered");
            Recorded::New { index }
        } else {
            Recorded::Known { index }
        }
    }

    /// Records every symbol of `symbols` in order, returning how many were dropped.
    pub fn record_all(&mut self, symbols: impl IntoIterator<Item = Symbol>) -> usize {
        symbols
            .into_iter()
            .filter(|&s| self.record(s) == Recorded::Dropped)
            .count()
    }

    /// Forgets every symbol, count, and the history.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.counts.clear();
        self.history = [None, None];
    }

    /// Changes the maximum number of distinct symbols.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidCapacity`] if `max_items == 0`.
    pub fn set_capacity(&mut self, max_items: usize) -> Result<(), MarkovError> {
        if max_items == 0 {
            return Err(MarkovError::InvalidCapacity { max_items: 0 });
        }
        self.registry.set_capacity(max_items);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    pub fn size(&self) -> usize {
        self.registry.len()
    }

    /// Registered symbols in index order.
    pub fn symbols(&self) -> &[Symbol] {
        self.registry.symbols()
    }

    pub fn index_of(&self, symbol: Symbol) -> Option<usize> {
        self.registry.index_of(symbol)
    }

    /// The last two admitted symbols, oldest first.
    pub fn history(&self) -> [Option<Symbol>; 2] {
        self.history
    }

    /// Number of times `to` followed the pair `(first, second)`.
    pub fn count(&self, first: Symbol, second: Symbol, to: Symbol) -> u64 {
        self.counts
            .get(&PairTransition { first, second, to })
            .copied()
            .unwrap_or(0)
    }

    /// Iterates over all non-zero counts in triple order.
    pub fn transitions(&self) -> impl Iterator<Item = (PairTransition, u64)> + '_ {
        self.counts.iter().map(|(&t, &c)| (t, c))
    }

    /// Derives the next-symbol tensor from the current counts.
    ///
    /// A pair that was never followed by anything gets a uniform slice.
    pub fn build_matrix(&self) -> PairMatrix {
        let n = self.registry.len();
        if n == 0 {
            return PairMatrix::empty();
        }

        let mut probs = vec![0.0_f64; n * n * n];
        for (t, &c) in &self.counts {
            if let (Some(i), Some(j), Some(k)) = (
                self.index_of(t.first),
                self.index_of(t.second),
                self.index_of(t.to),
            ) {
                probs[(i * n + j) * n + k] = c as f64;
            }
        }
        normalize_counts(&mut probs, n);
        PairMatrix { n, probs }
    }
}
