//! Transition counting and matrix estimation from a symbol stream.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::EstimatorConfig;
use crate::error::MarkovError;
use crate::matrix::TransitionMatrix;
use crate::registry::{Symbol, SymbolRegistry};

/// An ordered (from, to) pair of symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Transition {
    /// Symbol the chain moved out of.
    pub from: Symbol,
    /// Symbol the chain moved into.
    pub to: Symbol,
}

/// What [`TransitionEstimator::record`] did with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// The symbol was registered at `index`.
    New {
        /// Registry index of the symbol.
        index: usize,
    },
    /// The symbol was already registered at `index`.
    Known {
        /// Registry index of the symbol.
        index: usize,
    },
    /// The registry is full and the symbol was ignored.
    Dropped,
}

/// Learns a transition matrix from an observed sequence of symbols.
///
/// Symbols are registered in order of first appearance (up to the configured
/// capacity) and every consecutive pair of admitted symbols increments a
/// transition count. The matrix is derived from the counts on request.
#[derive(Debug, Clone, Default)]
pub struct TransitionEstimator {
    registry: SymbolRegistry,
    counts: BTreeMap<Transition, u64>,
    previous: Option<Symbol>,
}

impl TransitionEstimator {
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

        if let Some(from) = self.previous {
            *self
                .counts
                .entry(Transition { from, to: symbol })
                .or_insert(0) += 1;
            trace!(from, to = symbol, "transition recorded");
        }
        self.previous = Some(symbol);

        if is_new {
            debug!(symbol, index, "new item registered");
            Recorded::New { index }
        } else {
            Recorded::Known { index }
        }
    }

    /// Records every symbol of `symbols` in order.
    ///
    /// Returns the number of symbols that were dropped.
    pub fn record_all(&mut self, symbols: impl IntoIterator<Item = Symbol>) -> usize {
        symbols
            .into_iter()
            .filter(|&s| self.record(s) == Recorded::Dropped)
            .count()
    }

    /// Forgets every symbol, count, and the previous-symbol marker.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.counts.clear();
        self.previous = None;
    }

    /// Changes the maximum number of distinct symbols.
    ///
    /// Lowering the capacity below the current size keeps the registered
    /// symbols and only stops new ones.
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

    /// Maximum number of distinct symbols.
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Number of distinct symbols registered.
    pub fn size(&self) -> usize {
        self.registry.len()
    }

    /// Registered symbols in matrix index order.
    pub fn symbols(&self) -> &[Symbol] {
        self.registry.symbols()
    }

    /// Matrix index of `symbol`, if registered.
    pub fn index_of(&self, symbol: Symbol) -> Option<usize> {
        self.registry.index_of(symbol)
    }

    /// The last admitted symbol since the most recent clear.
    pub fn previous(&self) -> Option<Symbol> {
        self.previous
    }

    /// Number of observed `from -> to` transitions.
    pub fn count(&self, from: Symbol, to: Symbol) -> u64 {
        self.counts
            .get(&Transition { from, to })
            .copied()
            .unwrap_or(0)
    }

    /// Iterates over all non-zero transition counts in pair order.
    pub fn transitions(&self) -> impl Iterator<Item = (Transition, u64)> + '_ {
        self.counts.iter().map(|(&t, &c)| (t, c))
    }

    /// Derives the transition matrix from the current counts.
    ///
    /// Row `i` holds the observed frequencies of transitions out of symbol
    /// `i`. A symbol with no outgoing transition gets a uniform row. Returns
    /// the unsized matrix when nothing has been recorded.
    pub fn build_matrix(&self) -> TransitionMatrix {
        let n = self.registry.len();
        if n == 0 {
            return TransitionMatrix::empty();
        }

        let mut probs = vec![0.0_f64; n * n];
        for (t, &c) in &self.counts {
            // Both ends of a counted pair were admitted, so both are registered.
            if let (Some(i), Some(j)) = (self.index_of(t.from), self.index_of(t.to)) {
                probs[i * n + j] = c as f64;
            }
        }

        normalize_counts(&mut probs, n);
        TransitionMatrix::from_raw(n, probs)
    }
}

/// Turns consecutive length-`n` runs of counts into frequencies in place.
///
/// A run with no counts becomes uniform.
pub(crate) fn normalize_counts(probs: &mut [f64], n: usize) {
    let uniform = 1.0 / n as f64;
    for row in probs.chunks_exact_mut(n) {
        let row_sum: f64 = row.iter().sum();
        if row_sum > 0.0 {
            for p in row.iter_mut() {
                *p /= row_sum;
            }
        } else {
            row.fill(uniform);
        }
    }
}
