//! Markov chain state sampling over an authored transition matrix.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SamplerConfig;
use crate::error::MarkovError;
use crate::matrix::{RowFit, TransitionMatrix};

/// Walks a transition matrix, one state per trigger.
///
/// States are 1-indexed at this API (`1..=n`) and stored 0-indexed. The
/// sampler is unsized until a size or a full matrix is supplied; every
/// size-dependent operation returns [`MarkovError::UnsizedModel`] before
/// that. A rejected call never modifies the sampler.
#[derive(Debug, Clone)]
pub struct MarkovSampler {
    matrix: TransitionMatrix,
    current: usize,
    seed: u64,
    draws_since_seed: u64,
    rng: StdRng,
}

/// Read-only snapshot of a sampler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerInfo {
    /// 1-indexed current state.
    pub current_state: usize,
    /// Seed the generator was last seeded with.
    pub seed: u64,
    /// Number of states drawn since the last (re)seed.
    pub draws_since_seed: u64,
    /// The transition matrix, row by row.
    pub matrix: Vec<Vec<f64>>,
}

impl fmt::Display for SamplerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "current state: {}", self.current_state)?;
        writeln!(f, "seed: {}", self.seed)?;
        writeln!(f, "draws since seed: {}", self.draws_since_seed)?;
        write!(f, "transition matrix:")?;
        for row in &self.matrix {
            writeln!(f)?;
            let cells: Vec<String> = row.iter().map(|p| format!("{p:.6}")).collect();
            write!(f, "  {}", cells.join(" "))?;
        }
        Ok(())
    }
}

impl MarkovSampler {
    /// Creates an unsized sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Creates an unsized sampler with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            matrix: TransitionMatrix::empty(),
            current: 0,
            seed,
            draws_since_seed: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a sampler from a validated configuration.
    pub fn from_config(config: &SamplerConfig) -> Result<Self, MarkovError> {
        config.validate()?;
        let mut sampler = match config.seed() {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        if let Some(n) = config.n_states() {
            sampler.resize(n as i64)?;
            sampler.set_state(config.initial_state() as i64)?;
        }
        Ok(sampler)
    }

    /// Returns `true` once a size has been set.
    pub fn is_sized(&self) -> bool {
        !self.matrix.is_empty()
    }

    /// Number of states (0 while unsized).
    pub fn n_states(&self) -> usize {
        self.matrix.n_states()
    }

    /// The current transition matrix.
    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }

    /// The seed the generator was last seeded with.
    pub fn seed_value(&self) -> u64 {
        self.seed
    }

    /// The 1-indexed current state.
    pub fn current_state(&self) -> Result<usize, MarkovError> {
        self.require_sized()?;
        Ok(self.current + 1)
    }

    /// Resizes to an `n x n` uniform matrix and returns to state 1.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidDimension`] if `n <= 0`.
    pub fn resize(&mut self, n: i64) -> Result<(), MarkovError> {
        let size = usize::try_from(n)
            .ok()
            .filter(|&s| s > 0)
            .ok_or(MarkovError::InvalidDimension { n })?;
        self.matrix.resize_uniform(size)?;
        self.current = 0;
        info!(n = size, "matrix resized and initialized with equal probabilities");
        Ok(())
    }

    /// Replaces the whole matrix and returns to state 1.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidDimension`] for an unsized matrix, or
    /// [`MarkovError::InvalidProbability`] if it is not row-stochastic.
    pub fn load_matrix(&mut self, matrix: TransitionMatrix) -> Result<(), MarkovError> {
        if matrix.is_empty() {
            return Err(MarkovError::InvalidDimension { n: 0 });
        }
        matrix.validate()?;
        info!(n = matrix.n_states(), "transition matrix loaded");
        self.matrix = matrix;
        self.current = 0;
        Ok(())
    }

    /// Sets one row from 1-indexed `row`, normalizing it if needed.
    pub fn set_row(&mut self, row: i64, values: &[f64]) -> Result<RowFit, MarkovError> {
        self.require_sized()?;
        let n = self.matrix.n_states();
        if row < 1 || row as u64 > n as u64 {
            return Err(MarkovError::RowOutOfRange { row, n });
        }
        self.matrix.set_row((row - 1) as usize, values)
    }

    /// Refills every row with equal probabilities.
    pub fn reset(&mut self) -> Result<(), MarkovError> {
        self.matrix.reset_to_uniform()?;
        info!("reset transition matrix to equal probabilities");
        Ok(())
    }

    /// Sets the current state from a 1-indexed value in `1..=n`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::UnsizedModel`] or
    /// [`MarkovError::StateOutOfRange`]; the state is unchanged.
    pub fn set_state(&mut self, state: i64) -> Result<(), MarkovError> {
        self.require_sized()?;
        let n = self.matrix.n_states();
        if state < 1 || state as u64 > n as u64 {
            return Err(MarkovError::StateOutOfRange { state, n });
        }
        self.current = (state - 1) as usize;
        Ok(())
    }

    /// Reseeds the generator. The matrix and current state are untouched.
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = seed;
        self.draws_since_seed = 0;
        info!(seed, "generator reseeded");
    }

    /// Draws the next state, moves to it, and returns it 1-indexed.
    pub fn sample(&mut self) -> Result<usize, MarkovError> {
        self.require_sized()?;
        let next = self.matrix.sample(self.current, &mut self.rng);
        debug!(from = self.current + 1, to = next + 1, "state drawn");
        self.current = next;
        self.draws_since_seed += 1;
        Ok(next + 1)
    }

    /// Draws `steps` consecutive states.
    pub fn sample_n(&mut self, steps: usize) -> Result<Vec<usize>, MarkovError> {
        let mut out = vec![0; steps];
        self.sample_into(&mut out)?;
        Ok(out)
    }

    /// Draws one state per slot of `out`, in order.
    pub fn sample_into(&mut self, out: &mut [usize]) -> Result<(), MarkovError> {
        self.require_sized()?;
        for slot in out.iter_mut() {
            *slot = self.sample()?;
        }
        Ok(())
    }

    /// Snapshot of state, seed and matrix.
    pub fn info(&self) -> Result<SamplerInfo, MarkovError> {
        self.require_sized()?;
        Ok(SamplerInfo {
            current_state: self.current + 1,
            seed: self.seed,
            draws_since_seed: self.draws_since_seed,
            matrix: self.matrix.to_rows(),
        })
    }

    fn require_sized(&self) -> Result<(), MarkovError> {
        if self.matrix.is_empty() {
            Err(MarkovError::UnsizedModel)
        } else {
            Ok(())
        }
    }
}

impl Default for MarkovSampler {
    fn default() -> Self {
        Self::new()
    }
}
