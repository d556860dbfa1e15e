//! Configuration for transition estimation and sampling.

use crate::error::MarkovError;

/// Default maximum number of distinct symbols an estimator tracks.
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Configuration for a [`TransitionEstimator`](crate::TransitionEstimator).
///
/// # Example
///
/// ```
/// use alea_markov::EstimatorConfig;
///
/// let config = EstimatorConfig::new().with_max_items(64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct EstimatorConfig {
    max_items: usize,
}

impl EstimatorConfig {
    /// Creates a new configuration with `max_items = 1000`.
    pub fn new() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Sets the maximum number of distinct symbols.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Returns the maximum number of distinct symbols.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), MarkovError> {
        if self.max_items == 0 {
            return Err(MarkovError::InvalidCapacity { max_items: 0 });
        }
        Ok(())
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a [`MarkovSampler`](crate::MarkovSampler).
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use alea_markov::SamplerConfig;
///
/// let config = SamplerConfig::new()
///     .with_n_states(3)
///     .with_seed(42)
///     .with_initial_state(2);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct SamplerConfig {
    n_states: Option<usize>,
    seed: Option<u64>,
    initial_state: usize,
}

impl SamplerConfig {
    /// Creates a new configuration with defaults.
    ///
    /// Defaults: unsized, seeded from OS entropy, initial state 1.
    pub fn new() -> Self {
        Self {
            n_states: None,
            seed: None,
            initial_state: 1,
        }
    }

    /// Sets the initial number of states (uniform matrix).
    pub fn with_n_states(mut self, n: usize) -> Self {
        self.n_states = Some(n);
        self
    }

    /// Sets a fixed RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the 1-indexed initial state.
    pub fn with_initial_state(mut self, state: usize) -> Self {
        self.initial_state = state;
        self
    }

    // --- Accessors ---

    /// Returns the initial number of states, if any.
    pub fn n_states(&self) -> Option<usize> {
        self.n_states
    }

    /// Returns the fixed RNG seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the 1-indexed initial state.
    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    /// Validates this configuration.
    ///
    /// `n_states` must be positive when set, and `initial_state` must be a
    /// valid 1-indexed state of that size.
    pub fn validate(&self) -> Result<(), MarkovError> {
        if let Some(n) = self.n_states {
            if n == 0 {
                return Err(MarkovError::InvalidDimension { n: 0 });
            }
            if !(1..=n).contains(&self.initial_state) {
                return Err(MarkovError::StateOutOfRange {
                    state: self.initial_state as i64,
                    n,
                });
            }
        } else if self.initial_state == 0 {
            return Err(MarkovError::StateOutOfRange { state: 0, n: 0 });
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}
