//! Discrete-state Markov chains: estimate a transition matrix from a symbol
//! stream, then walk it to generate states.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │  estimator    │────▶│    matrix      │────▶│     sampler      │
//!  │  (count)      │     │  (normalize)   │     │  (draw states)   │
//!  └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! The sampler also accepts matrices authored row by row, and both roles
//! can be driven by selector + atom [`Message`]s. A
//! [`SecondOrderEstimator`] conditions on the last two symbols instead of
//! one.
//!
//! # Quick start
//!
//! ```rust
//! use alea_markov::{MarkovSampler, TransitionEstimator};
//!
//! let mut estimator = TransitionEstimator::new();
//! estimator.record_all([1, 2, 1, 3, 1, 2]);
//! let matrix = estimator.build_matrix();
//! assert_eq!(matrix.n_states(), 3);
//!
//! let mut sampler = MarkovSampler::with_seed(42);
//! sampler.load_matrix(matrix).unwrap();
//! let next = sampler.sample().unwrap();
//! assert!((1..=3).contains(&next));
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod matrix;
pub mod message;
pub mod registry;
pub mod sampler;
pub mod second_order;

pub use config::{EstimatorConfig, SamplerConfig};
pub use error::{MarkovError, MessageError};
pub use estimator::{Recorded, Transition, TransitionEstimator};
pub use matrix::{RowFit, TransitionMatrix};
pub use message::{Atom, EstimatorMessage, Message, Output, Receiver, SamplerMessage};
pub use registry::{Symbol, SymbolRegistry};
pub use sampler::{MarkovSampler, SamplerInfo};
pub use second_order::{PairMatrix, PairTransition, SecondOrderEstimator};
