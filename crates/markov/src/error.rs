//! Error types for the alea-markov crate.

/// Error type for all fallible operations in the alea-markov crate.
///
/// Every error is recoverable: the operation that produced it leaves the
/// estimator or sampler exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkovError {
    /// Returned when a registry capacity is zero or negative.
    #[error("invalid capacity: {max_items} (must be > 0)")]
    InvalidCapacity {
        /// The rejected capacity.
        max_items: i64,
    },

    /// Returned when a matrix dimension is zero or negative.
    #[error("invalid dimension: {n} (must be > 0)")]
    InvalidDimension {
        /// The rejected dimension.
        n: i64,
    },

    /// Returned when an operation needs a sized model and none exists yet.
    #[error("matrix size not set")]
    UnsizedModel,

    /// Returned when a row index is outside `1..=n`.
    #[error("invalid row {row}: must be between 1 and {n}")]
    RowOutOfRange {
        /// The 1-indexed row requested.
        row: i64,
        /// Number of rows in the matrix.
        n: usize,
    },

    /// Returned when a row has the wrong number of entries.
    #[error("expected {expected} values for row {row}, got {got}")]
    RowLengthMismatch {
        /// The 1-indexed row being set.
        row: usize,
        /// Required number of entries.
        expected: usize,
        /// Supplied number of entries.
        got: usize,
    },

    /// Returned when a row cannot be rescaled into a probability distribution.
    #[error("row {row} cannot be normalized: {reason}")]
    InvalidRow {
        /// The 1-indexed row.
        row: usize,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a 1-indexed state is outside `1..=n`.
    #[error("invalid state {state}: must be between 1 and {n}")]
    StateOutOfRange {
        /// The rejected 1-indexed state.
        state: i64,
        /// Number of states.
        n: usize,
    },

    /// Returned when a loaded matrix is not square.
    #[error("matrix is not square: {rows} rows, row {row} has {len} entries")]
    NonSquareMatrix {
        /// Number of rows supplied.
        rows: usize,
        /// The first offending 1-indexed row.
        row: usize,
        /// Length of that row.
        len: usize,
    },

    /// Returned by validation when a matrix is not row-stochastic.
    #[error("invalid probability: {reason}")]
    InvalidProbability {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a boundary message cannot be decoded.
    #[error("malformed message: {0}")]
    Message(#[from] MessageError),
}

/// Decoding failures for selector + atom messages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    /// The selector is not understood by the receiver.
    #[error("unknown selector '{selector}'")]
    UnknownSelector {
        /// The selector received.
        selector: String,
    },

    /// The message carried the wrong number of atoms.
    #[error("'{selector}' expects {expected} argument(s), got {got}")]
    Arity {
        /// The selector received.
        selector: String,
        /// Human-readable expected arity.
        expected: &'static str,
        /// Number of atoms received.
        got: usize,
    },

    /// An atom that must be an integer was not.
    #[error("'{selector}' argument {position} must be an integer, got {value}")]
    ExpectedInteger {
        /// The selector received.
        selector: String,
        /// 1-indexed atom position.
        position: usize,
        /// Display form of the offending atom.
        value: String,
    },

    /// A text token could not be read as an atom.
    #[error("cannot parse '{token}' as a number")]
    BadAtom {
        /// The offending token.
        token: String,
    },
}
