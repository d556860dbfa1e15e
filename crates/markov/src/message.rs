//! Selector + atom message layer for estimators and samplers.
//!
//! A [`Message`] is a selector name followed by numeric [`Atom`]s, e.g.
//! `set_matrix 2 0.1 0.9`. Each role decodes messages into a closed enum
//! ([`EstimatorMessage`], [`SamplerMessage`]) and reacts through the
//! [`Receiver`] trait. Receivers never fail: malformed or rejected messages
//! are logged and produce no output.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{error, warn};

use crate::error::{MarkovError, MessageError};
use crate::estimator::TransitionEstimator;
use crate::matrix::TransitionMatrix;
use crate::registry::Symbol;
use crate::sampler::{MarkovSampler, SamplerInfo};
use crate::second_order::{PairMatrix, SecondOrderEstimator};

/// A dynamically typed value received at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Atom {
    /// An integer atom.
    Int(i64),
    /// A floating-point atom.
    Float(f64),
}

impl Atom {
    /// The integer value, if this is an integer atom.
    pub fn as_int(self) -> Option<i64> {
        match self {
            Atom::Int(i) => Some(i),
            Atom::Float(_) => None,
        }
    }

    /// The numeric value as a float. Integers convert losslessly up to 2^53.
    pub fn as_f64(self) -> f64 {
        match self {
            Atom::Int(i) => i as f64,
            Atom::Float(x) => x,
        }
    }
}

impl From<i64> for Atom {
    fn from(i: i64) -> Self {
        Atom::Int(i)
    }
}

impl From<f64> for Atom {
    fn from(x: f64) -> Self {
        Atom::Float(x)
    }
}

impl FromStr for Atom {
    type Err = MessageError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Ok(i) = token.parse::<i64>() {
            return Ok(Atom::Int(i));
        }
        token
            .parse::<f64>()
            .map(Atom::Float)
            .map_err(|_| MessageError::BadAtom {
                token: token.to_string(),
            })
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Int(i) => write!(f, "{i}"),
            Atom::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A selector followed by its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Operation name.
    pub selector: String,
    /// Arguments in order.
    pub atoms: Vec<Atom>,
}

impl Message {
    /// Creates a message.
    pub fn new(selector: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self {
            selector: selector.into(),
            atoms,
        }
    }

    /// Creates a message with no arguments.
    pub fn bare(selector: impl Into<String>) -> Self {
        Self::new(selector, Vec::new())
    }

    fn arity(&self, expected: &'static str, ok: bool) -> Result<(), MessageError> {
        if ok {
            Ok(())
        } else {
            Err(MessageError::Arity {
                selector: self.selector.clone(),
                expected,
                got: self.atoms.len(),
            })
        }
    }

    fn int_at(&self, position: usize) -> Result<i64, MessageError> {
        let atom = self.atoms[position];
        atom.as_int().ok_or_else(|| MessageError::ExpectedInteger {
            selector: self.selector.clone(),
            position: position + 1,
            value: atom.to_string(),
        })
    }

    fn single_int(&self) -> Result<i64, MessageError> {
        self.arity("1", self.atoms.len() == 1)?;
        self.int_at(0)
    }

    fn nothing(&self) -> Result<(), MessageError> {
        self.arity("0", self.atoms.is_empty())
    }
}

impl FromStr for Message {
    type Err = MessageError;

    /// Parses a whitespace-separated line.
    ///
    /// A line that starts with a number is an `int` (or `float`) message,
    /// the same way a bare number arrives at an inlet.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(MessageError::UnknownSelector {
                selector: String::new(),
            });
        };
        let rest = tokens.map(str::parse).collect::<Result<Vec<Atom>, _>>()?;
        match head.parse::<Atom>() {
            Ok(first) => {
                let selector = match first {
                    Atom::Int(_) => "int",
                    Atom::Float(_) => "float",
                };
                let mut atoms = vec![first];
                atoms.extend(rest);
                Ok(Message::new(selector, atoms))
            }
            Err(_) => Ok(Message::new(head, rest)),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        for atom in &self.atoms {
            write!(f, " {atom}")?;
        }
        Ok(())
    }
}

/// Messages understood by a [`TransitionEstimator`].
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorMessage {
    /// `int <symbol>`: record one symbol.
    Record(i64),
    /// `clear`: forget everything.
    Clear,
    /// `bang`: emit the derived matrix row by row.
    Bang,
    /// `size`: emit the number of distinct symbols.
    Size,
    /// `max_items <n>`: change the capacity.
    MaxItems(i64),
    /// `symbols`: emit the index to symbol table.
    Symbols,
}

impl TryFrom<&Message> for EstimatorMessage {
    type Error = MessageError;

    fn try_from(msg: &Message) -> Result<Self, Self::Error> {
        match msg.selector.as_str() {
            "int" => msg.single_int().map(EstimatorMessage::Record),
            "clear" => msg.nothing().map(|()| EstimatorMessage::Clear),
            "bang" => msg.nothing().map(|()| EstimatorMessage::Bang),
            "size" => msg.nothing().map(|()| EstimatorMessage::Size),
            "max_items" => msg.single_int().map(EstimatorMessage::MaxItems),
            "symbols" => msg.nothing().map(|()| EstimatorMessage::Symbols),
            other => Err(MessageError::UnknownSelector {
                selector: other.to_string(),
            }),
        }
    }
}

/// Messages understood by a [`MarkovSampler`].
#[derive(Debug, Clone, PartialEq)]
pub enum SamplerMessage {
    /// `size <n>`: resize to a uniform `n x n` matrix.
    Size(i64),
    /// `set_matrix <row> <p1> .. <pn>`: set one 1-indexed row.
    SetMatrix {
        /// 1-indexed row.
        row: i64,
        /// Row values.
        values: Vec<f64>,
    },
    /// `reset`: refill rows uniformly.
    Reset,
    /// `int <k>`: set the 1-indexed current state.
    State(i64),
    /// `seed <s>`: reseed the generator.
    Seed(i64),
    /// `bang`: draw the next state.
    Bang,
    /// `info`: emit a snapshot.
    Info,
}

impl TryFrom<&Message> for SamplerMessage {
    type Error = MessageError;

    fn try_from(msg: &Message) -> Result<Self, Self::Error> {
        match msg.selector.as_str() {
            "size" => msg.single_int().map(SamplerMessage::Size),
            "set_matrix" => {
                msg.arity("at least 2", msg.atoms.len() >= 2)?;
                let row = msg.int_at(0)?;
                let values = msg.atoms[1..].iter().map(|a| a.as_f64()).collect();
                Ok(SamplerMessage::SetMatrix { row, values })
            }
            "reset" => msg.nothing().map(|()| SamplerMessage::Reset),
            "int" => msg.single_int().map(SamplerMessage::State),
            "seed" => msg.single_int().map(SamplerMessage::Seed),
            "bang" => msg.nothing().map(|()| SamplerMessage::Bang),
            "info" => msg.nothing().map(|()| SamplerMessage::Info),
            other => Err(MessageError::UnknownSelector {
                selector: other.to_string(),
            }),
        }
    }
}

/// Something a receiver sends out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Output {
    /// One row of a derived matrix, tagged with its 1-indexed row number.
    Row {
        /// 1-indexed row.
        row: usize,
        /// Transition probabilities.
        probs: Vec<f64>,
    },
    /// One next-symbol distribution of a second-order estimate, tagged with
    /// the 1-indexed conditioning pair.
    PairRow {
        /// 1-indexed older symbol of the pair.
        first: usize,
        /// 1-indexed newer symbol of the pair.
        second: usize,
        /// Next-symbol probabilities.
        probs: Vec<f64>,
    },
    /// One entry of the index to symbol table.
    Symbol {
        /// 1-indexed row.
        index: usize,
        /// The symbol labelling that row.
        symbol: Symbol,
    },
    /// Number of distinct symbols.
    Size(usize),
    /// A 1-indexed state.
    State(usize),
    /// A sampler snapshot.
    Info(SamplerInfo),
}

impl Output {
    /// The `set_matrix` message equivalent to a row output.
    ///
    /// Pair rows carry both indices: `set_matrix i j p1 .. pn`. Returns
    /// `None` for every other output.
    pub fn to_message(&self) -> Option<Message> {
        let (indices, probs) = match self {
            Output::Row { row, probs } => (vec![*row], probs),
            Output::PairRow {
                first,
                second,
                probs,
            } => (vec![*first, *second], probs),
            _ => return None,
        };
        let atoms = indices
            .into_iter()
            .map(|i| Atom::Int(i as i64))
            .chain(probs.iter().map(|&p| Atom::Float(p)))
            .collect();
        Some(Message::new("set_matrix", atoms))
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Row { .. } | Output::PairRow { .. } => match self.to_message() {
                Some(msg) => write!(f, "{msg}"),
                None => Ok(()),
            },
            Output::Symbol { index, symbol } => write!(f, "{index} {symbol}"),
            Output::Size(n) => write!(f, "{n}"),
            Output::State(k) => write!(f, "{k}"),
            Output::Info(info) => write!(f, "{info}"),
        }
    }
}

/// Converts a matrix into tagged row outputs.
pub fn matrix_rows(matrix: &TransitionMatrix) -> Vec<Output> {
    matrix
        .rows()
        .enumerate()
        .map(|(i, probs)| Output::Row {
            row: i + 1,
            probs: probs.to_vec(),
        })
        .collect()
}

/// Converts a second-order tensor into pair-tagged row outputs.
pub fn pair_matrix_rows(matrix: &PairMatrix) -> Vec<Output> {
    matrix
        .rows()
        .map(|((i, j), probs)| Output::PairRow {
            first: i + 1,
            second: j + 1,
            probs: probs.to_vec(),
        })
        .collect()
}

/// Lists which symbol each 1-indexed row stands for.
pub fn symbol_table(symbols: &[Symbol]) -> Vec<Output> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, &symbol)| Output::Symbol {
            index: i + 1,
            symbol,
        })
        .collect()
}

/// A message-driven object.
pub trait Receiver {
    /// Reacts to one message. Rejections are logged, never returned.
    fn receive(&mut self, msg: &Message) -> Vec<Output>;
}

impl TransitionEstimator {
    /// Applies a decoded message.
    pub fn apply(&mut self, msg: EstimatorMessage) -> Result<Vec<Output>, MarkovError> {
        match msg {
            EstimatorMessage::Record(symbol) => {
                self.record(symbol);
                Ok(Vec::new())
            }
            EstimatorMessage::Clear => {
                self.clear();
                Ok(Vec::new())
            }
            EstimatorMessage::Bang => {
                let matrix = self.build_matrix();
                if matrix.is_empty() {
                    warn!("no data to analyze, matrix is empty");
                }
                Ok(matrix_rows(&matrix))
            }
            EstimatorMessage::Size => Ok(vec![Output::Size(self.size())]),
            EstimatorMessage::MaxItems(n) => {
                let max_items = usize::try_from(n)
                    .map_err(|_| MarkovError::InvalidCapacity { max_items: n })?;
                self.set_capacity(max_items)?;
                Ok(Vec::new())
            }
            EstimatorMessage::Symbols => Ok(symbol_table(self.symbols())),
        }
    }
}

impl Receiver for TransitionEstimator {
    fn receive(&mut self, msg: &Message) -> Vec<Output> {
        let result = EstimatorMessage::try_from(msg)
            .map_err(MarkovError::from)
            .and_then(|decoded| self.apply(decoded));
        result.unwrap_or_else(|e| {
            error!(message = %msg, "{e}");
            Vec::new()
        })
    }
}

impl SecondOrderEstimator {
    /// Applies a decoded message. `bang` emits one pair row per `(i, j)`.
    pub fn apply(&mut self, msg: EstimatorMessage) -> Result<Vec<Output>, MarkovError> {
        match msg {
            EstimatorMessage::Record(symbol) => {
                self.record(symbol);
                Ok(Vec::new())
            }
            EstimatorMessage::Clear => {
                self.clear();
                Ok(Vec::new())
            }
            EstimatorMessage::Bang => {
                let matrix = self.build_matrix();
                if matrix.is_empty() {
                    warn!("no data to analyze, matrix is empty");
                }
                Ok(pair_matrix_rows(&matrix))
            }
            EstimatorMessage::Size => Ok(vec![Output::Size(self.size())]),
            EstimatorMessage::MaxItems(n) => {
                let max_items = usize::try_from(n)
                    .map_err(|_| MarkovError::InvalidCapacity { max_items: n })?;
                self.set_capacity(max_items)?;
                Ok(Vec::new())
            }
            EstimatorMessage::Symbols => Ok(symbol_table(self.symbols())),
        }
    }
}

impl Receiver for SecondOrderEstimator {
    fn receive(&mut self, msg: &Message) -> Vec<Output> {
        let result = EstimatorMessage::try_from(msg)
            .map_err(MarkovError::from)
            .and_then(|decoded| self.apply(decoded));
        result.unwrap_or_else(|e| {
            error!(message = %msg, "{e}");
            Vec::new()
        })
    }
}

impl MarkovSampler {
    /// Applies a decoded message.
    pub fn apply(&mut self, msg: SamplerMessage) -> Result<Vec<Output>, MarkovError> {
        match msg {
            SamplerMessage::Size(n) => {
                self.resize(n)?;
                Ok(Vec::new())
            }
            SamplerMessage::SetMatrix { row, values } => {
                self.set_row(row, &values)?;
                Ok(Vec::new())
            }
            SamplerMessage::Reset => {
                self.reset()?;
                Ok(Vec::new())
            }
            SamplerMessage::State(k) => {
                self.set_state(k)?;
                Ok(Vec::new())
            }
            SamplerMessage::Seed(s) => {
                // Negative seeds keep their bit pattern.
                self.seed(s as u64);
                Ok(Vec::new())
            }
            SamplerMessage::Bang => Ok(vec![Output::State(self.sample()?)]),
            SamplerMessage::Info => Ok(vec![Output::Info(self.info()?)]),
        }
    }
}

impl Receiver for MarkovSampler {
    fn receive(&mut self, msg: &Message) -> Vec<Output> {
        let result = SamplerMessage::try_from(msg)
            .map_err(MarkovError::from)
            .and_then(|decoded| self.apply(decoded));
        result.unwrap_or_else(|e| {
            error!(message = %msg, "{e}");
            Vec::new()
        })
    }
}
