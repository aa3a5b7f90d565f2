//! Error type shared by every stage of the scoring pipeline.
//!
//! Input-contract violations fail fast. [`ScoreError::NotConverged`] is the one
//! recoverable variant: it describes a single agent's greedy policy and the
//! orchestrator decides whether to retrain or surface it.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("matrix has no rows")]
    EmptyMatrix,

    #[error("matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("matrix entry ({row}, {col}) is not finite: {value}")]
    NonFiniteEntry { row: usize, col: usize, value: f64 },

    #[error("dimension mismatch: expected {expected}x{expected}, found {found}x{found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("unknown state label '{0}'")]
    UnknownState(String),

    #[error("state label '{0}' appears more than once")]
    DuplicateState(String),

    #[error("cannot average an empty table set")]
    EmptyTableSet,

    #[error("table {index} is {found}x{found}, expected {expected}x{expected}")]
    TableShape {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("distance requires non-empty vectors")]
    EmptyVectors,

    #[error("vector lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Minkowski order must be a finite positive number, got {0}")]
    InvalidOrder(f64),

    #[error("policy did not converge to target '{target}' within {steps} steps (path: {path:?})")]
    NotConverged {
        target: String,
        steps: usize,
        path: Vec<String>,
    },

    #[error("scoring needs at least two target states, got {0}")]
    TooFewTargets(usize),

    #[error("no depth weight configured for tier {tier} (state '{label}')")]
    MissingTierWeight { tier: usize, label: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScoreError {
    /// True for per-agent conditions that a retrain may clear.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScoreError::NotConverged { .. })
    }
}
