//! Domain error types.

use crate::domain::parameter::Operator;

/// A parse error with position information for condition text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let offset = input
            .get(..self.position)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(self.position);
        let caret = " ".repeat(offset) + "^";
        format!("{input}\n{caret}\n{err}", err = self)
    }
}

/// Why a condition cannot take part in evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown parameter: {key:?}")]
    UnknownParameter { key: String },

    #[error("operator {operator} is not allowed for {key}")]
    OperatorNotAllowed { key: String, operator: Operator },

    #[error("value {value:?} is not a valid number for {key}")]
    ValueNotCoercible { key: String, value: String },
}

/// Field-free classification of a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    UnknownParameter,
    OperatorNotAllowed,
    ValueNotCoercible,
}

impl ValidationError {
    pub fn reason(&self) -> InvalidReason {
        match self {
            ValidationError::UnknownParameter { .. } => InvalidReason::UnknownParameter,
            ValidationError::OperatorNotAllowed { .. } => InvalidReason::OperatorNotAllowed,
            ValidationError::ValueNotCoercible { .. } => InvalidReason::ValueNotCoercible,
        }
    }
}

/// An edit that would break a screen's structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("a screen must keep at least one condition")]
    LastCondition,
}

/// Errors raised by screen editing operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScreenError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("condition index {index} out of range (screen has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("screen name must not be empty")]
    EmptyName,

    #[error("condition id {id} leaves no room for further conditions")]
    ConditionIdExhausted { id: u32 },
}

/// The upstream payload did not have the collection shape that was expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected payload shape: {message}")]
pub struct DataShapeError {
    pub message: String,
}

/// Top-level error type for screener.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Screen(#[from] ScreenError),

    #[error(transparent)]
    DataShape(#[from] DataShapeError),

    #[error(transparent)]
    ConditionParse(#[from] ParseError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("screen not found: {id}")]
    NotFound { id: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<InvariantViolation> for ScreenerError {
    fn from(err: InvariantViolation) -> Self {
        ScreenerError::Screen(err.into())
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::Json(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::Database { .. }
            | ScreenerError::DatabaseQuery { .. }
            | ScreenerError::NotFound { .. } => 3,
            ScreenerError::Validation(_)
            | ScreenerError::Screen(_)
            | ScreenerError::ConditionParse(_) => 4,
            ScreenerError::DataShape(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
