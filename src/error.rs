//! Error taxonomy shared by every calculation
//!
//! Every failure is returned as a value. The dispatcher renders the `Display`
//! text into the `{"error": ...}` envelope; Rust callers can match on the
//! variant or on [`ErrorKind`].

use thiserror::Error;

/// Result type for all calculations
pub type CalcResult<T> = Result<T, CalcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Parallel `values`/`dates` arrays of unequal length
    #[error("values and dates must be the same length (got {values} values and {dates} dates)")]
    ShapeMismatch { values: usize, dates: usize },

    /// Dates not in non-decreasing order
    #[error("dates must be in chronological order")]
    ChronologyViolation,

    /// Missing required field or wrong field type/shape
    #[error("{0}")]
    Validation(String),

    /// Structurally valid input the formula cannot accept
    #[error("{0}")]
    DomainPrecondition(String),

    /// Root finder exhausted its iteration budget
    #[error("Failed to converge after {iterations} iterations (last estimate: {last_estimate})")]
    NonConvergence { iterations: u32, last_estimate: f64 },
}

/// Coarse category of a [`CalcError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ShapeMismatch,
    ChronologyViolation,
    StructuralValidation,
    DomainPrecondition,
    NumericalNonConvergence,
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            CalcError::ChronologyViolation => ErrorKind::ChronologyViolation,
            CalcError::Validation(_) => ErrorKind::StructuralValidation,
            CalcError::DomainPrecondition(_) => ErrorKind::DomainPrecondition,
            CalcError::NonConvergence { .. } => ErrorKind::NumericalNonConvergence,
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        CalcError::DomainPrecondition(message.into())
    }
}
