//! # Errors
//!
//! Single error type shared by every stage of a microkinetic calculation: parsing of the
//! reaction network, evaluation of rate constants, steady-state solution, quasi-equilibrium
//! reduction and sensitivity analysis. Errors are always surfaced to the caller of the
//! solving entry point; partial results travel inside [`KineticsError::ConvergenceError`].

use thiserror::Error;

/// error taxonomy of the mean-field solver
#[derive(Debug, Error)]
pub enum KineticsError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Missing data: {0}")]
    MissingDataError(String),
    #[error(
        "Steady state not converged after {iterations} iterations (residual norm {residual_norm:e}): {reason}"
    )]
    ConvergenceError {
        reason: String,
        /// last (best) coverage estimate
        coverages: Vec<f64>,
        iterations: usize,
        residual_norm: f64,
    },
    #[error("Dimension mismatch: expected {expected}, found {found} ({context})")]
    DimensionMismatchError {
        expected: usize,
        found: usize,
        context: String,
    },
    #[error("Quasi-equilibrium reduction failed: {0}")]
    AlgebraicReductionError(String),
    #[error("Parameter out of range: {0}")]
    ParameterError(String),
    #[error("Cannot parse '{expression}': {message}")]
    ParseError { expression: String, message: String },
    #[error("Linear algebra failure: {0}")]
    LinearAlgebraError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl KineticsError {
    pub fn parse(expression: &str, message: impl Into<String>) -> Self {
        KineticsError::ParseError {
            expression: expression.to_string(),
            message: message.into(),
        }
    }

    pub fn dimension(expected: usize, found: usize, context: &str) -> Self {
        KineticsError::DimensionMismatchError {
            expected,
            found,
            context: context.to_string(),
        }
    }

    /// coverages of the partial result carried by a convergence failure
    pub fn partial_coverages(&self) -> Option<&[f64]> {
        match self {
            KineticsError::ConvergenceError { coverages, .. } => Some(coverages),
            _ => None,
        }
    }
}
