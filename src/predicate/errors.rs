//! Predicate error types
//!
//! Error codes:
//! - PREDICATE_ARGUMENT_MISMATCH
//! - PREDICATE_MALFORMED_TEMPLATE
//! - PREDICATE_INVALID_VARIABLE
//! - PREDICATE_INVALID_CONFIG
//!
//! Builder rendering never returns these. They surface only where callers
//! hand in pre-rendered formats, variable names or configuration.

use thiserror::Error;

/// Result type for predicate operations
pub type PredicateResult<T> = Result<T, PredicateError>;

/// Predicate errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    /// Placeholder count differs from argument count
    #[error("Template has {placeholders} placeholders but {arguments} arguments")]
    ArgumentCountMismatch { placeholders: usize, arguments: usize },

    /// Placeholder bound to an argument of the wrong kind
    #[error("Placeholder {index} is {placeholder} but argument is {argument}")]
    ArgumentKindMismatch {
        index: usize,
        placeholder: &'static str,
        argument: &'static str,
    },

    /// Unknown `%` sequence in a template
    #[error("Malformed template at byte {offset}: {reason}")]
    MalformedTemplate { offset: usize, reason: String },

    /// Subquery variable is not an identifier
    #[error("Invalid subquery variable: '{0}'")]
    InvalidVariable(String),

    /// Configuration could not be parsed or validated
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PredicateError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PredicateError::ArgumentCountMismatch { .. }
            | PredicateError::ArgumentKindMismatch { .. } => "PREDICATE_ARGUMENT_MISMATCH",
            PredicateError::MalformedTemplate { .. } => "PREDICATE_MALFORMED_TEMPLATE",
            PredicateError::InvalidVariable(_) => "PREDICATE_INVALID_VARIABLE",
            PredicateError::InvalidConfig(_) => "PREDICATE_INVALID_CONFIG",
        }
    }

    /// Misalignment means a bound value would land on the wrong field.
    /// These indicate a contract violation rather than bad caller input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            PredicateError::ArgumentCountMismatch { .. }
                | PredicateError::ArgumentKindMismatch { .. }
        )
    }
}
