//! Compiler error types.
//!
//! Every variant is a permanent input or configuration error. Callers fix the
//! input rather than retry.

use crate::cohort::CohortError;
use crate::model::Shape;

/// Errors that can occur during compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A fragment contains a denylisted statement keyword.
    #[error("Illegal SQL: '{keyword}' is not allowed in {source_name}")]
    IllegalSql {
        keyword: String,
        source_name: String,
    },

    #[error("Query has no inclusion panels")]
    EmptyInclusionSet,

    #[error("No date field or schema is registered for shape {0}")]
    UnsupportedShape(Shape),

    #[error("Missing scope: {0}")]
    MissingScope(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Restricting PHI left nothing to project.
    #[error("No fields of {0} are visible without identified access")]
    EmptyProjection(String),

    #[error("Invalid panel {index}: {reason}")]
    InvalidPanel { index: usize, reason: String },

    #[error("Cohort preparation failed: {0}")]
    Prepare(#[from] CohortError),
}

/// Result type for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;
