use crate::core::field_path::FieldPathError;
use thiserror::Error;

/// Configuration and usage errors. Field validation failures are never
/// reported through this type; they are returned as data.
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("wizard must contain at least one step")]
    EmptySpec,

    #[error("duplicate step id '{0}'")]
    DuplicateStep(String),

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("invalid field path '{path}' in step '{step}': {source}")]
    InvalidField {
        step: String,
        path: String,
        #[source]
        source: FieldPathError,
    },

    #[error("invalid field path: {0}")]
    InvalidPath(#[from] FieldPathError),

    #[error("invalid pattern for '{field}': {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("derived field '{0}' has no inputs")]
    EmptyDerivation(String),

    #[error("failed to read wizard definition: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse wizard definition: {0}")]
    Definition(#[from] serde_yaml::Error),
}

/// Failure reported by a remote collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The backend understood the request and refused it.
    #[error("{0}")]
    Rejected(String),

    #[error("network error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("failed to load reference data: {0}")]
    Load(String),

    #[error("unexpected reference data shape: {0}")]
    Shape(String),
}
