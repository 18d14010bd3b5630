pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod state;
pub mod validators;

pub use config::WizardDefinition;
pub use crate::core::{FieldPath, FieldPathError, FileRef, IntoFieldPath, StepId, Value};
pub use engine::{
    SubmitMode, SubmitRejected, Submission, SubmittedRecord, WizardEngine, WizardEvent,
    WizardPhase,
};
pub use error::{ReferenceError, SubmitError, WizardError};
pub use runtime::{PhotoUploader, ReferenceDataProvider, RemoteSubmitter, WizardSession};
pub use state::{
    DerivedField, ReferenceDefault, ReferenceItem, ReferenceState, Step, StepStatus,
    StepValidation, ValidationIssue, ValidationMode, WizardSpec,
};
