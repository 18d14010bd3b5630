use crate::core::StepId;
use crate::core::field_path::FieldPath;
use crate::core::value::Value;
use indexmap::IndexMap;

/// Notification produced by an engine operation. The UI layer decides how to
/// present it (toast, banner, focus change...).
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    FieldChanged {
        path: FieldPath,
    },
    ErrorShown {
        path: FieldPath,
        message: String,
    },
    ErrorCleared {
        path: FieldPath,
    },
    DerivedUpdated {
        path: FieldPath,
        value: Value,
    },
    DefaultApplied {
        source: String,
        path: FieldPath,
        value: Value,
    },
    StepChanged {
        from: usize,
        to: usize,
    },
    NavigationBlocked {
        step: StepId,
        errors: IndexMap<FieldPath, String>,
        step_errors: Vec<String>,
    },
    SubmissionStarted,
    Submitted {
        record_id: String,
    },
    SubmissionFailed {
        message: String,
    },
    SecondaryStepFailed {
        message: String,
    },
    ReferenceLoaded {
        source: String,
        count: usize,
    },
    ReferenceFailed {
        source: String,
        message: String,
    },
}
