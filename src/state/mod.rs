pub mod derive;
pub mod flow;
pub mod form;
pub mod reference;
pub mod step;
pub mod store;
pub mod validation;

pub use derive::DerivedField;
pub use flow::{NavigationState, WizardSpec, WizardSpecBuilder};
pub use form::FormState;
pub use reference::{ReferenceDefault, ReferenceItem, ReferenceState};
pub use step::{FieldRule, Step, StepBuilder, StepStatus};
pub use store::ValueStore;
pub use validation::{
    StepValidation, StepValidator, ValidationContext, ValidationIssue, ValidationMode,
    ValidationTarget,
};
