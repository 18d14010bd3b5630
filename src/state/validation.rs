use crate::core::field_path::{FieldPath, IntoFieldPath};
use crate::core::value::Value;
use crate::core::StepId;
use crate::state::form::FormState;
use crate::state::step::Step;
use crate::state::store::ValueStore;
use crate::validators::run_validators;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a step's rules are applied.
///
/// `Display` only reports touched fields and is used for inline feedback
/// while editing. `Navigation` applies every rule and gates leaving a step or
/// submitting the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Display,
    Navigation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationTarget {
    Field(FieldPath),
    Step,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub target: ValidationTarget,
    pub message: String,
}

impl ValidationIssue {
    pub fn field(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            target: ValidationTarget::Field(path),
            message: message.into(),
        }
    }

    pub fn step(message: impl Into<String>) -> Self {
        Self {
            target: ValidationTarget::Step,
            message: message.into(),
        }
    }
}

/// Read-only view handed to step-level validators.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    step_id: &'a StepId,
    values: &'a ValueStore,
}

impl<'a> ValidationContext<'a> {
    pub fn new(step_id: &'a StepId, values: &'a ValueStore) -> Self {
        Self { step_id, values }
    }

    pub fn step_id(&self) -> &StepId {
        self.step_id
    }

    pub fn value(&self, path: impl IntoFieldPath) -> Option<&'a Value> {
        let path = path.into_field_path().ok()?;
        self.values.get(&path)
    }

    pub fn text(&self, path: impl IntoFieldPath) -> Option<&'a str> {
        self.value(path).and_then(Value::as_text)
    }

    pub fn number(&self, path: impl IntoFieldPath) -> Option<f64> {
        self.value(path).and_then(Value::coerce_number)
    }

    pub fn bool_value(&self, path: impl IntoFieldPath) -> Option<bool> {
        self.value(path).and_then(Value::as_bool)
    }

    pub fn is_empty(&self, path: impl IntoFieldPath) -> bool {
        self.value(path).is_none_or(Value::is_empty)
    }
}

pub type StepValidator = Box<dyn Fn(&ValidationContext<'_>) -> Vec<ValidationIssue> + Send + Sync>;

/// Outcome of validating one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepValidation {
    pub errors: IndexMap<FieldPath, String>,
    pub step_errors: Vec<String>,
    pub is_valid: bool,
}

/// Applies the rules of `step` to `form` without touching it.
pub fn evaluate_step(step: &Step, form: &FormState, mode: ValidationMode) -> StepValidation {
    let mut errors = IndexMap::<FieldPath, String>::new();
    for rule in &step.rules {
        let value = form.values().value_or_none(&rule.path);
        if let Err(message) = run_validators(&rule.validators, &value) {
            errors.entry(rule.path.clone()).or_insert(message);
        }
    }

    let mut step_errors = Vec::new();
    if !step.validators.is_empty() {
        let ctx = ValidationContext::new(&step.id, form.values());
        for issue in step.validators.iter().flat_map(|validator| validator(&ctx)) {
            match issue.target {
                ValidationTarget::Field(path) => {
                    errors.entry(path).or_insert(issue.message);
                }
                ValidationTarget::Step => step_errors.push(issue.message),
            }
        }
    }

    if mode == ValidationMode::Display {
        errors.retain(|path, _| form.is_touched(path));
        step_errors.clear();
    }

    let is_valid = errors.is_empty() && step_errors.is_empty();
    StepValidation {
        errors,
        step_errors,
        is_valid,
    }
}
