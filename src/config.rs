//! YAML description of a wizard, compiled into a [`WizardSpec`].
//!
//! ```yaml
//! steps:
//!   - id: personal
//!     title: Personal details
//!     fields:
//!       - path: first_name
//!         required: true
//!         message: First name is required
//! derived:
//!   - target: amount_due
//!     inputs: [monthly_fee, number_of_months]
//! ```

use crate::error::WizardError;
use crate::state::derive::DerivedField;
use crate::state::flow::WizardSpec;
use crate::state::reference::ReferenceDefault;
use crate::state::step::Step;
use crate::validators::{self, Validator};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WizardDefinition {
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub derived: Vec<DerivedDefinition>,
    #[serde(default)]
    pub reference_defaults: Vec<ReferenceDefaultDefinition>,
    #[serde(default)]
    pub photo_field: Option<String>,
    /// Set when the wizard edits an existing record.
    #[serde(default)]
    pub record_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub path: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub number: bool,
    #[serde(default)]
    pub min: Option<f64>,
    /// Replaces the built-in message of every rule on this field.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeriveOp {
    #[default]
    Product,
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedDefinition {
    pub target: String,
    pub inputs: Vec<String>,
    #[serde(default)]
    pub op: DeriveOp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDefaultDefinition {
    pub source: String,
    pub target: String,
    pub attribute: String,
    #[serde(default)]
    pub selector: Option<String>,
}

impl WizardDefinition {
    pub fn from_yaml_str(input: &str) -> Result<Self, WizardError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, WizardError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Checks the whole definition and builds the runtime spec.
    pub fn into_spec(self) -> Result<WizardSpec, WizardError> {
        let mut builder = WizardSpec::builder();

        for step in self.steps {
            let mut step_builder = Step::builder(step.id, step.title);
            if let Some(description) = step.description {
                step_builder = step_builder.description(description);
            }
            for field in step.fields {
                let rules = field.validators()?;
                step_builder = step_builder.field_with(field.path, rules);
            }
            builder = builder.step(step_builder.build()?);
        }

        for rule in self.derived {
            let derived = match rule.op {
                DeriveOp::Product => DerivedField::product(rule.target, rule.inputs)?,
                DeriveOp::Sum => DerivedField::sum(rule.target, rule.inputs)?,
            };
            builder = builder.derive(derived);
        }

        for binding in self.reference_defaults {
            let mut reference = ReferenceDefault::new(binding.source, binding.target, binding.attribute)?;
            if let Some(selector) = binding.selector {
                reference = reference.selected_by(selector)?;
            }
            builder = builder.reference_default(reference);
        }

        if let Some(photo_field) = self.photo_field {
            builder = builder.photo_field(photo_field);
        }

        builder.build()
    }
}

impl FieldDefinition {
    fn validators(&self) -> Result<Vec<Validator>, WizardError> {
        let message = |fallback: String| self.message.clone().unwrap_or(fallback);
        let mut rules = Vec::new();

        if self.required {
            rules.push(validators::required(message("This field is required".into())));
        }
        if let Some(min) = self.min_length {
            rules.push(validators::min_length(
                min,
                message(format!("Must be at least {min} characters")),
            ));
        }
        if let Some(max) = self.max_length {
            rules.push(validators::max_length(
                max,
                message(format!("Must be at most {max} characters")),
            ));
        }
        if let Some(raw) = &self.pattern {
            let re = Regex::new(raw).map_err(|source| WizardError::InvalidPattern {
                field: self.path.clone(),
                source,
            })?;
            rules.push(validators::pattern(re, message("Invalid format".into())));
        }
        if self.email {
            let rule = validators::email(message("Enter a valid email address".into()))
                .map_err(|source| WizardError::InvalidPattern {
                    field: self.path.clone(),
                    source,
                })?;
            rules.push(rule);
        }
        if self.number || self.min.is_some() {
            rules.push(validators::number(message("Enter a number".into())));
        }
        if let Some(min) = self.min {
            rules.push(validators::min_number(
                min,
                message(format!("Must be at least {min}")),
            ));
        }
        Ok(rules)
    }
}
