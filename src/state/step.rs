use crate::core::StepId;
use crate::core::field_path::{FieldPath, FieldPathError};
use crate::error::WizardError;
use crate::state::validation::{StepValidator, ValidationContext, ValidationIssue};
use crate::validators::{self, Validator};
use indexmap::IndexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Active,
    Done,
}

/// Validator chain attached to one field.
pub struct FieldRule {
    pub path: FieldPath,
    pub validators: Vec<Validator>,
}

pub struct Step {
    pub id: StepId,
    pub title: String,
    pub description: Option<String>,
    pub fields: IndexSet<FieldPath>,
    pub rules: Vec<FieldRule>,
    pub validators: Vec<StepValidator>,
}

impl Step {
    pub fn builder(id: impl Into<StepId>, title: impl Into<String>) -> StepBuilder {
        StepBuilder::new(id, title)
    }

    pub fn owns_field(&self, path: &FieldPath) -> bool {
        self.fields.iter().any(|field| path.starts_with(field))
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("fields", &self.fields)
            .field("validators", &self.validators.len())
            .finish()
    }
}

pub struct StepBuilder {
    id: StepId,
    title: String,
    description: Option<String>,
    fields: Vec<(String, Vec<Validator>)>,
    validators: Vec<StepValidator>,
}

impl StepBuilder {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            fields: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a field on this step without rules.
    pub fn field(self, path: impl Into<String>) -> Self {
        self.field_with(path, Vec::new())
    }

    pub fn field_with(mut self, path: impl Into<String>, validators: Vec<Validator>) -> Self {
        self.fields.push((path.into(), validators));
        self
    }

    pub fn require(self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.field_with(path, vec![validators::required(message)])
    }

    pub fn validator(mut self, validator: StepValidator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validate(
        mut self,
        f: impl Fn(&ValidationContext<'_>) -> Vec<ValidationIssue> + Send + Sync + 'static,
    ) -> Self {
        self.validators.push(Box::new(f));
        self
    }

    pub fn build(self) -> Result<Step, WizardError> {
        let mut fields = IndexSet::new();
        let mut rules = Vec::<FieldRule>::new();
        for (raw, field_validators) in self.fields {
            let path = FieldPath::parse(raw.as_str())
                .map_err(|source| invalid_field(&self.id, raw.as_str(), source))?;
            fields.insert(path.clone());
            if field_validators.is_empty() {
                continue;
            }
            // Repeated declarations extend the same chain.
            match rules.iter_mut().find(|rule| rule.path == path) {
                Some(rule) => rule.validators.extend(field_validators),
                None => rules.push(FieldRule {
                    path,
                    validators: field_validators,
                }),
            }
        }

        Ok(Step {
            id: self.id,
            title: self.title,
            description: self.description,
            fields,
            rules,
            validators: self.validators,
        })
    }
}

fn invalid_field(step: &StepId, raw: &str, source: FieldPathError) -> WizardError {
    WizardError::InvalidField {
        step: step.to_string(),
        path: raw.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::Step;
    use crate::core::field_path::FieldPath;
    use crate::error::WizardError;

    #[test]
    fn repeated_fields_merge_into_one_rule() {
        let step = Step::builder("guardian", "Guardian")
            .require("guardian.phone", "Phone is required")
            .field_with(
                "guardian.phone",
                vec![crate::validators::min_length(7, "Phone is too short")],
            )
            .field("guardian.email")
            .build()
            .expect("step");

        assert_eq!(step.fields.len(), 2);
        assert_eq!(step.rules.len(), 1);
        assert_eq!(step.rules[0].validators.len(), 2);
    }

    #[test]
    fn build_rejects_malformed_paths() {
        let err = Step::builder("personal", "Personal")
            .require("first_name[", "required")
            .build()
            .expect_err("bad path");
        assert!(matches!(err, WizardError::InvalidField { ref step, .. } if step == "personal"));
    }

    #[test]
    fn owns_nested_fields() {
        let step = Step::builder("guardian", "Guardian")
            .field("guardian")
            .build()
            .expect("step");
        assert!(step.owns_field(&FieldPath::parse("guardian.phone").expect("path")));
        assert!(!step.owns_field(&FieldPath::key("first_name")));
    }
}
