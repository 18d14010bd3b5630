use super::WizardEngine;
use crate::core::StepId;
use crate::core::field_path::FieldPath;
use crate::error::WizardError;
use crate::state::validation::{StepValidation, ValidationMode, evaluate_step};

impl WizardEngine {
    /// Validates one step without changing any state.
    pub fn validate_step(
        &self,
        step_id: &str,
        mode: ValidationMode,
    ) -> Result<StepValidation, WizardError> {
        let index = self.step_index(step_id)?;
        Ok(self.validate_step_at(index, mode))
    }

    /// Validates every step in navigation mode and returns the ids of those
    /// that fail. Nothing is committed.
    pub fn failing_steps(&self) -> Vec<StepId> {
        self.spec
            .steps()
            .iter()
            .filter(|step| !evaluate_step(step, &self.form, ValidationMode::Navigation).is_valid)
            .map(|step| step.id.clone())
            .collect()
    }

    pub(super) fn step_index(&self, step_id: &str) -> Result<usize, WizardError> {
        self.spec
            .index_of(step_id)
            .ok_or_else(|| WizardError::UnknownStep(step_id.to_string()))
    }

    pub(super) fn validate_step_at(&self, index: usize, mode: ValidationMode) -> StepValidation {
        match self.spec.step_at(index) {
            Some(step) => evaluate_step(step, &self.form, mode),
            None => StepValidation {
                is_valid: true,
                ..StepValidation::default()
            },
        }
    }

    /// Runs navigation-mode validation for the step at `index` and makes the
    /// outcome visible: the step's committed errors are replaced and every
    /// offending field becomes touched.
    pub(super) fn enforce_step(&mut self, index: usize) -> StepValidation {
        let validation = self.validate_step_at(index, ValidationMode::Navigation);
        let Some(step) = self.spec.step_at(index) else {
            return validation;
        };

        let mut scope: Vec<&FieldPath> = step.fields.iter().collect();
        scope.extend(
            validation
                .errors
                .keys()
                .filter(|path| !step.fields.contains(*path)),
        );
        self.form.commit_errors(scope, &validation.errors);
        for path in validation.errors.keys() {
            self.form.touch(path);
        }
        validation
    }
}
