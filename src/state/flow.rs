use crate::core::StepId;
use crate::core::field_path::{FieldPath, IntoFieldPath};
use crate::error::WizardError;
use crate::state::derive::DerivedField;
use crate::state::reference::ReferenceDefault;
use crate::state::step::{Step, StepStatus};
use std::collections::HashSet;

/// Immutable description of a wizard: its ordered steps plus the rules that
/// connect fields across steps.
#[derive(Debug)]
pub struct WizardSpec {
    steps: Vec<Step>,
    derived: Vec<DerivedField>,
    reference_defaults: Vec<ReferenceDefault>,
    photo_field: Option<FieldPath>,
}

impl WizardSpec {
    pub fn new(steps: Vec<Step>) -> Result<Self, WizardError> {
        Self::builder().steps(steps).build()
    }

    pub fn builder() -> WizardSpecBuilder {
        WizardSpecBuilder::default()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_at(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id.as_str() == id)
    }

    pub fn derived(&self) -> &[DerivedField] {
        &self.derived
    }

    pub fn reference_defaults(&self) -> &[ReferenceDefault] {
        &self.reference_defaults
    }

    /// Field holding the photo delivered after the record is saved.
    pub fn photo_field(&self) -> Option<&FieldPath> {
        self.photo_field.as_ref()
    }

    /// First step declaring `path`, used to report where an error lives.
    pub fn step_owning(&self, path: &FieldPath) -> Option<&StepId> {
        self.steps
            .iter()
            .find(|step| step.owns_field(path))
            .map(|step| &step.id)
    }
}

#[derive(Default)]
pub struct WizardSpecBuilder {
    steps: Vec<Step>,
    derived: Vec<DerivedField>,
    reference_defaults: Vec<ReferenceDefault>,
    photo_field: Option<String>,
}

impl WizardSpecBuilder {
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn derive(mut self, rule: DerivedField) -> Self {
        self.derived.push(rule);
        self
    }

    pub fn reference_default(mut self, binding: ReferenceDefault) -> Self {
        self.reference_defaults.push(binding);
        self
    }

    pub fn photo_field(mut self, path: impl Into<String>) -> Self {
        self.photo_field = Some(path.into());
        self
    }

    pub fn build(self) -> Result<WizardSpec, WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::EmptySpec);
        }
        let mut seen = HashSet::<&str>::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(WizardError::DuplicateStep(step.id.to_string()));
            }
        }
        let photo_field = self
            .photo_field
            .map(|raw| raw.into_field_path())
            .transpose()?;

        Ok(WizardSpec {
            steps: self.steps,
            derived: self.derived,
            reference_defaults: self.reference_defaults,
            photo_field,
        })
    }
}

/// Position within the wizard and the status of every step.
#[derive(Debug, Clone)]
pub struct NavigationState {
    current: usize,
    statuses: Vec<StepStatus>,
}

impl NavigationState {
    pub fn new(len: usize) -> Self {
        let mut statuses = vec![StepStatus::Pending; len];
        if let Some(first) = statuses.first_mut() {
            *first = StepStatus::Active;
        }
        Self {
            current: 0,
            statuses,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn status_at(&self, index: usize) -> StepStatus {
        self.statuses
            .get(index)
            .copied()
            .unwrap_or(StepStatus::Pending)
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.statuses.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Marks the current step done and activates the next one.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.complete_current();
        self.current += 1;
        self.activate_current();
        true
    }

    pub fn retreat(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.deactivate_current();
        self.current -= 1;
        self.activate_current();
        true
    }

    /// Moves directly to `index`; steps passed over on the way forward are
    /// marked done.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.statuses.len() || index == self.current {
            return false;
        }
        if index > self.current {
            for status in &mut self.statuses[self.current..index] {
                *status = StepStatus::Done;
            }
        } else {
            self.deactivate_current();
        }
        self.current = index;
        self.activate_current();
        true
    }

    pub fn complete_current(&mut self) {
        if let Some(status) = self.statuses.get_mut(self.current) {
            *status = StepStatus::Done;
        }
    }

    fn deactivate_current(&mut self) {
        if let Some(status) = self.statuses.get_mut(self.current) {
            if *status == StepStatus::Active {
                *status = StepStatus::Pending;
            }
        }
    }

    fn activate_current(&mut self) {
        if let Some(status) = self.statuses.get_mut(self.current) {
            *status = StepStatus::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str) -> Step {
        Step::builder(id, id).build().expect("step")
    }

    #[test]
    fn spec_requires_steps_with_unique_ids() {
        assert!(matches!(
            WizardSpec::new(Vec::new()),
            Err(WizardError::EmptySpec)
        ));
        assert!(matches!(
            WizardSpec::new(vec![step("personal"), step("personal")]),
            Err(WizardError::DuplicateStep(id)) if id == "personal"
        ));
        let spec = WizardSpec::new(vec![step("personal"), step("guardian")]).expect("spec");
        assert_eq!(spec.index_of("guardian"), Some(1));
        assert_eq!(spec.index_of("payment"), None);
    }

    #[test]
    fn navigation_tracks_statuses() {
        let mut nav = NavigationState::new(3);
        assert_eq!(nav.status_at(0), StepStatus::Active);
        assert!(nav.advance());
        assert_eq!(nav.status_at(0), StepStatus::Done);
        assert_eq!(nav.status_at(1), StepStatus::Active);

        assert!(nav.retreat());
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.status_at(0), StepStatus::Active);
        assert_eq!(nav.status_at(1), StepStatus::Pending);
        assert!(!nav.retreat());
    }

    #[test]
    fn advance_stops_at_last_step() {
        let mut nav = NavigationState::new(2);
        assert!(nav.advance());
        assert!(!nav.advance());
        assert_eq!(nav.current_index(), 1);
    }

    #[test]
    fn jump_marks_skipped_steps_done() {
        let mut nav = NavigationState::new(4);
        assert!(nav.jump_to(2));
        assert_eq!(nav.status_at(0), StepStatus::Done);
        assert_eq!(nav.status_at(1), StepStatus::Done);
        assert_eq!(nav.status_at(2), StepStatus::Active);
        assert!(!nav.jump_to(2));
        assert!(!nav.jump_to(9));
    }
}
