use super::{WizardEngine, WizardEvent};
use crate::error::WizardError;
use crate::state::validation::ValidationMode;

impl WizardEngine {
    /// True when `step_id` is at or before the current step, or when every
    /// step before it passes strict validation. The answer does not depend on
    /// which fields have been touched.
    pub fn can_enter_step(&self, step_id: &str) -> bool {
        let Some(index) = self.spec.index_of(step_id) else {
            return false;
        };
        self.can_enter_index(index)
    }

    fn can_enter_index(&self, index: usize) -> bool {
        index <= self.nav.current_index()
            || (0..index).all(|earlier| {
                self.validate_step_at(earlier, ValidationMode::Navigation)
                    .is_valid
            })
    }

    /// Direct jump from the step indicator, allowed whenever
    /// `can_enter_step` is.
    pub fn go_to_step(&mut self, step_id: &str) -> Result<Vec<WizardEvent>, WizardError> {
        let index = self.step_index(step_id)?;
        if !self.accepts_input() || index == self.nav.current_index() {
            return Ok(Vec::new());
        }
        if !self.can_enter_index(index) {
            log::debug!("step '{step_id}' is not reachable yet");
            return Ok(Vec::new());
        }
        self.reopen();

        let from = self.nav.current_index();
        self.nav.jump_to(index);
        log::debug!("jumped from step {from} to step {index}");
        Ok(vec![WizardEvent::StepChanged { from, to: index }])
    }

    /// Leaves the current step only if it passes strict validation. When it
    /// does not, its errors are committed and the offending fields touched so
    /// they show up immediately.
    pub fn go_next(&mut self) -> Vec<WizardEvent> {
        if !self.accepts_input() {
            return Vec::new();
        }
        self.reopen();

        let from = self.nav.current_index();
        let validation = self.enforce_step(from);
        if !validation.is_valid {
            let step = self.current_step_id().clone();
            log::debug!(
                "step '{step}' blocked with {} field error(s)",
                validation.errors.len()
            );
            return vec![WizardEvent::NavigationBlocked {
                step,
                errors: validation.errors,
                step_errors: validation.step_errors,
            }];
        }

        if !self.nav.advance() {
            self.nav.complete_current();
            return Vec::new();
        }
        let to = self.nav.current_index();
        log::debug!("advanced from step {from} to step {to}");
        vec![WizardEvent::StepChanged { from, to }]
    }

    pub fn go_previous(&mut self) -> Vec<WizardEvent> {
        if !self.accepts_input() {
            return Vec::new();
        }
        self.reopen();

        let from = self.nav.current_index();
        if !self.nav.retreat() {
            return Vec::new();
        }
        let to = self.nav.current_index();
        log::debug!("went back from step {from} to step {to}");
        vec![WizardEvent::StepChanged { from, to }]
    }
}
