mod event;
mod navigation;
mod submission;
mod validation_runtime;
mod value_sync;

pub use event::WizardEvent;
pub use submission::{SubmitMode, SubmitRejected, Submission, SubmittedRecord};

use submission::InFlight;

use crate::core::StepId;
use crate::core::field_path::FieldPath;
use crate::core::value::Value;
use crate::state::flow::{NavigationState, WizardSpec};
use crate::state::form::FormState;
use crate::state::reference::ReferenceState;
use crate::state::step::{Step, StepStatus};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum WizardPhase {
    Editing,
    Submitting,
    Submitted { record: SubmittedRecord },
    SubmitFailed { message: String },
}

/// Drives one wizard instance: owns the form and navigation state and gates
/// every transition on validation. Contains no rendering and performs no I/O.
pub struct WizardEngine {
    spec: WizardSpec,
    form: FormState,
    nav: NavigationState,
    phase: WizardPhase,
    mode: SubmitMode,
    references: IndexMap<String, ReferenceState>,
    generation: u64,
    next_ticket: u64,
    in_flight: Option<InFlight>,
}

impl WizardEngine {
    /// Engine for a new record, starting from an empty form.
    pub fn new(spec: WizardSpec) -> Self {
        Self::with_state(spec, FormState::new(), SubmitMode::Create)
    }

    /// Engine editing an existing record; the form starts pre-populated.
    pub fn edit(spec: WizardSpec, record_id: impl Into<String>, values: Value) -> Self {
        Self::with_state(
            spec,
            FormState::with_values(values),
            SubmitMode::Update {
                record_id: record_id.into(),
            },
        )
    }

    fn with_state(spec: WizardSpec, form: FormState, mode: SubmitMode) -> Self {
        let nav = NavigationState::new(spec.len());
        Self {
            spec,
            form,
            nav,
            phase: WizardPhase::Editing,
            mode,
            references: IndexMap::new(),
            generation: 0,
            next_ticket: 0,
            in_flight: None,
        }
    }

    pub fn spec(&self) -> &WizardSpec {
        &self.spec
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn values(&self) -> &Value {
        self.form.values().root()
    }

    pub fn value(&self, path: &FieldPath) -> Option<&Value> {
        self.form.value(path)
    }

    pub fn errors(&self) -> &IndexMap<FieldPath, String> {
        self.form.errors()
    }

    pub fn visible_error(&self, path: &FieldPath) -> Option<&str> {
        self.form.visible_error(path)
    }

    pub fn current_step_index(&self) -> usize {
        self.nav.current_index()
    }

    pub fn current_step(&self) -> &Step {
        &self.spec.steps()[self.nav.current_index()]
    }

    pub fn current_step_id(&self) -> &StepId {
        &self.current_step().id
    }

    pub fn step_status_at(&self, index: usize) -> StepStatus {
        self.nav.status_at(index)
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    /// True while a submission handed out by `begin_submission` is still
    /// held by its caller and has not been completed.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.as_ref().is_some_and(InFlight::is_live)
    }

    pub fn mode(&self) -> &SubmitMode {
        &self.mode
    }

    pub fn reference(&self, source: &str) -> Option<&ReferenceState> {
        self.references.get(source)
    }

    /// Message of the last failed submission, until the user edits again.
    pub fn submit_error(&self) -> Option<&str> {
        match &self.phase {
            WizardPhase::SubmitFailed { message } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Throws away all entered data. Results of work started before the
    /// discard are ignored when they arrive.
    pub fn discard(&mut self) {
        log::debug!("discarding wizard state (generation {})", self.generation);
        self.form.discard();
        self.nav = NavigationState::new(self.spec.len());
        self.phase = WizardPhase::Editing;
        self.generation = self.generation.saturating_add(1);
        self.in_flight = None;
    }

    fn accepts_input(&self) -> bool {
        match self.phase {
            WizardPhase::Editing | WizardPhase::SubmitFailed { .. } => true,
            WizardPhase::Submitting => !self.is_submitting(),
            WizardPhase::Submitted { .. } => false,
        }
    }

    /// Any interaction after a failed submission returns to editing.
    fn reopen(&mut self) {
        self.release_abandoned();
        if matches!(self.phase, WizardPhase::SubmitFailed { .. }) {
            self.phase = WizardPhase::Editing;
        }
    }

    /// A submission whose caller went away without completing it leaves the
    /// form editable again, with its values intact.
    fn release_abandoned(&mut self) {
        let Some(in_flight) = &self.in_flight else {
            return;
        };
        if in_flight.is_live() {
            return;
        }
        log::warn!("submission {} was abandoned before completing", in_flight.ticket);
        self.in_flight = None;
        self.phase = WizardPhase::Editing;
    }
}
