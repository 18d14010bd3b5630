use super::{WizardEngine, WizardEvent, WizardPhase};
use crate::core::StepId;
use crate::core::value::{FileRef, Value};
use crate::error::SubmitError;
use std::sync::{Arc, Weak};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update { record_id: String },
}

/// Record as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedRecord {
    pub id: String,
    pub data: Value,
}

impl SubmittedRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: Value::None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// A submission that passed validation and is waiting for the backend.
/// Dropping every copy without calling `complete_submission` abandons it.
#[derive(Debug, Clone)]
pub struct Submission {
    ticket: u64,
    generation: u64,
    _live: Arc<()>,
    pub mode: SubmitMode,
    /// Form values with file references removed.
    pub payload: Value,
    pub photo: Option<FileRef>,
}

#[derive(Debug)]
pub(super) struct InFlight {
    pub(super) ticket: u64,
    live: Weak<()>,
}

impl InFlight {
    pub(super) fn is_live(&self) -> bool {
        self.live.strong_count() > 0
    }
}

impl Submission {
    pub fn payload_json(&self) -> serde_json::Value {
        self.payload.to_json()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitRejected {
    #[error("a submission is already in progress")]
    InFlight,

    #[error("the record has already been submitted")]
    AlreadySubmitted,

    /// Validation failed. `events` reports what the attempt changed: derived
    /// fields it refreshed and the errors it committed for each failing step.
    #[error("{} step(s) have errors", .failed_steps.len())]
    Invalid {
        failed_steps: Vec<StepId>,
        events: Vec<WizardEvent>,
    },
}

impl WizardEngine {
    /// Validates the whole wizard and, if it passes, moves to `Submitting` and
    /// hands out the payload to send. A rejected attempt never reaches the
    /// backend.
    pub fn begin_submission(&mut self) -> Result<(Submission, Vec<WizardEvent>), SubmitRejected> {
        self.release_abandoned();
        match self.phase {
            WizardPhase::Submitting => return Err(SubmitRejected::InFlight),
            WizardPhase::Submitted { .. } => return Err(SubmitRejected::AlreadySubmitted),
            WizardPhase::Editing | WizardPhase::SubmitFailed { .. } => {}
        }
        self.reopen();

        let mut events = self.refresh_derived();
        let failed_steps = self.validate_all(&mut events);
        if !failed_steps.is_empty() {
            log::warn!(
                "submission blocked: {} step(s) invalid ({})",
                failed_steps.len(),
                failed_steps
                    .iter()
                    .map(StepId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Err(SubmitRejected::Invalid {
                failed_steps,
                events,
            });
        }

        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.saturating_add(1);
        let live = Arc::new(());
        self.in_flight = Some(InFlight {
            ticket,
            live: Arc::downgrade(&live),
        });
        self.phase = WizardPhase::Submitting;

        let photo = self
            .spec
            .photo_field()
            .and_then(|path| self.form.value(path))
            .and_then(Value::as_file)
            .cloned();
        let submission = Submission {
            ticket,
            generation: self.generation,
            _live: live,
            mode: self.mode.clone(),
            payload: self.form.values().root().without_files(),
            photo,
        };
        log::info!("submission started ({:?})", submission.mode);
        events.push(WizardEvent::SubmissionStarted);
        Ok((submission, events))
    }

    /// Applies the backend's answer to `submission`. Answers for a ticket
    /// that is no longer in flight, e.g. after `discard`, are dropped.
    pub fn complete_submission(
        &mut self,
        submission: &Submission,
        result: Result<SubmittedRecord, SubmitError>,
    ) -> Vec<WizardEvent> {
        let current = self.in_flight.as_ref().map(|in_flight| in_flight.ticket);
        if submission.generation != self.generation || current != Some(submission.ticket) {
            log::debug!("ignoring result of stale submission {}", submission.ticket);
            return Vec::new();
        }
        self.in_flight = None;

        match result {
            Ok(record) => {
                log::info!("record '{}' saved", record.id);
                let record_id = record.id.clone();
                self.form.discard();
                self.phase = WizardPhase::Submitted { record };
                vec![WizardEvent::Submitted { record_id }]
            }
            Err(err) => {
                let message = err.to_string();
                log::info!("submission failed: {message}");
                self.phase = WizardPhase::SubmitFailed {
                    message: message.clone(),
                };
                vec![WizardEvent::SubmissionFailed { message }]
            }
        }
    }

    /// Strict validation of every step. All failures are committed together
    /// so the user sees every problem, not only those of the current step.
    /// Each failing step adds a `NavigationBlocked` event.
    fn validate_all(&mut self, events: &mut Vec<WizardEvent>) -> Vec<StepId> {
        let mut failed = Vec::new();
        for index in 0..self.spec.len() {
            let validation = self.enforce_step(index);
            if validation.is_valid {
                continue;
            }
            let Some(step) = self.spec.step_at(index) else {
                continue;
            };
            failed.push(step.id.clone());
            events.push(WizardEvent::NavigationBlocked {
                step: step.id.clone(),
                errors: validation.errors,
                step_errors: validation.step_errors,
            });
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field_path::FieldPath;
    use crate::state::derive::DerivedField;
    use crate::state::flow::WizardSpec;
    use crate::state::step::Step;

    fn spec() -> WizardSpec {
        WizardSpec::builder()
            .step(
                Step::builder("personal", "Personal details")
                    .require("first_name", "First name is required")
                    .field("photo")
                    .build()
                    .expect("step"),
            )
            .step(
                Step::builder("payment", "Payment")
                    .require("number_of_months", "Enter the number of months")
                    .field("monthly_fee")
                    .build()
                    .expect("step"),
            )
            .derive(
                DerivedField::product("amount_due", ["monthly_fee", "number_of_months"])
                    .expect("rule"),
            )
            .photo_field("photo")
            .build()
            .expect("spec")
    }

    fn filled() -> WizardEngine {
        let mut engine = WizardEngine::new(spec());
        engine.update_field("first_name", "Aisha").expect("update");
        engine
            .update_field("photo", FileRef::new("aisha.jpg", "file:///tmp/aisha.jpg"))
            .expect("update");
        engine.update_field("monthly_fee", 50000).expect("update");
        engine.update_field("number_of_months", 3).expect("update");
        engine
    }

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).expect("path")
    }

    #[test]
    fn invalid_form_is_rejected_with_every_failing_step() {
        let mut engine = WizardEngine::new(spec());
        let err = engine.begin_submission().expect_err("rejected");

        let SubmitRejected::Invalid {
            failed_steps,
            events,
        } = err
        else {
            panic!("expected a validation rejection");
        };
        assert_eq!(failed_steps, vec!["personal", "payment"]);
        let blocked: Vec<&str> = events
            .iter()
            .filter_map(|event| match event {
                WizardEvent::NavigationBlocked { step, .. } => Some(step.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(blocked, vec!["personal", "payment"]);
        assert_eq!(engine.phase(), &WizardPhase::Editing);
        assert!(engine.errors().contains_key(&path("first_name")));
        assert!(engine.errors().contains_key(&path("number_of_months")));
        assert!(engine.form().is_touched(&path("number_of_months")));
        assert_eq!(engine.current_step_index(), 0);
    }

    #[test]
    fn payload_strips_files_and_carries_photo_separately() {
        let mut engine = filled();
        let (submission, events) = engine.begin_submission().expect("begin");

        assert_eq!(events, vec![WizardEvent::SubmissionStarted]);
        assert_eq!(submission.mode, SubmitMode::Create);
        assert_eq!(submission.payload.get_path(&path("photo")), None);
        assert_eq!(
            submission.payload_json()["amount_due"],
            serde_json::json!(150000)
        );
        assert_eq!(
            submission.photo.as_ref().map(|file| file.name.as_str()),
            Some("aisha.jpg")
        );
        assert!(engine.is_submitting());
    }

    #[test]
    fn second_begin_while_in_flight_is_refused() {
        let mut engine = filled();
        let _first = engine.begin_submission().expect("begin");
        assert_eq!(engine.begin_submission().expect_err("busy"), SubmitRejected::InFlight);

        let events = engine.update_field("first_name", "Other").expect("update");
        assert!(events.is_empty());
        assert!(engine.go_previous().is_empty());
    }

    #[test]
    fn success_discards_form_and_is_terminal() {
        let mut engine = filled();
        let (submission, _) = engine.begin_submission().expect("begin");
        let events = engine.complete_submission(&submission, Ok(SubmittedRecord::new("stu-42")));

        assert_eq!(
            events,
            vec![WizardEvent::Submitted {
                record_id: "stu-42".into()
            }]
        );
        assert!(matches!(engine.phase(), WizardPhase::Submitted { record } if record.id == "stu-42"));
        assert!(engine.value(&path("first_name")).is_none());
        assert_eq!(
            engine.begin_submission().expect_err("done"),
            SubmitRejected::AlreadySubmitted
        );
    }

    #[test]
    fn failure_keeps_values_and_step() {
        let mut engine = filled();
        engine.go_next();
        let (submission, _) = engine.begin_submission().expect("begin");
        let events = engine.complete_submission(
            &submission,
            Err(SubmitError::Rejected("duplicate".into())),
        );

        assert_eq!(
            events,
            vec![WizardEvent::SubmissionFailed {
                message: "duplicate".into()
            }]
        );
        assert_eq!(engine.submit_error(), Some("duplicate"));
        assert_eq!(engine.current_step_index(), 1);
        assert_eq!(engine.value(&path("first_name")), Some(&Value::from("Aisha")));

        engine.update_field("first_name", "Aisha N.").expect("update");
        assert_eq!(engine.phase(), &WizardPhase::Editing);
    }

    #[test]
    fn blur_after_failure_returns_to_editing() {
        let mut engine = filled();
        let (submission, _) = engine.begin_submission().expect("begin");
        engine.complete_submission(&submission, Err(SubmitError::Timeout));
        assert_eq!(engine.submit_error(), Some("request timed out"));

        engine.mark_touched("first_name").expect("touch");
        assert_eq!(engine.phase(), &WizardPhase::Editing);
        assert_eq!(engine.submit_error(), None);
    }

    #[test]
    fn result_after_discard_is_ignored() {
        let mut engine = filled();
        let (submission, _) = engine.begin_submission().expect("begin");
        engine.discard();

        let events = engine.complete_submission(&submission, Ok(SubmittedRecord::new("late")));
        assert!(events.is_empty());
        assert_eq!(engine.phase(), &WizardPhase::Editing);
        assert!(!engine.is_submitting());
    }

    #[test]
    fn rejected_attempt_reports_refreshed_derived_fields() {
        let spec = WizardSpec::builder()
            .step(
                Step::builder("payment", "Payment")
                    .field("monthly_fee")
                    .field("number_of_months")
                    .field("amount_due")
                    .build()
                    .expect("step"),
            )
            .step(
                Step::builder("extra", "Extra")
                    .require("notes", "Notes are required")
                    .build()
                    .expect("step"),
            )
            .derive(
                DerivedField::product("amount_due", ["monthly_fee", "number_of_months"])
                    .expect("rule"),
            )
            .build()
            .expect("spec");
        let mut engine = WizardEngine::new(spec);
        engine.update_field("monthly_fee", 50000).expect("update");
        engine.update_field("number_of_months", 3).expect("update");
        engine.update_field("amount_due", 1).expect("update");

        let Err(SubmitRejected::Invalid {
            failed_steps,
            events,
        }) = engine.begin_submission()
        else {
            panic!("expected a validation rejection");
        };
        assert_eq!(failed_steps, vec!["extra"]);
        assert_eq!(
            engine.value(&path("amount_due")),
            Some(&Value::Number(150000.0))
        );
        assert_eq!(
            events.first(),
            Some(&WizardEvent::DerivedUpdated {
                path: path("amount_due"),
                value: Value::Number(150000.0),
            })
        );
        assert!(matches!(
            events.last(),
            Some(WizardEvent::NavigationBlocked { step, errors, .. })
                if step == "extra" && errors.contains_key(&path("notes"))
        ));
    }

    #[test]
    fn dropped_submission_leaves_the_form_editable() {
        let mut engine = filled();
        let (submission, _) = engine.begin_submission().expect("begin");
        assert!(engine.is_submitting());

        drop(submission);
        assert!(!engine.is_submitting());
        let events = engine.update_field("first_name", "Aisha N.").expect("update");
        assert!(!events.is_empty());
        assert_eq!(engine.phase(), &WizardPhase::Editing);

        let (retry, _) = engine.begin_submission().expect("retry");
        let events = engine.complete_submission(&retry, Ok(SubmittedRecord::new("stu-9")));
        assert_eq!(
            events,
            vec![WizardEvent::Submitted {
                record_id: "stu-9".into()
            }]
        );
    }

    #[test]
    fn edit_mode_submits_an_update() {
        let values = Value::from(serde_json::json!({
            "first_name": "Aisha",
            "monthly_fee": 50000,
            "number_of_months": 1
        }));
        let mut engine = WizardEngine::edit(spec(), "stu-7", values);
        let (submission, _) = engine.begin_submission().expect("begin");
        assert_eq!(
            submission.mode,
            SubmitMode::Update {
                record_id: "stu-7".into()
            }
        );
    }
}
