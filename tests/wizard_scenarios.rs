use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;
use wizard_engine::{
    DerivedField, FieldPath, ReferenceDefault, ReferenceItem, RemoteSubmitter, Step, SubmitError,
    SubmitRejected, SubmittedRecord, ValidationMode, Value, WizardEngine, WizardEvent,
    WizardSession, WizardSpec,
};

fn enrollment_spec() -> WizardSpec {
    WizardSpec::builder()
        .step(
            Step::builder("personal", "Personal details")
                .require("first_name", "First name is required")
                .build()
                .expect("step"),
        )
        .step(
            Step::builder("guardian", "Guardian")
                .require("guardian.name", "Guardian name is required")
                .field("guardian.phone")
                .build()
                .expect("step"),
        )
        .step(
            Step::builder("payment", "Payment")
                .field("class_id")
                .require("number_of_months", "Enter the number of months")
                .field("monthly_fee")
                .field("amount_due")
                .build()
                .expect("step"),
        )
        .derive(
            DerivedField::product("amount_due", ["monthly_fee", "number_of_months"])
                .expect("rule"),
        )
        .reference_default(
            ReferenceDefault::new("classes", "monthly_fee", "monthly_fee")
                .and_then(|binding| binding.selected_by("class_id"))
                .expect("binding"),
        )
        .build()
        .expect("spec")
}

fn classes() -> Vec<ReferenceItem> {
    vec![
        ReferenceItem::new("p1", "Primary One").with_attribute("monthly_fee", 40000),
        ReferenceItem::new("p2", "Primary Two").with_attribute("monthly_fee", 50000),
    ]
}

fn path(raw: &str) -> FieldPath {
    FieldPath::parse(raw).expect("path")
}

fn completed_engine() -> WizardEngine {
    let mut engine = WizardEngine::new(enrollment_spec());
    engine.update_field("first_name", "Aisha").expect("update");
    engine.update_field("guardian.name", "Sarah Nakato").expect("update");
    engine.update_field("monthly_fee", 50000).expect("update");
    engine.update_field("number_of_months", 3).expect("update");
    engine
}

struct CountingSubmitter {
    calls: AtomicUsize,
    release: Notify,
    outcome: Result<SubmittedRecord, SubmitError>,
    hold: bool,
}

impl CountingSubmitter {
    fn new(outcome: Result<SubmittedRecord, SubmitError>, hold: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
            outcome,
            hold,
        })
    }
}

#[async_trait::async_trait]
impl RemoteSubmitter for CountingSubmitter {
    async fn create(&self, _payload: Value) -> Result<SubmittedRecord, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hold {
            self.release.notified().await;
        }
        self.outcome.clone()
    }

    async fn update(&self, _record_id: &str, _payload: Value) -> Result<SubmittedRecord, SubmitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

#[test]
fn empty_first_name_blocks_the_first_step() {
    let mut engine = WizardEngine::new(enrollment_spec());
    engine.update_field("first_name", "").expect("update");
    assert_eq!(engine.value(&path("first_name")), Some(&Value::from("")));
    engine.go_next();

    assert_eq!(engine.current_step_index(), 0);
    assert_eq!(
        engine.errors().get(&path("first_name")).map(String::as_str),
        Some("First name is required")
    );
    assert!(engine.form().is_touched(&path("first_name")));
}

#[test]
fn filling_first_name_unblocks_the_first_step() {
    let mut engine = WizardEngine::new(enrollment_spec());
    engine.update_field("first_name", "Aisha").expect("update");
    engine.go_next();
    assert_eq!(engine.current_step_index(), 1);
}

#[test]
fn amount_due_follows_fee_and_months() {
    let engine = completed_engine();
    assert_eq!(
        engine.value(&path("amount_due")),
        Some(&Value::Number(150000.0))
    );
}

#[test]
fn class_fee_from_reference_data_drives_amount_due() {
    let mut engine = WizardEngine::new(enrollment_spec());
    engine.update_field("class_id", "p2").expect("update");
    engine.update_field("number_of_months", 3).expect("update");
    assert_eq!(engine.value(&path("amount_due")), None);

    engine.begin_reference_load("classes");
    let events = engine.apply_reference("classes", Ok(classes()));
    assert!(events.contains(&WizardEvent::DefaultApplied {
        source: "classes".into(),
        path: path("monthly_fee"),
        value: Value::from(50000),
    }));
    assert_eq!(engine.value(&path("monthly_fee")), Some(&Value::from(50000)));
    assert_eq!(
        engine.value(&path("amount_due")),
        Some(&Value::Number(150000.0))
    );

    engine.update_field("class_id", "p1").expect("update");
    assert_eq!(
        engine.value(&path("amount_due")),
        Some(&Value::Number(120000.0))
    );
}

#[tokio::test]
async fn rejected_submission_keeps_step_and_values() {
    let submitter = CountingSubmitter::new(Err(SubmitError::Rejected("duplicate".into())), false);
    let mut engine = completed_engine();
    engine.go_next();
    engine.go_next();
    assert_eq!(engine.current_step_index(), 2);
    let session = WizardSession::new(engine, submitter);

    let events = session.submit().await.expect("submit");
    assert!(events.contains(&WizardEvent::SubmissionFailed {
        message: "duplicate".into()
    }));
    session
        .with_engine(|engine| {
            assert_eq!(engine.current_step_index(), 2);
            assert_eq!(engine.submit_error(), Some("duplicate"));
            assert_eq!(engine.value(&path("first_name")), Some(&Value::from("Aisha")));
            assert_eq!(
                engine.value(&path("amount_due")),
                Some(&Value::Number(150000.0))
            );
        })
        .await;
}

#[test]
fn step_entry_matches_strict_validation_of_earlier_steps() {
    let mut engine = WizardEngine::new(enrollment_spec());
    let check = |engine: &WizardEngine| {
        let ids = ["personal", "guardian", "payment"];
        let current = engine.current_step_index();
        for (index, id) in ids.iter().enumerate() {
            let earlier_valid = ids[..index].iter().all(|earlier| {
                engine
                    .validate_step(earlier, ValidationMode::Navigation)
                    .expect("validate")
                    .is_valid
            });
            assert_eq!(
                engine.can_enter_step(id),
                index <= current || earlier_valid,
                "step {id}"
            );
        }
    };

    check(&engine);
    engine.mark_touched("first_name").expect("touch");
    check(&engine);
    engine.update_field("first_name", "Aisha").expect("update");
    check(&engine);
    engine.update_field("guardian.name", "Sarah").expect("update");
    check(&engine);
    engine.go_next();
    engine.go_next();
    assert_eq!(engine.current_step_index(), 2);
    engine.update_field("first_name", "").expect("update");
    check(&engine);
    assert!(engine.can_enter_step("payment"));
    engine.go_previous();
    check(&engine);
}

#[test]
fn next_moves_exactly_one_step_only_when_valid() {
    let mut engine = WizardEngine::new(enrollment_spec());
    let edits: [(&str, Value); 4] = [
        ("guardian.name", Value::from("Sarah")),
        ("first_name", Value::from("Aisha")),
        ("number_of_months", Value::from(2)),
        ("first_name", Value::from("  ")),
    ];

    for (field, value) in edits {
        let before = engine.current_step_index();
        let valid = engine
            .validate_step(engine.current_step_id().as_str(), ValidationMode::Navigation)
            .expect("validate")
            .is_valid;
        engine.go_next();
        let after = engine.current_step_index();
        if valid {
            assert_eq!(after, (before + 1).min(engine.spec().len() - 1));
        } else {
            assert_eq!(after, before);
        }
        engine.update_field(field, value).expect("update");
    }
}

#[test]
fn satisfying_edit_clears_the_displayed_error() {
    let mut engine = WizardEngine::new(enrollment_spec());
    engine.go_next();
    assert!(engine.errors().contains_key(&path("first_name")));

    engine.update_field("first_name", "Aisha").expect("update");
    let display = engine
        .validate_step("personal", ValidationMode::Display)
        .expect("validate");
    assert!(!display.errors.contains_key(&path("first_name")));
    assert!(engine.errors().get(&path("first_name")).is_none());
}

#[test]
fn back_then_next_returns_to_the_same_step() {
    let mut engine = completed_engine();
    engine.go_next();
    engine.go_next();
    let index = engine.current_step_index();
    let values = engine.values().clone();

    engine.go_previous();
    engine.go_next();
    assert_eq!(engine.current_step_index(), index);
    assert_eq!(engine.values(), &values);
}

#[tokio::test]
async fn rapid_double_submit_calls_backend_once() {
    let submitter = CountingSubmitter::new(Ok(SubmittedRecord::new("stu-1")), true);
    let session = WizardSession::new(completed_engine(), submitter.clone());

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit().await }
    });
    while submitter.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        session.submit().await.expect_err("in flight"),
        SubmitRejected::InFlight
    );

    submitter.release.notify_one();
    first.await.expect("join").expect("submit");
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
}
