use crate::core::field_path::IntoFieldPath;
use crate::core::value::Value;
use crate::engine::{SubmitMode, SubmitRejected, WizardEngine, WizardEvent};
use crate::error::WizardError;
use crate::runtime::collaborators::{PhotoUploader, ReferenceDataProvider, RemoteSubmitter};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shares one engine between UI callbacks and in-flight requests. The lock is
/// never held across a collaborator call.
#[derive(Clone)]
pub struct WizardSession {
    engine: Arc<Mutex<WizardEngine>>,
    submitter: Arc<dyn RemoteSubmitter>,
    photos: Option<Arc<dyn PhotoUploader>>,
}

impl WizardSession {
    pub fn new(engine: WizardEngine, submitter: Arc<dyn RemoteSubmitter>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            submitter,
            photos: None,
        }
    }

    pub fn with_photo_uploader(mut self, uploader: Arc<dyn PhotoUploader>) -> Self {
        self.photos = Some(uploader);
        self
    }

    pub fn engine(&self) -> Arc<Mutex<WizardEngine>> {
        Arc::clone(&self.engine)
    }

    /// Runs `f` against the engine under the lock.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut WizardEngine) -> R) -> R {
        let mut engine = self.engine.lock().await;
        f(&mut engine)
    }

    pub async fn update_field(
        &self,
        path: impl IntoFieldPath,
        value: impl Into<Value>,
    ) -> Result<Vec<WizardEvent>, WizardError> {
        self.engine.lock().await.update_field(path, value)
    }

    pub async fn mark_touched(&self, path: impl IntoFieldPath) -> Result<Vec<WizardEvent>, WizardError> {
        self.engine.lock().await.mark_touched(path)
    }

    pub async fn go_next(&self) -> Vec<WizardEvent> {
        self.engine.lock().await.go_next()
    }

    pub async fn go_previous(&self) -> Vec<WizardEvent> {
        self.engine.lock().await.go_previous()
    }

    pub async fn go_to_step(&self, step_id: &str) -> Result<Vec<WizardEvent>, WizardError> {
        self.engine.lock().await.go_to_step(step_id)
    }

    pub async fn discard(&self) {
        self.engine.lock().await.discard();
    }

    /// Validates, sends the record and applies the answer. A call made while
    /// another submission is running is refused without contacting the
    /// backend.
    pub async fn submit(&self) -> Result<Vec<WizardEvent>, SubmitRejected> {
        let (submission, mut events) = self.engine.lock().await.begin_submission()?;

        let payload = submission.payload.clone();
        let result = match &submission.mode {
            SubmitMode::Create => self.submitter.create(payload).await,
            SubmitMode::Update { record_id } => self.submitter.update(record_id, payload).await,
        };

        let secondary = match (&result, &submission.photo, &self.photos) {
            (Ok(record), Some(photo), Some(uploader)) => {
                match uploader.upload(&record.id, photo.clone()).await {
                    Ok(()) => None,
                    Err(err) => {
                        log::warn!("photo upload for record '{}' failed: {err}", record.id);
                        Some(WizardEvent::SecondaryStepFailed {
                            message: err.to_string(),
                        })
                    }
                }
            }
            _ => None,
        };

        let completed = self
            .engine
            .lock()
            .await
            .complete_submission(&submission, result);
        if completed.is_empty() {
            return Ok(completed);
        }
        events.extend(completed);
        events.extend(secondary);
        Ok(events)
    }

    /// Fetches reference data for `source` and applies it. Failures end up in
    /// the engine's reference state rather than being returned.
    pub async fn load_reference(
        &self,
        source: &str,
        provider: &dyn ReferenceDataProvider,
    ) -> Vec<WizardEvent> {
        self.engine.lock().await.begin_reference_load(source);
        let result = provider.load().await;
        self.engine.lock().await.apply_reference(source, result)
    }
}
