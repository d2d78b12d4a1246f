use crate::client::api::{ContactApi, SubmitError};
use crate::client::form::{ContactFormState, SubmissionState, SubmitOutcome};
use crate::domain::contact::{ContactForm, Field, FieldError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::Instrument;

/// Point-in-time copy of the form for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub fields: ContactForm,
    pub errors: Vec<FieldError>,
    pub state: SubmissionState,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    Ignored,
    Invalid(Vec<FieldError>),
    Sent,
    Failed(SubmitError),
    /// The form was reset while the request was in flight.
    Discarded,
}

/// Drives a [`ContactFormState`] against a [`ContactApi`].
///
/// The lock is never held across the network call, so edits and a second
/// (ignored) submit stay responsive while a request is pending.
#[derive(Debug, Clone)]
pub struct ContactFormController {
    state: Arc<Mutex<ContactFormState>>,
    api: Arc<dyn ContactApi>,
}

impl ContactFormController {
    #[must_use]
    pub fn new(api: Arc<dyn ContactApi>) -> Self {
        Self::with_state(api, ContactFormState::new())
    }

    #[must_use]
    pub fn with_state(api: Arc<dyn ContactApi>, state: ContactFormState) -> Self {
        Self { state: Arc::new(Mutex::new(state)), api }
    }

    pub async fn set_field(&self, field: Field, value: impl Into<String> + Send) {
        self.state.lock().await.set_field(field, value);
    }

    pub async fn view(&self) -> FormView {
        let state = self.state.lock().await;
        FormView {
            fields: state.fields().clone(),
            errors: state.field_errors().to_vec(),
            state: state.state().clone(),
            can_submit: state.can_submit(),
        }
    }

    pub async fn reset(&self) {
        self.state.lock().await.reset();
    }

    /// Validates, sends, and applies the result. On success a task is spawned
    /// that returns the form to idle after the display duration.
    pub async fn submit(&self) -> SubmitReport {
        let submission = match self.state.lock().await.submit(Instant::now()) {
            SubmitOutcome::Dispatched(submission) => submission,
            SubmitOutcome::Invalid(errors) => return SubmitReport::Invalid(errors),
            SubmitOutcome::Ignored => {
                tracing::debug!("Submit ignored while a request is pending");
                return SubmitReport::Ignored;
            }
        };

        let span = tracing::info_span!("contact_submit", ticket = ?submission.ticket);
        let result = self.api.submit(&submission.payload).instrument(span).await;

        let mut state = self.state.lock().await;
        if !state.complete(submission.ticket, result.clone(), Instant::now()) {
            return SubmitReport::Discarded;
        }

        match result {
            Ok(()) => {
                self.schedule_success_reset(state.success_display());
                SubmitReport::Sent
            }
            Err(err) => {
                tracing::info!(error = %err, "Contact submission failed");
                SubmitReport::Failed(err)
            }
        }
    }

    fn schedule_success_reset(&self, after: std::time::Duration) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            state.lock().await.expire_success(Instant::now());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Debug)]
    struct ScriptedApi {
        calls: AtomicUsize,
        started: Notify,
        release: Notify,
        gated: bool,
        result: Result<(), SubmitError>,
    }

    impl ScriptedApi {
        fn new(result: Result<(), SubmitError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                started: Notify::new(),
                release: Notify::new(),
                gated: false,
                result,
            })
        }

        fn gated(result: Result<(), SubmitError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                started: Notify::new(),
                release: Notify::new(),
                gated: true,
                result,
            })
        }
    }

    #[async_trait]
    impl ContactApi for ScriptedApi {
        async fn submit(&self, _form: &ContactForm) -> Result<(), SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.gated {
                self.started.notify_one();
                self.release.notified().await;
            }
            self.result.clone()
        }
    }

    async fn fill(controller: &ContactFormController) {
        controller.set_field(Field::Name, "Jane Doe").await;
        controller.set_field(Field::Email, "jane@example.com").await;
        controller.set_field(Field::Subject, "Project inquiry").await;
        controller.set_field(Field::Message, "I would like to talk about a project.").await;
    }

    #[tokio::test]
    async fn test_double_submit_issues_one_request() {
        let api = ScriptedApi::gated(Ok(()));
        let controller = ContactFormController::new(Arc::clone(&api) as Arc<dyn ContactApi>);
        fill(&controller).await;

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit().await }
        });
        api.started.notified().await;

        assert_eq!(controller.submit().await, SubmitReport::Ignored);
        assert!(!controller.view().await.can_submit);

        api.release.notify_one();
        assert_eq!(first.await.unwrap(), SubmitReport::Sent);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_api() {
        let api = ScriptedApi::new(Ok(()));
        let controller = ContactFormController::new(Arc::clone(&api) as Arc<dyn ContactApi>);
        controller.set_field(Field::Name, "J").await;

        let report = controller.submit().await;

        assert!(matches!(report, SubmitReport::Invalid(ref errors) if errors.len() == 4));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.view().await.state, SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_failure_preserves_fields() {
        let api = ScriptedApi::new(Err(SubmitError::Delivery("Failed to send message. Please try again later.".into())));
        let controller = ContactFormController::new(api);
        fill(&controller).await;

        let report = controller.submit().await;

        assert!(matches!(report, SubmitReport::Failed(SubmitError::Delivery(_))));
        let view = controller.view().await;
        assert_eq!(view.fields.name, "Jane Doe");
        assert!(view.can_submit);
        assert_eq!(
            view.state,
            SubmissionState::Failed { reason: "Failed to send message. Please try again later.".into() }
        );
    }

    #[tokio::test]
    async fn test_server_rejection_is_shown_on_fields() {
        let details = vec![FieldError { field: Field::Email, message: "Please enter a valid email".into() }];
        let api = ScriptedApi::new(Err(SubmitError::Rejected(details)));
        let controller = ContactFormController::new(api);
        fill(&controller).await;

        controller.submit().await;

        let view = controller.view().await;
        assert_eq!(view.errors.len(), 1);
        assert_eq!(view.errors[0].field, Field::Email);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_then_returns_to_idle() {
        let api = ScriptedApi::new(Ok(()));
        let controller = ContactFormController::new(api);
        fill(&controller).await;

        assert_eq!(controller.submit().await, SubmitReport::Sent);
        let view = controller.view().await;
        assert!(matches!(view.state, SubmissionState::Succeeded { .. }));
        assert_eq!(view.fields, ContactForm::default());

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert!(matches!(controller.view().await.state, SubmissionState::Succeeded { .. }));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(controller.view().await.state, SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_result() {
        let api = ScriptedApi::gated(Ok(()));
        let controller = ContactFormController::new(Arc::clone(&api) as Arc<dyn ContactApi>);
        fill(&controller).await;

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit().await }
        });
        api.started.notified().await;
        controller.reset().await;
        api.release.notify_one();

        assert_eq!(pending.await.unwrap(), SubmitReport::Discarded);
        assert_eq!(controller.view().await.state, SubmissionState::Idle);
    }
}
