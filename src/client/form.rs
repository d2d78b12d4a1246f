use crate::client::api::SubmitError;
use crate::domain::contact::{ContactForm, Field, FieldError};
use std::time::Duration;
use tokio::time::Instant;

/// How long the success state is shown before the form is usable again.
pub const DEFAULT_SUCCESS_DISPLAY: Duration = Duration::from_secs(3);

/// Identifies one dispatched submission. Completions carrying an older ticket
/// are stale and get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Pending { ticket: Ticket, since: Instant },
    Succeeded { since: Instant },
    Failed { reason: String },
}

/// A request the caller must now send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub payload: ContactForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Dispatched(Submission),
    Invalid(Vec<FieldError>),
    /// A submission is already in flight.
    Ignored,
}

/// Contact form fields plus the submission state machine.
///
/// Pure and clock-injected: callers pass `now`, nothing here sleeps or does I/O.
#[derive(Debug, Clone)]
pub struct ContactFormState {
    fields: ContactForm,
    errors: Vec<FieldError>,
    state: SubmissionState,
    next_ticket: u64,
    success_display: Duration,
}

impl Default for ContactFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactFormState {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_success_display(DEFAULT_SUCCESS_DISPLAY)
    }

    #[must_use]
    pub const fn with_success_display(success_display: Duration) -> Self {
        Self {
            fields: ContactForm {
                name: String::new(),
                email: String::new(),
                subject: String::new(),
                message: String::new(),
            },
            errors: Vec::new(),
            state: SubmissionState::Idle,
            next_ticket: 0,
            success_display,
        }
    }

    #[must_use]
    pub const fn fields(&self) -> &ContactForm {
        &self.fields
    }

    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn error_for(&self, field: Field) -> Option<&str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    #[must_use]
    pub const fn state(&self) -> &SubmissionState {
        &self.state
    }

    #[must_use]
    pub const fn success_display(&self) -> Duration {
        self.success_display
    }

    /// Whether a submit would be accepted. Presentation uses this to disable
    /// the control; [`ContactFormState::submit`] enforces it regardless.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        !matches!(self.state, SubmissionState::Pending { .. })
    }

    /// Edits a field. Its error annotation is cleared until the next submit.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.fields.set(field, value);
        self.errors.retain(|e| e.field != field);
    }

    /// Validates and, if valid, moves to `Pending` with a fresh ticket.
    /// A success banner still showing is replaced.
    ///
    /// Invalid input leaves the submission state untouched and only annotates
    /// fields.
    pub fn submit(&mut self, now: Instant) -> SubmitOutcome {
        if !self.can_submit() {
            return SubmitOutcome::Ignored;
        }

        if let Err(errors) = self.fields.validate() {
            self.errors.clone_from(&errors);
            return SubmitOutcome::Invalid(errors);
        }

        self.errors.clear();
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.state = SubmissionState::Pending { ticket, since: now };

        SubmitOutcome::Dispatched(Submission { ticket, payload: self.fields.clone() })
    }

    /// Applies the result of a dispatched submission.
    ///
    /// Returns `false` and changes nothing when `ticket` is not the one
    /// currently pending.
    pub fn complete(&mut self, ticket: Ticket, result: Result<(), SubmitError>, now: Instant) -> bool {
        if !matches!(self.state, SubmissionState::Pending { ticket: current, .. } if current == ticket) {
            tracing::debug!(?ticket, "Dropping stale submission result");
            return false;
        }

        match result {
            Ok(()) => {
                self.fields = ContactForm::default();
                self.errors.clear();
                self.state = SubmissionState::Succeeded { since: now };
            }
            Err(err) => {
                if let SubmitError::Rejected(errors) = &err {
                    self.errors.clone_from(errors);
                }
                self.state = SubmissionState::Failed { reason: err.to_string() };
            }
        }

        true
    }

    /// Returns to `Idle` once the success state has been shown long enough.
    pub fn expire_success(&mut self, now: Instant) -> bool {
        if let SubmissionState::Succeeded { since } = self.state
            && now.saturating_duration_since(since) >= self.success_display
        {
            self.state = SubmissionState::Idle;
            return true;
        }
        false
    }

    /// Discards fields and state. A submission still in flight becomes stale.
    pub fn reset(&mut self) {
        self.fields = ContactForm::default();
        self.errors.clear();
        self.state = SubmissionState::Idle;
    }
}
