//! Client-side contact form: the submission state machine, the HTTP call to
//! the backend and an async driver tying the two together.

pub mod api;
pub mod controller;
pub mod form;

pub use api::{ContactApi, HttpContactApi, SubmitError};
pub use controller::{ContactFormController, FormView, SubmitReport};
pub use form::{ContactFormState, SubmissionState, SubmitOutcome};
