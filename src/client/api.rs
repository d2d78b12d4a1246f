use crate::api::schemas::contact::ErrorResponse;
use crate::domain::contact::{ContactForm, FieldError};
use crate::error::DELIVERY_FAILED_MESSAGE;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONTACT_PATH: &str = "/api/contact";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The server found fields invalid. Messages are per field.
    #[error("Please correct the highlighted fields.")]
    Rejected(Vec<FieldError>),
    #[error("{0}")]
    Delivery(String),
    #[error("Could not reach the server. Please try again later.")]
    Network,
}

/// Sends a contact form to the backend.
#[async_trait]
pub trait ContactApi: Send + Sync + Debug {
    async fn submit(&self, form: &ContactForm) -> Result<(), SubmitError>;
}

/// [`ContactApi`] over HTTP against `POST {base}/api/contact`.
#[derive(Debug, Clone)]
pub struct HttpContactApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContactApi {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: format!("{}{CONTACT_PATH}", base_url.trim_end_matches('/')) })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContactApi for HttpContactApi {
    async fn submit(&self, form: &ContactForm) -> Result<(), SubmitError> {
        let response = self.client.post(&self.endpoint).json(form).send().await.map_err(|e| {
            tracing::warn!(error = %e, timeout = e.is_timeout(), "Contact request did not complete");
            SubmitError::Network
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.json::<ErrorResponse>().await.ok();
        Err(classify_failure(status, body))
    }
}

fn classify_failure(status: StatusCode, body: Option<ErrorResponse>) -> SubmitError {
    match (status, body) {
        (StatusCode::BAD_REQUEST, Some(ErrorResponse { details: Some(details), .. })) if !details.is_empty() => {
            SubmitError::Rejected(details)
        }
        (_, Some(ErrorResponse { error, .. })) if !error.is_empty() => SubmitError::Delivery(error),
        (StatusCode::TOO_MANY_REQUESTS, None) => {
            SubmitError::Delivery("Too many messages sent. Please wait a minute and try again.".to_string())
        }
        _ => SubmitError::Delivery(DELIVERY_FAILED_MESSAGE.to_string()),
    }
}
