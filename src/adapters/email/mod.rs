use crate::domain::email::OutboundEmail;
use async_trait::async_trait;
use thiserror::Error;

pub mod sendgrid;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Provider rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Provider request timed out")]
    Timeout,
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    /// Hands a rendered email to the provider.
    ///
    /// # Errors
    /// Returns `MailError` when the provider cannot be reached or refuses the email.
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}
