use crate::adapters::email::{MailError, Mailer};
use crate::config::EmailConfig;
use crate::domain::email::{Mailbox, OutboundEmail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Longest provider error body kept for diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Serialize, Debug, PartialEq, Eq)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Address<'a>>,
    subject: &'a str,
    content: [Content<'a>; 2],
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime_type: &'static str,
    value: &'a str,
}

impl<'a> From<&'a Mailbox> for Address<'a> {
    fn from(mailbox: &'a Mailbox) -> Self {
        Self { email: mailbox.address.as_str(), name: mailbox.name.as_deref() }
    }
}

impl<'a> From<&'a OutboundEmail> for SendRequest<'a> {
    fn from(email: &'a OutboundEmail) -> Self {
        // SendGrid requires text/plain to precede text/html.
        Self {
            personalizations: [Personalization { to: [Address::from(&email.to)] }],
            from: Address::from(&email.from),
            reply_to: email.reply_to.as_ref().map(Address::from),
            subject: &email.subject,
            content: [
                Content { mime_type: "text/plain", value: &email.text_body },
                Content { mime_type: "text/html", value: &email.html_body },
            ],
        }
    }
}

/// Delivers email through SendGrid's v3 `mail/send` API.
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for SendGridMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridMailer").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

impl SendGridMailer {
    /// Builds the adapter from configuration. This is the startup check for
    /// the provider credential.
    ///
    /// # Errors
    /// Returns an error if the API key is missing or the HTTP client cannot be built.
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key()?.to_string();
        let client = Client::builder().timeout(config.send_timeout()).build()?;
        let endpoint = format!("{}/v3/mail/send", config.sendgrid_base_url.trim_end_matches('/'));

        Ok(Self { client, endpoint, api_key })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let body = SendRequest::from(email);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { MailError::Timeout } else { MailError::Transport(e) })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "SendGrid accepted email");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected { status: status.as_u16(), body: body.chars().take(MAX_ERROR_BODY_CHARS).collect() })
    }
}
