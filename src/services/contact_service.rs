use crate::adapters::email::Mailer;
use crate::config::MailAddresses;
use crate::domain::contact::{ContactForm, ContactMessage, FieldError};
use crate::domain::email::{EmailDeliveryResult, Mailbox, OutboundEmail};
use crate::error::{AppError, Result};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tera::{Context, Tera};
use tokio::time::timeout;

const HTML_TEMPLATE: &str = "contact_notification.html";
const TEXT_TEMPLATE: &str = "contact_notification.txt";

#[derive(Clone, Debug)]
struct Metrics {
    submissions_total: Counter<u64>,
    deliveries_total: Counter<u64>,
    delivery_duration_seconds: Histogram<f64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("portfolio-server");
        Self {
            submissions_total: meter
                .u64_counter("portfolio_contact_submissions_total")
                .with_description("Contact form submissions by outcome")
                .build(),
            deliveries_total: meter
                .u64_counter("portfolio_email_deliveries_total")
                .with_description("Provider delivery attempts by status")
                .build(),
            delivery_duration_seconds: meter
                .f64_histogram("portfolio_email_delivery_duration_seconds")
                .with_description("Time spent waiting on the email provider")
                .build(),
        }
    }
}

/// Compiled notification templates. The HTML rendering escapes all
/// submitted values.
#[derive(Clone, Debug)]
pub struct NotificationTemplates(Arc<Tera>);

#[derive(Serialize)]
struct NotificationContext<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

impl NotificationTemplates {
    /// # Errors
    /// Returns an error if a bundled template fails to parse.
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(HTML_TEMPLATE, include_str!("../../templates/contact_notification.html"))?;
        tera.add_raw_template(TEXT_TEMPLATE, include_str!("../../templates/contact_notification.txt"))?;
        Ok(Self(Arc::new(tera)))
    }

    /// Renders `(text, html)` bodies for a message.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn render(&self, message: &ContactMessage) -> anyhow::Result<(String, String)> {
        let context = Context::from_serialize(NotificationContext {
            name: message.name(),
            email: message.email().as_str(),
            subject: message.subject(),
            message: message.message(),
        })?;

        let text = self.0.render(TEXT_TEMPLATE, &context)?;
        let html = self.0.render(HTML_TEMPLATE, &context)?;
        Ok((text, html))
    }
}

/// Validates contact submissions and turns them into owner notifications.
#[derive(Clone, Debug)]
pub struct ContactService {
    mailer: Arc<dyn Mailer>,
    templates: NotificationTemplates,
    addresses: MailAddresses,
    send_timeout: Duration,
    metrics: Metrics,
}

impl ContactService {
    #[must_use]
    pub fn new(
        mailer: Arc<dyn Mailer>,
        templates: NotificationTemplates,
        addresses: MailAddresses,
        send_timeout: Duration,
    ) -> Self {
        Self { mailer, templates, addresses, send_timeout, metrics: Metrics::new() }
    }

    /// Reads a submission from a decoded JSON object, then behaves like
    /// [`ContactService::submit`].
    ///
    /// # Errors
    /// Returns `AppError::Validation` when a field has the wrong type or breaks
    /// a rule, and `AppError::DeliveryFailed` when the provider attempt did not
    /// succeed.
    pub async fn submit_object(&self, object: &Map<String, Value>) -> Result<()> {
        let form = ContactForm::from_object(object).map_err(|errors| self.invalid(errors))?;
        self.submit(&form).await
    }

    /// Re-validates an untrusted submission and attempts exactly one delivery.
    ///
    /// # Errors
    /// Returns `AppError::Validation` without contacting the provider when any
    /// rule is violated, and `AppError::DeliveryFailed` when the provider
    /// attempt did not succeed.
    #[tracing::instrument(skip_all)]
    pub async fn submit(&self, form: &ContactForm) -> Result<()> {
        let message = form.validate().map_err(|errors| self.invalid(errors))?;

        let result = self.send_notification(&message).await;
        if result.delivered {
            self.metrics.submissions_total.add(1, &[KeyValue::new("outcome", "delivered")]);
            tracing::info!("Contact notification delivered");
            Ok(())
        } else {
            self.metrics.submissions_total.add(1, &[KeyValue::new("outcome", "failed")]);
            Err(AppError::DeliveryFailed)
        }
    }

    fn invalid(&self, errors: Vec<FieldError>) -> AppError {
        self.metrics.submissions_total.add(1, &[KeyValue::new("outcome", "invalid")]);
        AppError::Validation(errors)
    }

    /// Sends the owner notification for a validated message.
    ///
    /// Never fails: every provider, transport, template and timeout error is
    /// logged and folded into an undelivered result.
    pub async fn send_notification(&self, message: &ContactMessage) -> EmailDeliveryResult {
        let email = match self.build_notification(message) {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render contact notification");
                self.metrics.deliveries_total.add(1, &[KeyValue::new("status", "render_error")]);
                return EmailDeliveryResult::failed(e.to_string());
            }
        };

        let started = Instant::now();
        let outcome = timeout(self.send_timeout, self.mailer.send(&email)).await;
        self.metrics.delivery_duration_seconds.record(started.elapsed().as_secs_f64(), &[]);

        let (status, result) = match outcome {
            Ok(Ok(())) => ("ok", EmailDeliveryResult::delivered()),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Email provider error");
                ("error", EmailDeliveryResult::failed(e.to_string()))
            }
            Err(_) => {
                tracing::error!(timeout_secs = self.send_timeout.as_secs(), "Email provider timed out");
                ("timeout", EmailDeliveryResult::failed("provider request timed out"))
            }
        };

        self.metrics.deliveries_total.add(1, &[KeyValue::new("status", status)]);
        result
    }

    /// Builds the notification addressed to the owner, replying to the submitter.
    ///
    /// # Errors
    /// Returns an error if the templates fail to render.
    pub fn build_notification(&self, message: &ContactMessage) -> anyhow::Result<OutboundEmail> {
        let (text_body, html_body) = self.templates.render(message)?;

        Ok(OutboundEmail {
            to: Mailbox::new(self.addresses.owner.clone()),
            from: Mailbox::named(self.addresses.sender.clone(), self.addresses.sender_name.clone()),
            reply_to: Some(Mailbox::named(message.email().clone(), message.name())),
            subject: format!("New Contact Form Submission: {}", message.subject()),
            text_body,
            html_body,
        })
    }
}
