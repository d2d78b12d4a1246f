use email_address::{EmailAddress, Options};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 256;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const SUBJECT_MIN_CHARS: usize = 5;
pub const SUBJECT_MAX_CHARS: usize = 256;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 4096;

/// A form field of the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Subject, Self::Message];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::Message => "message",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Subject => "Subject",
            Self::Message => "Message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violated rule, attached to the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn new(field: Field, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Raw, untrusted contact form input.
///
/// Missing JSON fields deserialize as empty strings so they are reported as
/// field errors rather than as a malformed body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// A contact message that passed every validation rule.
///
/// Only [`ContactForm::validate`] produces one, so holding a `ContactMessage`
/// means the input is safe to forward to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    name: String,
    email: EmailAddress,
    subject: String,
    message: String,
}

impl ContactMessage {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ContactForm {
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Subject => &mut self.subject,
            Field::Message => &mut self.message,
        };
        *slot = value.into();
    }

    /// Reads the form out of a decoded JSON object.
    ///
    /// Absent and `null` fields become empty strings. A field holding any
    /// other non-string value is reported by name, together with the rule
    /// violations of the remaining fields. Unknown keys are ignored.
    ///
    /// # Errors
    /// Returns the complete list of field errors, in field order, when any
    /// field has the wrong type.
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut form = Self::default();
        let mut mistyped = Vec::new();

        for field in Field::ALL {
            match object.get(field.as_str()) {
                None | Some(Value::Null) => {}
                Some(Value::String(value)) => form.set(field, value.as_str()),
                Some(_) => mistyped.push(field),
            }
        }

        if mistyped.is_empty() {
            return Ok(form);
        }

        let rule_errors = form.validate().err().unwrap_or_default();
        let errors = Field::ALL
            .into_iter()
            .filter_map(|field| {
                if mistyped.contains(&field) {
                    Some(FieldError::new(field, format!("{} must be text", field.label())))
                } else {
                    rule_errors.iter().find(|e| e.field == field).cloned()
                }
            })
            .collect();

        Err(errors)
    }

    /// Checks every rule and returns either the validated message or the
    /// complete list of violations, in field order.
    ///
    /// # Errors
    /// Returns one `FieldError` per violated field.
    pub fn validate(&self) -> Result<ContactMessage, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if let Some(message) = check_length(name, NAME_MIN_CHARS, NAME_MAX_CHARS, Field::Name.label()) {
            errors.push(FieldError::new(Field::Name, message));
        }

        let email = parse_email(&self.email);
        if email.is_none() {
            errors.push(FieldError::new(Field::Email, "Please enter a valid email"));
        }

        let subject = self.subject.trim();
        if let Some(message) = check_length(subject, SUBJECT_MIN_CHARS, SUBJECT_MAX_CHARS, Field::Subject.label()) {
            errors.push(FieldError::new(Field::Subject, message));
        }

        let message = self.message.trim();
        if let Some(msg) = check_length(message, MESSAGE_MIN_CHARS, MESSAGE_MAX_CHARS, Field::Message.label()) {
            errors.push(FieldError::new(Field::Message, msg));
        }

        match email {
            Some(email) if errors.is_empty() => Ok(ContactMessage {
                name: name.to_string(),
                email,
                subject: subject.to_string(),
                message: message.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

fn check_length(value: &str, min: usize, max: usize, label: &str) -> Option<String> {
    let len = value.chars().count();
    if len < min {
        Some(format!("{label} must be at least {min} characters"))
    } else if len > max {
        Some(format!("{label} must be at most {max} characters"))
    } else {
        None
    }
}

/// Accepts addresses with a dotted domain whose last label is at least two
/// letters, on top of the RFC syntax check.
fn parse_email(raw: &str) -> Option<EmailAddress> {
    let candidate = raw.trim().to_lowercase();
    if candidate.chars().count() > EMAIL_MAX_CHARS {
        return None;
    }

    let options = Options::default().with_required_tld().without_domain_literal().without_display_text();
    let address = EmailAddress::parse_with_options(&candidate, options).ok()?;
    let (_, tld) = address.domain().rsplit_once('.')?;
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    tld_ok.then_some(address)
}
