use email_address::EmailAddress;

/// A fully rendered outbound email, independent of any provider's wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Mailbox,
    pub from: Mailbox,
    pub reply_to: Option<Mailbox>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub address: EmailAddress,
    pub name: Option<String>,
}

impl Mailbox {
    #[must_use]
    pub const fn new(address: EmailAddress) -> Self {
        Self { address, name: None }
    }

    #[must_use]
    pub fn named(address: EmailAddress, name: impl Into<String>) -> Self {
        Self { address, name: Some(name.into()) }
    }
}

/// Outcome of a single delivery attempt.
///
/// `error` holds the diagnostic for logs; it is never shown to submitters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDeliveryResult {
    pub delivered: bool,
    pub error: Option<String>,
}

impl EmailDeliveryResult {
    #[must_use]
    pub const fn delivered() -> Self {
        Self { delivered: true, error: None }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self { delivered: false, error: Some(error.into()) }
    }
}
