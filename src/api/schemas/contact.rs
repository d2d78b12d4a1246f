use crate::domain::contact::FieldError;
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Message sent successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

impl ContactResponse {
    #[must_use]
    pub fn sent() -> Self {
        Self { success: true, message: SUCCESS_MESSAGE.to_string() }
    }
}

/// Body of every non-2xx JSON answer. `details` is only present for
/// validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}
