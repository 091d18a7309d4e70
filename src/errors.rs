use thiserror::Error;

use crate::constants::{INVALID_CREDENTIALS_MSG, UNEXPECTED_ERROR_MSG};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend rejected the credential (401)")]
    Unauthorized,
    #[error("backend answered with status {0}")]
    Status(u16),
    #[error("backend reported failure: {0}")]
    Unsuccessful(String),
    #[error("response carried no data")]
    MissingData,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Message shown to the operator on the login form.
    pub fn login_message(&self) -> &'static str {
        if self.is_unauthorized() {
            INVALID_CREDENTIALS_MSG
        } else {
            UNEXPECTED_ERROR_MSG
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("no config directory available for the credential file")]
    NoConfigDir,
    #[error("credential file i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
}
