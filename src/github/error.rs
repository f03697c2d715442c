//! Registration error type.
//!
//! Hook create/delete calls are single-attempt; there is no retry
//! categorization here. What matters is that GitHub's own diagnostics
//! (status code and error message) survive into the error value instead
//! of being swallowed.

use std::fmt;

use thiserror::Error;

/// A failed create/delete call against the hooks API.
#[derive(Debug, Error)]
pub struct RegistrationError {
    /// HTTP status, when the API answered at all.
    pub status: Option<u16>,

    /// GitHub's error message, or the transport error text.
    pub message: String,

    /// The underlying octocrab error, if there was one.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "hooks API error (HTTP {}): {}", status, self.message),
            None => write!(f, "hooks API error: {}", self.message),
        }
    }
}

impl RegistrationError {
    /// Wraps an octocrab error, lifting out GitHub's status and message
    /// when the API rejected the call.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => RegistrationError {
                status: Some(source.status_code.as_u16()),
                message: source.message.clone(),
                source: Some(err),
            },
            _ => RegistrationError {
                status: None,
                message: err.to_string(),
                source: Some(err),
            },
        }
    }

    /// Builds an error from a raw response status and body.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        RegistrationError {
            status: Some(status),
            message: body.into(),
            source: None,
        }
    }
}
