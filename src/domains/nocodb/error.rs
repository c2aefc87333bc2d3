//! NocoDB client error types.

use thiserror::Error;

/// Errors that can occur while talking to the NocoDB instance.
#[derive(Debug, Error)]
pub enum NocoError {
    /// No API token is available for this call. Fatal to the call, not to
    /// the process.
    #[error("NocoDB API token is not configured")]
    MissingToken,

    /// Transport failure reaching NocoDB (DNS, timeout, refusal) or a
    /// malformed response body.
    #[error("NocoDB request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// NocoDB replied with a non-success status code.
    #[error("NocoDB returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl NocoError {
    /// Create a status error from a response status and body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}
