//! Error types for the Trove client core.

/// Top-level error type for the client core.
#[derive(Debug, thiserror::Error)]
pub enum TroveError {
    /// Network-level failure reaching the remote service.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the remote service.
    ///
    /// Carries the HTTP status and the server's `error` message when one was
    /// present in the response body.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Configuration error (a missing config file is not an error; parse
    /// failures are).
    #[error("config error: {0}")]
    Config(String),

    /// Session / authentication error.
    #[error("auth error: {0}")]
    Auth(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TroveError {
    /// The user-facing message for this error.
    ///
    /// Remote errors surface the server-provided message verbatim, matching
    /// what the portal backend puts in its `error` field.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TroveError>;
