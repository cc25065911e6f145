use thiserror::Error;

/// Failure of a client-side action. The `Display` text is what the UI shows.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected locally before any request was sent
    #[error("{0}")]
    Validation(String),
    /// Non-2xx response; `message` is the server's `message` field
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Connection, timeout or decoding failure
    #[error("{0}")]
    Transport(String),
    #[error("Not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
