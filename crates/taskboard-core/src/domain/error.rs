//! Domain Layer - Errors

use thiserror::Error;

/// Common result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures surfaced by the resource client and the layers above it.
///
/// "No data" answers that the backend encodes as error statuses never show
/// up here; the client turns them into empty collections per endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never reached the server or no response came back.
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Request { status: u16, message: String },

    /// The read was aborted by its owner; never shown to the user.
    #[error("request cancelled")]
    Cancelled,

    /// Another reconciliation for the same resource is still running.
    #[error("{0} is already being saved")]
    Busy(String),

    /// A write needs the signed-in user and there is none.
    #[error("not signed in")]
    NotSignedIn,

    /// Input rejected before anything was sent.
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl ClientError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short text for the UI. Never a bare status code.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => "Could not reach the server".to_string(),
            ClientError::Request { message, .. } => message.clone(),
            ClientError::Cancelled => String::new(),
            ClientError::Busy(_) => "A save is already in progress".to_string(),
            ClientError::NotSignedIn => "Please sign in again".to_string(),
            ClientError::Invalid(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
