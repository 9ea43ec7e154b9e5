//! Error types for the Konnect core.
//!
//! One enum per failure domain. Validation, directory, send and storage
//! errors are returned synchronously to the caller that triggered them and
//! never mutate session state. [`ConnectionError`] is different: it is never
//! returned from a call, only surfaced asynchronously as
//! [`crate::SessionAction::Advisory`].

use thiserror::Error;

use crate::session::ConnectionState;

/// Rejected user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Display name was empty after trimming.
    #[error("name cannot be empty")]
    EmptyName,

    /// Group name was empty after trimming.
    #[error("group name cannot be empty")]
    EmptyGroupName,

    /// Group ID was empty after trimming.
    #[error("group id cannot be empty")]
    EmptyGroupId,
}

/// A request/response call to the group directory failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The service answered with an error body or an unexpected status.
    #[error("directory rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code returned by the service
        status: u16,
        /// Human-readable cause from the `error` field
        message: String,
    },

    /// The request never produced a response.
    #[error("directory unreachable: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("malformed directory response: {0}")]
    Decode(String),
}

/// Abnormal transport condition while a target was expected to be active.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Transport closed without this client asking for it.
    #[error("connection lost, rejoin")]
    Lost {
        /// Close code, if the peer sent one
        code: Option<u16>,
        /// Close reason reported by the transport
        reason: String,
    },

    /// Transport reported an error. A close notification follows.
    #[error("connection error: {0}")]
    Transport(String),
}

impl ConnectionError {
    /// Returns true if the session is gone and only an explicit rejoin can
    /// restore it.
    ///
    /// Transport errors are advisory on their own; the close that follows
    /// decides whether the session survived.
    pub fn requires_rejoin(&self) -> bool {
        matches!(self, Self::Lost { .. })
    }
}

/// Outbound message rejected by the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No open connection to send through.
    #[error("not connected (state: {state:?})")]
    NotConnected {
        /// Session state at the time of the attempt
        state: ConnectionState,
    },

    /// Message was empty after trimming.
    #[error("message cannot be empty")]
    EmptyMessage,

    /// Message could not be encoded as a frame.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Durable key-value slot could not be read or written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("identity storage failed: {0}")]
pub struct StoreError(pub String);

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// Errors from [`crate::IdentityStore::set`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Name failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Name was valid but could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_connection_requires_rejoin() {
        let lost = ConnectionError::Lost { code: Some(1006), reason: String::new() };
        assert!(lost.requires_rejoin());
        assert_eq!(lost.to_string(), "connection lost, rejoin");

        assert!(!ConnectionError::Transport("reset by peer".to_string()).requires_rejoin());
    }

    #[test]
    fn rejected_directory_error_keeps_server_message() {
        let err = DirectoryError::Rejected {
            status: 404,
            message: "User 'carol' not found. Please set username first.".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("carol"));
    }

    #[test]
    fn identity_error_is_transparent() {
        let err = IdentityError::from(ValidationError::EmptyName);
        assert_eq!(err.to_string(), "name cannot be empty");
    }
}
