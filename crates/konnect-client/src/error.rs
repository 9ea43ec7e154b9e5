//! Client error types.

use konnect_core::{DirectoryError, IdentityError, SendError, StoreError, ValidationError};
use thiserror::Error;

/// Errors returned by [`crate::Runtime`] operations.
///
/// Every variant is returned synchronously to the caller and leaves session
/// state unchanged. Connection failures are not errors here; they arrive as
/// [`crate::Notice::Advisory`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Operation needs a display name and none is set.
    #[error("no name set, choose one first")]
    NoIdentity,

    /// Operation needs a selected group and none is.
    #[error("not in a group")]
    NoGroup,

    /// Input rejected before any remote call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Directory call failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Identity could not be stored.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Identity slot could not be read or cleared.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Message rejected by the dispatcher.
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Transport construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Base URL could not be parsed or cannot carry path segments.
    #[error("invalid websocket url '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },
}
