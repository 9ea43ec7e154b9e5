//! Startup and I/O failures of the terminal client.

use std::io;

use konnect_client::{ClientError, TransportError};
use konnect_core::StoreError;

/// Errors that end the terminal client.
///
/// Command failures are not in here: they are printed and the session
/// continues.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Identity file could not be read
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Chat server URL unusable
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Client could not be set up
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Terminal input or output failed
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}
