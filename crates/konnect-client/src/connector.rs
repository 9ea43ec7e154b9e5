//! Transport seam.
//!
//! A [`Connector`] executes the transport half of [`SessionAction`]s. Calls
//! return immediately; the outcome of each operation (handshake, inbound
//! frames, errors, close) is reported later as a
//! [`konnect_core::SessionEvent`] on the channel handed out when the
//! connector was built.
//!
//! [`SessionAction`]: konnect_core::SessionAction

use konnect_core::{CloseReason, ConnectionTarget, TransportId};

/// Non-blocking transport operations.
pub trait Connector {
    /// Start opening a transport for `target`, tagged `transport`.
    ///
    /// Reports `Opened` on success, or `Error` followed by `Closed` if the
    /// handshake fails.
    fn open(&mut self, transport: TransportId, target: &ConnectionTarget);

    /// Queue a text frame on an open transport. Unknown transports are
    /// ignored.
    fn send(&mut self, transport: TransportId, frame: String);

    /// Start closing a transport. A `Closed` event follows.
    fn close(&mut self, transport: TransportId, code: u16, reason: CloseReason);
}
