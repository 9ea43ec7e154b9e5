//! Outbound message dispatch.
//!
//! Sending never touches the message log. A sent message only shows up once
//! the server's broadcast comes back through the inbound path.

use crate::{
    error::SendError,
    session::{SessionAction, SessionConnection},
    wire::OutboundFrame,
};

/// Validates send intents against a session and encodes them for the wire.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    session: &'a SessionConnection,
}

impl<'a> Dispatcher<'a> {
    /// Dispatcher for the given session.
    pub fn new(session: &'a SessionConnection) -> Self {
        Self { session }
    }

    /// Encode `text` for the open transport.
    ///
    /// # Errors
    ///
    /// - `SendError::NotConnected` unless the session is `Open`
    /// - `SendError::EmptyMessage` if `text` is blank
    pub fn send(&self, text: &str) -> Result<SessionAction, SendError> {
        let Some(transport) = self.session.open_transport() else {
            return Err(SendError::NotConnected { state: self.session.state() });
        };

        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let frame = OutboundFrame { message: text.to_string() }
            .encode()
            .map_err(|e| SendError::Encode(e.to_string()))?;

        Ok(SessionAction::Send { transport, frame })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        session::{ConnectionState, SessionEvent},
        target::ConnectionTarget,
    };

    fn open_session() -> SessionConnection {
        let mut session = SessionConnection::new();
        session.bind(ConnectionTarget::new("team", "alice"));
        let transport = session.transport().unwrap();
        session.handle(SessionEvent::Opened { transport });
        session
    }

    #[test]
    fn send_encodes_message_frame() {
        let session = open_session();
        let action = Dispatcher::new(&session).send("yo").unwrap();

        assert_eq!(action, SessionAction::Send {
            transport: session.transport().unwrap(),
            frame: r#"{"message":"yo"}"#.to_string(),
        });
        assert!(session.log().is_empty());
    }

    #[test]
    fn send_while_connecting_is_rejected() {
        let mut session = SessionConnection::new();
        session.bind(ConnectionTarget::new("team", "alice"));

        let result = Dispatcher::new(&session).send("yo");
        assert_eq!(result, Err(SendError::NotConnected { state: ConnectionState::Connecting }));
    }

    #[test]
    fn send_while_idle_is_rejected() {
        let session = SessionConnection::new();
        assert!(matches!(
            Dispatcher::new(&session).send("yo"),
            Err(SendError::NotConnected { state: ConnectionState::Idle })
        ));
    }

    #[test]
    fn blank_message_is_rejected() {
        let session = open_session();
        assert_eq!(Dispatcher::new(&session).send("  \t"), Err(SendError::EmptyMessage));
    }

    #[test]
    fn send_while_leaving_is_rejected() {
        let mut session = open_session();
        session.unbind();
        assert!(matches!(
            Dispatcher::new(&session).send("yo"),
            Err(SendError::NotConnected { state: ConnectionState::Closing })
        ));
    }
}
