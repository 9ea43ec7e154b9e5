//! Session connection state machine.
//!
//! Owns the single transport bound to a (group, user) pair and the message
//! log fed by it. Uses the action pattern: operations and transport events go
//! in, [`SessionAction`]s come out for the driver to execute. No I/O happens
//! here, so every transition can be exercised with synthetic events.
//!
//! # State Machine
//!
//! ```text
//!            bind              Opened
//! ┌──────┐ ───────> ┌────────────┐ ───────> ┌──────┐
//! │ Idle │          │ Connecting │          │ Open │
//! └──────┘          └────────────┘          └──────┘
//!                        │   unbind / switch    │
//!                        └──────────┬───────────┘
//!                                   ↓
//!                             ┌─────────┐  Closed   ┌────────┐
//!                             │ Closing │ ────────> │ Closed │
//!                             └─────────┘           └────────┘
//! ```
//!
//! A peer or network close skips `Closing` and lands in `Closed` with the
//! errored flag set. A switch re-enters `Connecting` only after the old
//! transport reports `Closed`.
//!
//! # Transport ownership
//!
//! The live transport is an owned `Link`. It is replaced, never mutated
//! into a different connection, and a replacement is only created once the
//! previous link is gone. Every event carries the [`TransportId`] it came
//! from; events from anything but the current link are dropped.

use std::fmt;

use crate::{
    error::ConnectionError,
    log::{ChatEvent, MessageLog},
    target::ConnectionTarget,
    wire::{CloseReason, InboundFrame, NORMAL_CLOSE},
};

/// Identifies one transport instance opened by a [`SessionConnection`].
///
/// Strictly increasing per session, so a stale ID can never alias the
/// current transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransportId(pub u64);

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport#{}", self.0)
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No target bound
    Idle,
    /// Transport handshake in flight
    Connecting,
    /// Ready to send and receive
    Open,
    /// Close requested, waiting for the transport to confirm
    Closing,
    /// Transport gone
    Closed,
}

/// Transport callbacks fed into [`SessionConnection::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake completed.
    Opened {
        /// Originating transport
        transport: TransportId,
    },

    /// Text frame received.
    Frame {
        /// Originating transport
        transport: TransportId,
        /// Raw frame text
        text: String,
    },

    /// Transport-level error. A `Closed` event follows.
    Error {
        /// Originating transport
        transport: TransportId,
        /// Error description
        reason: String,
    },

    /// Transport closed, for whatever reason.
    Closed {
        /// Originating transport
        transport: TransportId,
        /// Close code. `None` if the transport ended without a close frame.
        code: Option<u16>,
        /// Close reason, possibly empty
        reason: String,
    },
}

impl SessionEvent {
    /// Transport the event originated from.
    pub fn transport(&self) -> TransportId {
        match self {
            Self::Opened { transport }
            | Self::Frame { transport, .. }
            | Self::Error { transport, .. }
            | Self::Closed { transport, .. } => *transport,
        }
    }
}

/// Actions returned by the session state machine.
///
/// The driver executes these:
/// - `Open`, `Send`, `Close`: transport operations
/// - `Deliver`, `Advisory`: notifications for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a new transport for this target
    Open {
        /// ID to tag every event of the new transport with
        transport: TransportId,
        /// Group and user to connect as
        target: ConnectionTarget,
    },

    /// Transmit a text frame
    Send {
        /// Transport to send on
        transport: TransportId,
        /// Encoded frame
        frame: String,
    },

    /// Close a transport
    Close {
        /// Transport to close
        transport: TransportId,
        /// Close code
        code: u16,
        /// Close reason
        reason: CloseReason,
    },

    /// A chat event was appended to the log
    Deliver(ChatEvent),

    /// Session-level condition the user should know about
    Advisory(ConnectionError),
}

/// The one live transport.
#[derive(Debug, Clone)]
struct Link {
    id: TransportId,
    target: ConnectionTarget,
    /// This session asked for the close. Inbound traffic is no longer
    /// accepted and the eventual `Closed` is not an error.
    close_requested: bool,
}

/// Connection lifecycle bound to a [`ConnectionTarget`].
///
/// At most one transport is live at any instant. The message log belongs to
/// exactly one target and is cleared whenever that target changes.
#[derive(Debug, Clone)]
pub struct SessionConnection {
    /// Current state
    state: ConnectionState,
    /// Most recent departure from `Open` was abnormal
    errored: bool,
    /// Target the user wants to be connected to
    target: Option<ConnectionTarget>,
    /// Live transport, if any
    link: Option<Link>,
    /// Target to open once the closing link is gone
    pending: Option<ConnectionTarget>,
    /// Next transport ID to hand out
    next_transport: u64,
    /// Events for the current target
    log: MessageLog,
}

impl Default for SessionConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConnection {
    /// Create an unbound session in [`ConnectionState::Idle`].
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            errored: false,
            target: None,
            link: None,
            pending: None,
            next_transport: 1,
            log: MessageLog::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Most recent transition away from `Open` was abnormal.
    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Bound target. `None` if unbound.
    pub fn target(&self) -> Option<&ConnectionTarget> {
        self.target.as_ref()
    }

    /// Target waiting for the current transport to finish closing.
    pub fn pending_target(&self) -> Option<&ConnectionTarget> {
        self.pending.as_ref()
    }

    /// Live transport (connecting, open or closing). `None` if none.
    pub fn transport(&self) -> Option<TransportId> {
        self.link.as_ref().map(|link| link.id)
    }

    /// Transport that may carry outbound frames. `None` unless `Open`.
    pub fn open_transport(&self) -> Option<TransportId> {
        match (&self.link, self.state) {
            (Some(link), ConnectionState::Open) if !link.close_requested => Some(link.id),
            _ => None,
        }
    }

    /// Events received for the bound target, in arrival order.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Bind the session to `target`.
    ///
    /// - Same target while `Connecting`/`Open` (or already queued behind a
    ///   closing transport): no-op.
    /// - Incomplete target: no network action. Tears down a live transport
    ///   like [`Self::unbind`], otherwise the session goes `Idle`.
    /// - Live transport for another target: close it with
    ///   [`CloseReason::Switching`]; the new transport opens when the close
    ///   completes.
    /// - Nothing live: open a transport now.
    pub fn bind(&mut self, target: ConnectionTarget) -> Vec<SessionAction> {
        if !target.is_complete() {
            if self.link.is_some() {
                return self.unbind();
            }
            self.target = None;
            self.pending = None;
            self.log.clear();
            self.state = ConnectionState::Idle;
            return vec![];
        }

        if self.target.as_ref() == Some(&target) {
            let queued = self.pending.as_ref() == Some(&target);
            match self.state {
                ConnectionState::Connecting | ConnectionState::Open => return vec![],
                ConnectionState::Closing if queued => return vec![],
                _ => {},
            }
        }

        self.log.clear();
        self.target = Some(target.clone());

        match &mut self.link {
            Some(link) if !link.close_requested => {
                tracing::info!(from = %link.target, to = %target, "switching target");
                link.close_requested = true;
                let transport = link.id;
                self.pending = Some(target);
                self.state = ConnectionState::Closing;
                vec![SessionAction::Close {
                    transport,
                    code: NORMAL_CLOSE,
                    reason: CloseReason::Switching,
                }]
            },
            Some(_) => {
                // Close already in flight; open once it lands.
                self.pending = Some(target);
                self.state = ConnectionState::Closing;
                vec![]
            },
            None => self.open(target),
        }
    }

    /// Re-open the bound target after the transport was lost.
    ///
    /// Only acts from `Closed` with a target still bound; otherwise returns
    /// no actions.
    pub fn rebind(&mut self) -> Vec<SessionAction> {
        match (&self.target, self.state) {
            (Some(target), ConnectionState::Closed) if self.link.is_none() => {
                let target = target.clone();
                self.bind(target)
            },
            _ => vec![],
        }
    }

    /// Leave the bound target.
    ///
    /// Closes any live transport with [`CloseReason::Leaving`], clears the
    /// log and forgets the target.
    pub fn unbind(&mut self) -> Vec<SessionAction> {
        self.target = None;
        self.pending = None;
        self.log.clear();

        match &mut self.link {
            Some(link) if !link.close_requested => {
                tracing::info!(bound = %link.target, "leaving");
                link.close_requested = true;
                let transport = link.id;
                self.state = ConnectionState::Closing;
                vec![SessionAction::Close {
                    transport,
                    code: NORMAL_CLOSE,
                    reason: CloseReason::Leaving,
                }]
            },
            Some(_) => {
                self.state = ConnectionState::Closing;
                vec![]
            },
            None => {
                if self.state != ConnectionState::Idle {
                    self.state = ConnectionState::Closed;
                }
                vec![]
            },
        }
    }

    /// Process a transport event.
    ///
    /// Events from a transport other than the live one are dropped.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        let Some(link) = self.link.as_ref().filter(|link| link.id == event.transport()) else {
            tracing::debug!(transport = %event.transport(), "dropping event from stale transport");
            return vec![];
        };
        let close_requested = link.close_requested;

        match event {
            SessionEvent::Opened { transport } => {
                if close_requested || self.state != ConnectionState::Connecting {
                    tracing::debug!(%transport, state = ?self.state, "ignoring late open");
                    return vec![];
                }

                tracing::info!(%transport, bound = %link.target, "session open");
                self.state = ConnectionState::Open;
                self.errored = false;
                self.log.clear();
                vec![]
            },

            SessionEvent::Frame { transport, text } => {
                if close_requested || self.state != ConnectionState::Open {
                    tracing::debug!(%transport, state = ?self.state, "ignoring frame");
                    return vec![];
                }

                match InboundFrame::parse(&text) {
                    Ok(frame) => {
                        let event = self.log.record(
                            frame.sender_or_system(),
                            frame.message.as_str(),
                            frame.kind.into(),
                        );
                        vec![SessionAction::Deliver(event.clone())]
                    },
                    Err(e) => {
                        tracing::debug!(%transport, error = %e, "dropping malformed frame");
                        vec![]
                    },
                }
            },

            SessionEvent::Error { transport, reason } => {
                if close_requested {
                    tracing::debug!(%transport, %reason, "error on closing transport");
                    return vec![];
                }

                tracing::warn!(%transport, %reason, "transport error");
                self.errored = true;
                vec![SessionAction::Advisory(ConnectionError::Transport(reason))]
            },

            SessionEvent::Closed { transport, code, reason } => {
                self.link = None;
                self.state = ConnectionState::Closed;

                if close_requested {
                    tracing::debug!(%transport, ?code, "transport closed");
                    return match self.pending.take() {
                        Some(next) => self.open(next),
                        None => vec![],
                    };
                }

                tracing::warn!(%transport, ?code, %reason, "connection lost");
                self.errored = true;
                if self.target.is_some() {
                    vec![SessionAction::Advisory(ConnectionError::Lost { code, reason })]
                } else {
                    vec![]
                }
            },
        }
    }

    fn open(&mut self, target: ConnectionTarget) -> Vec<SessionAction> {
        let transport = TransportId(self.next_transport);
        self.next_transport += 1;

        tracing::info!(%transport, %target, "connecting");
        self.link = Some(Link { id: transport, target: target.clone(), close_requested: false });
        self.state = ConnectionState::Connecting;

        vec![SessionAction::Open { transport, target }]
    }
}
