//! Simulated chat server and transports.
//!
//! Connector calls only queue an operation. Nothing reaches the server until
//! the test calls [`SimNetwork::deliver`], which lets tests interleave user
//! operations with transport completions in any order they like.
//!
//! The server behaves like the production one: on connect it announces
//! `User '<name>' joined the chat.` to the group (the newcomer included),
//! every message is broadcast to all members including the sender, and a
//! departure is announced to whoever remains.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use konnect_client::Connector;
use konnect_core::{CloseReason, ConnectionTarget, SessionEvent, TransportId};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Identifies one simulated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

type LinkKey = (ClientId, TransportId);

/// A transport the server has accepted.
struct SimLink {
    target: ConnectionTarget,
    events: mpsc::UnboundedSender<SessionEvent>,
}

/// Operation issued by a connector, not yet seen by the server.
enum Op {
    Open {
        key: LinkKey,
        target: ConnectionTarget,
        events: mpsc::UnboundedSender<SessionEvent>,
    },
    Send { key: LinkKey, frame: String },
    Close { key: LinkKey, code: u16, reason: CloseReason },
}

impl Op {
    fn key(&self) -> LinkKey {
        match self {
            Self::Open { key, .. } | Self::Send { key, .. } | Self::Close { key, .. } => *key,
        }
    }
}

#[derive(Default)]
struct NetworkState {
    links: BTreeMap<LinkKey, SimLink>,
    queue: VecDeque<Op>,
    next_client: u64,
    refuse_handshakes: bool,
}

impl NetworkState {
    fn emit(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
        if events.send(event).is_err() {
            tracing::debug!("simulated client is gone");
        }
    }

    fn broadcast(&self, group_id: &str, payload: &Value) {
        let text = payload.to_string();
        for ((_, transport), link) in &self.links {
            if link.target.group_id == group_id {
                Self::emit(&link.events, SessionEvent::Frame {
                    transport: *transport,
                    text: text.clone(),
                });
            }
        }
    }

    fn announce(&self, group_id: &str, message: String) {
        self.broadcast(group_id, &json!({ "type": "system", "message": message }));
    }

    fn process(&mut self, op: Op) {
        match op {
            Op::Open { key, target, events } => {
                if self.refuse_handshakes {
                    tracing::debug!(client = %key.0, transport = %key.1, "refusing handshake");
                    Self::emit(&events, SessionEvent::Error {
                        transport: key.1,
                        reason: "connection refused".to_string(),
                    });
                    Self::emit(&events, SessionEvent::Closed {
                        transport: key.1,
                        code: None,
                        reason: String::new(),
                    });
                    return;
                }

                Self::emit(&events, SessionEvent::Opened { transport: key.1 });
                let group_id = target.group_id.clone();
                let user = target.user_name.clone();
                self.links.insert(key, SimLink { target, events });
                self.announce(&group_id, format!("User '{user}' joined the chat."));
            },

            Op::Send { key, frame } => {
                let Some(link) = self.links.get(&key) else {
                    tracing::debug!(client = %key.0, transport = %key.1, "send on closed link");
                    return;
                };
                let message = match serde_json::from_str::<Value>(&frame) {
                    Ok(body) => {
                        body.get("message").and_then(Value::as_str).unwrap_or_default().to_string()
                    },
                    Err(e) => {
                        tracing::debug!(error = %e, "server ignoring malformed frame");
                        return;
                    },
                };
                let payload = json!({
                    "type": "chat",
                    "sender": link.target.user_name,
                    "groupId": link.target.group_id,
                    "message": message,
                });
                let group_id = link.target.group_id.clone();
                self.broadcast(&group_id, &payload);
            },

            Op::Close { key, code, reason } => {
                if let Some(link) = self.links.remove(&key) {
                    Self::emit(&link.events, SessionEvent::Closed {
                        transport: key.1,
                        code: Some(code),
                        reason: reason.as_str().to_string(),
                    });
                    self.announce(
                        &link.target.group_id,
                        format!("User '{}' left the chat.", link.target.user_name),
                    );
                }
            },
        }
    }

    fn drop_link(&mut self, key: LinkKey) -> bool {
        let Some(link) = self.links.remove(&key) else {
            return false;
        };
        Self::emit(&link.events, SessionEvent::Closed {
            transport: key.1,
            code: None,
            reason: String::new(),
        });
        self.announce(
            &link.target.group_id,
            format!("User '{}' left the chat.", link.target.user_name),
        );
        true
    }
}

/// Shared simulated chat server.
///
/// Cheap to clone; clones share the same server.
#[derive(Clone, Default)]
pub struct SimNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl SimNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a new client. Returns its connector and the receiver the
    /// client runtime reads transport events from.
    pub fn connector(&self) -> (SimConnector, mpsc::UnboundedReceiver<SessionEvent>) {
        let mut state = self.lock();
        state.next_client += 1;
        let client = ClientId(state.next_client);
        drop(state);

        let (events, receiver) = mpsc::unbounded_channel();
        (SimConnector { client, network: self.clone(), events }, receiver)
    }

    /// Let the server process every queued operation, in issue order.
    ///
    /// Returns the number of operations processed.
    pub fn deliver(&self) -> usize {
        let mut state = self.lock();
        let mut processed = 0;
        while let Some(op) = state.queue.pop_front() {
            state.process(op);
            processed += 1;
        }
        processed
    }

    /// Process queued operations of one client only, leaving the rest queued.
    pub fn deliver_for(&self, client: ClientId) -> usize {
        let mut state = self.lock();
        let (mine, rest): (VecDeque<Op>, VecDeque<Op>) =
            state.queue.drain(..).partition(|op| op.key().0 == client);
        state.queue = rest;
        let processed = mine.len();
        for op in mine {
            state.process(op);
        }
        processed
    }

    /// Operations waiting for [`Self::deliver`].
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Make subsequent handshakes fail with an error and an unclean close.
    pub fn refuse_handshakes(&self, refuse: bool) {
        self.lock().refuse_handshakes = refuse;
    }

    /// Drop every link of `client` without a close frame.
    ///
    /// Returns the number of links dropped.
    pub fn drop_client(&self, client: ClientId) -> usize {
        let mut state = self.lock();
        let keys: Vec<_> = state.links.keys().filter(|(c, _)| *c == client).copied().collect();
        keys.into_iter().filter(|key| state.drop_link(*key)).count()
    }

    /// Close a link from the server side with a close frame.
    pub fn server_close(&self, client: ClientId, transport: TransportId, code: u16, reason: &str) {
        let mut state = self.lock();
        if let Some(link) = state.links.remove(&(client, transport)) {
            NetworkState::emit(&link.events, SessionEvent::Closed {
                transport,
                code: Some(code),
                reason: reason.to_string(),
            });
        }
    }

    /// Push a raw text frame to one link, bypassing the server.
    pub fn inject_frame(&self, client: ClientId, transport: TransportId, text: &str) {
        let state = self.lock();
        if let Some(link) = state.links.get(&(client, transport)) {
            NetworkState::emit(&link.events, SessionEvent::Frame {
                transport,
                text: text.to_string(),
            });
        }
    }

    /// Report a transport error on one link without closing it.
    pub fn inject_error(&self, client: ClientId, transport: TransportId, reason: &str) {
        let state = self.lock();
        if let Some(link) = state.links.get(&(client, transport)) {
            NetworkState::emit(&link.events, SessionEvent::Error {
                transport,
                reason: reason.to_string(),
            });
        }
    }

    /// Links the server holds for `client`.
    pub fn links_of(&self, client: ClientId) -> Vec<TransportId> {
        self.lock().links.keys().filter(|(c, _)| *c == client).map(|(_, t)| *t).collect()
    }

    /// Links held plus opens still queued for `client`.
    ///
    /// This is the number of transports the client could be using once
    /// everything queued lands.
    pub fn live_transports(&self, client: ClientId) -> usize {
        let state = self.lock();
        let linked = state.links.keys().filter(|(c, _)| *c == client).count();
        let opening = state
            .queue
            .iter()
            .filter(|op| matches!(op, Op::Open { key, .. } if key.0 == client))
            .count();
        linked + opening
    }

    /// Names of users currently connected to `group_id`, in link order.
    pub fn members(&self, group_id: &str) -> Vec<String> {
        self.lock()
            .links
            .values()
            .filter(|link| link.target.group_id == group_id)
            .map(|link| link.target.user_name.clone())
            .collect()
    }
}

/// Per-client [`Connector`] attached to a [`SimNetwork`].
pub struct SimConnector {
    client: ClientId,
    network: SimNetwork,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SimConnector {
    /// Client this connector belongs to.
    pub fn client(&self) -> ClientId {
        self.client
    }

    fn enqueue(&self, op: Op) {
        self.network.lock().queue.push_back(op);
    }
}

impl Connector for SimConnector {
    fn open(&mut self, transport: TransportId, target: &ConnectionTarget) {
        self.enqueue(Op::Open {
            key: (self.client, transport),
            target: target.clone(),
            events: self.events.clone(),
        });
    }

    fn send(&mut self, transport: TransportId, frame: String) {
        self.enqueue(Op::Send { key: (self.client, transport), frame });
    }

    fn close(&mut self, transport: TransportId, code: u16, reason: CloseReason) {
        self.enqueue(Op::Close { key: (self.client, transport), code, reason });
    }
}
