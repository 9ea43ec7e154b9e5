//! WebSocket transport.
//!
//! Each transport is one spawned task owning one `tokio-tungstenite`
//! connection. The connector talks to a task through a command channel and
//! every task reports back on the shared [`SessionEvent`] channel, tagged with
//! its [`TransportId`]. Tasks outliving their session is harmless: the core
//! drops events from transports it no longer owns.

use std::{collections::HashMap, time::Duration};

use futures::{SinkExt, StreamExt};
use konnect_core::{CloseReason, ConnectionTarget, SessionEvent, TransportId};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    Message,
    protocol::{CloseFrame, frame::coding::CloseCode},
};
use url::Url;

use crate::{connector::Connector, error::TransportError};

/// How long to wait for the peer to answer our close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Close code reported when the peer's close frame carried no status.
const NO_STATUS: u16 = 1005;

/// Instructions from the connector to a link task.
#[derive(Debug)]
enum Command {
    Send(String),
    Close { code: u16, reason: CloseReason },
}

/// [`Connector`] over WebSockets.
///
/// Must be used from within a tokio runtime: [`Connector::open`] spawns the
/// link task.
#[derive(Debug)]
pub struct WsConnector {
    base: Url,
    events: mpsc::UnboundedSender<SessionEvent>,
    links: HashMap<TransportId, mpsc::UnboundedSender<Command>>,
}

impl WsConnector {
    /// Connector for the chat server at `ws_url`, plus the receiver its
    /// transports report to.
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidUrl` unless `ws_url` is an absolute `ws://`
    ///   or `wss://` URL
    pub fn new(
        ws_url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), TransportError> {
        let invalid =
            |reason: String| TransportError::InvalidUrl { url: ws_url.to_string(), reason };

        let base = Url::parse(ws_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "ws" | "wss") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        if base.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_string()));
        }

        let (events, receiver) = mpsc::unbounded_channel();
        Ok((Self { base, events, links: HashMap::new() }, receiver))
    }

    /// `{base}/ws/{group_id}/{user_name}`, both halves percent-encoded.
    pub fn url_for(&self, target: &ConnectionTarget) -> Url {
        let mut url = self.base.clone();
        // Checked in `new`: the base can carry path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "ws",
                target.group_id.as_str(),
                target.user_name.as_str(),
            ]);
        }
        url
    }

    /// Transports whose task is still running.
    pub fn live_links(&self) -> usize {
        self.links.values().filter(|tx| !tx.is_closed()).count()
    }
}

impl Connector for WsConnector {
    fn open(&mut self, transport: TransportId, target: &ConnectionTarget) {
        self.links.retain(|_, tx| !tx.is_closed());

        let url = self.url_for(target);
        tracing::info!(%transport, %url, "opening websocket");

        let (tx, rx) = mpsc::unbounded_channel();
        self.links.insert(transport, tx);
        tokio::spawn(run_link(transport, url, rx, self.events.clone()));
    }

    fn send(&mut self, transport: TransportId, frame: String) {
        match self.links.get(&transport) {
            Some(tx) if tx.send(Command::Send(frame)).is_ok() => {},
            _ => tracing::debug!(%transport, "send on finished transport dropped"),
        }
    }

    fn close(&mut self, transport: TransportId, code: u16, reason: CloseReason) {
        match self.links.remove(&transport) {
            Some(tx) if tx.send(Command::Close { code, reason }).is_ok() => {},
            _ => tracing::debug!(%transport, "close on finished transport ignored"),
        }
    }
}

fn emit(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        tracing::debug!("session event receiver dropped");
    }
}

fn lost(events: &mpsc::UnboundedSender<SessionEvent>, transport: TransportId, reason: String) {
    emit(events, SessionEvent::Error { transport, reason });
    emit(events, SessionEvent::Closed { transport, code: None, reason: String::new() });
}

/// Drive one connection from handshake to close.
async fn run_link(
    transport: TransportId,
    url: Url,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let connect = tokio_tungstenite::connect_async(url.as_str());
    tokio::pin!(connect);

    let stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    tracing::warn!(%transport, error = %e, "websocket handshake failed");
                    lost(&events, transport, e.to_string());
                    return;
                },
            },
            command = commands.recv() => match command {
                Some(Command::Send(_)) => {
                    tracing::debug!(%transport, "dropping frame queued before open");
                },
                Some(Command::Close { code, reason }) => {
                    // Handshake abandoned; nothing to tell the peer.
                    emit(&events, SessionEvent::Closed {
                        transport,
                        code: Some(code),
                        reason: reason.as_str().to_string(),
                    });
                    return;
                },
                None => return,
            },
        }
    };

    emit(&events, SessionEvent::Opened { transport });
    let (mut sink, mut inbound) = stream.split();

    loop {
        tokio::select! {
            message = inbound.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    emit(&events, SessionEvent::Frame { transport, text });
                },
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
                        None => (NO_STATUS, String::new()),
                    };
                    tracing::info!(%transport, code, %reason, "peer closed websocket");
                    emit(&events, SessionEvent::Closed { transport, code: Some(code), reason });
                    return;
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::warn!(%transport, error = %e, "websocket read failed");
                    lost(&events, transport, e.to_string());
                    return;
                },
                None => {
                    tracing::warn!(%transport, "websocket ended without close frame");
                    emit(&events, SessionEvent::Closed {
                        transport,
                        code: None,
                        reason: String::new(),
                    });
                    return;
                },
            },

            command = commands.recv() => match command {
                Some(Command::Send(frame)) => {
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        tracing::warn!(%transport, error = %e, "websocket write failed");
                        lost(&events, transport, e.to_string());
                        return;
                    }
                },
                Some(Command::Close { code, reason }) => {
                    let frame =
                        CloseFrame { code: CloseCode::from(code), reason: reason.as_str().into() };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        tracing::debug!(%transport, error = %e, "close frame not sent");
                    }
                    await_close_reply(&mut inbound).await;
                    emit(&events, SessionEvent::Closed {
                        transport,
                        code: Some(code),
                        reason: reason.as_str().to_string(),
                    });
                    return;
                },
                None => {
                    if let Err(e) = sink.close().await {
                        tracing::debug!(%transport, error = %e, "close on drop failed");
                    }
                    return;
                },
            },
        }
    }
}

/// Wait (bounded) for the peer to acknowledge our close frame.
async fn await_close_reply<S>(inbound: &mut S)
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let drain = async {
        while let Some(message) = inbound.next().await {
            if matches!(message, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    };
    if tokio::time::timeout(CLOSE_TIMEOUT, drain).await.is_err() {
        tracing::debug!("peer did not acknowledge close");
    }
}
