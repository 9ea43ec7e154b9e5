//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use konnect_core::{ConnectionState, ConnectionTarget, TransportId};

use crate::{SimNetwork, SimRuntime, sim_network::ClientId};

/// Snapshot of the entire system state.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Capture every given runtime together with what `network` holds for it.
    pub fn capture<'a>(
        network: &SimNetwork,
        runtimes: impl IntoIterator<Item = &'a SimRuntime>,
    ) -> Self {
        Self {
            clients: runtimes
                .into_iter()
                .map(|runtime| ClientSnapshot::capture(network, runtime))
                .collect(),
        }
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub client: ClientId,
    /// Connection state.
    pub state: ConnectionState,
    /// Errored side-flag.
    pub errored: bool,
    /// Identity name, if set.
    pub identity: Option<String>,
    /// Selected group ID, if any.
    pub group: Option<String>,
    /// Target the session is bound to.
    pub target: Option<ConnectionTarget>,
    /// Transport usable for sending.
    pub open_transport: Option<TransportId>,
    /// Sequence numbers of the logged events, in log order.
    pub sequences: Vec<u64>,
    /// Transports the network holds or is about to open for this client.
    pub live_transports: usize,
}

impl ClientSnapshot {
    /// Capture one runtime.
    pub fn capture(network: &SimNetwork, runtime: &SimRuntime) -> Self {
        let client = runtime.connector().client();
        let manager = runtime.manager();
        let session = manager.session();

        Self {
            client,
            state: session.state(),
            errored: session.is_errored(),
            identity: manager.identity().map(|i| i.name.clone()),
            group: manager.group().map(|g| g.id.clone()),
            target: session.target().cloned(),
            open_transport: session.open_transport(),
            sequences: session.log().all().iter().map(|e| e.sequence).collect(),
            live_transports: network.live_transports(client),
        }
    }
}
