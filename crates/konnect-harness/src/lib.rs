//! Deterministic simulation harness for Konnect session testing.
//!
//! In-memory implementations of the client's collaborators so the real
//! [`konnect_client::Runtime`] can be driven without sockets or HTTP:
//!
//! - [`SimNetwork`]: a chat server that queues transport operations until the
//!   test delivers them, broadcasts to every open transport in a group and
//!   announces joins and departures. Tests can also drop links uncleanly,
//!   close them from the server side and inject raw frames.
//! - [`SimConnector`]: per-client [`konnect_client::Connector`] attached to a
//!   `SimNetwork`.
//! - [`SimDirectory`]: user/group directory with the same validation rules
//!   as the REST service.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties against snapshots of
//! every simulated client. Use [`InvariantRegistry::standard()`] for the
//! session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_directory;
pub mod sim_network;

pub use invariants::{
    ClientSnapshot, Invariant, InvariantRegistry, InvariantResult, LogScopedToTarget,
    OpenImpliesCompleteTarget, SingleLiveTransport, SystemSnapshot, TargetFollowsSelection,
    Violation,
};
pub use sim_directory::SimDirectory;
pub use sim_network::{ClientId, SimConnector, SimNetwork};

use konnect_client::{ClientError, Runtime};
use konnect_core::MemoryStore;

/// Runtime wired to the simulated collaborators.
pub type SimRuntime = Runtime<SimDirectory, SimConnector, MemoryStore>;

/// Build a client runtime on `network` and `directory` with empty identity
/// storage.
pub fn sim_runtime(
    network: &SimNetwork,
    directory: &SimDirectory,
) -> Result<SimRuntime, ClientError> {
    sim_runtime_with_store(network, directory, MemoryStore::new())
}

/// Build a client runtime with pre-populated identity storage.
pub fn sim_runtime_with_store(
    network: &SimNetwork,
    directory: &SimDirectory,
    store: MemoryStore,
) -> Result<SimRuntime, ClientError> {
    let (connector, events) = network.connector();
    Runtime::new(directory.clone(), connector, events, store)
}
