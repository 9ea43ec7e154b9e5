//! Konnect client
//!
//! Wires the Sans-IO session core to real I/O. [`SessionManager`] combines
//! identity, the selected group and the session state machine. [`Runtime`]
//! drives it against a [`GroupDirectory`] and a [`Connector`], executing the
//! actions the core returns and turning transport events into [`Notice`]s.
//!
//! Production adapters: [`HttpDirectory`] (reqwest), [`WsConnector`]
//! (tokio-tungstenite) and [`FileStore`] (JSON file under the platform config
//! directory).
//!
//! [`GroupDirectory`]: konnect_core::GroupDirectory

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod connector;
pub mod error;
pub mod http;
pub mod manager;
pub mod runtime;
pub mod store;
pub mod ws;

pub use config::ClientConfig;
pub use connector::Connector;
pub use error::{ClientError, TransportError};
pub use http::HttpDirectory;
pub use manager::SessionManager;
pub use runtime::{Notice, Runtime};
pub use store::FileStore;
pub use ws::WsConnector;
