//! Konnect core
//!
//! Sans-IO state machines for a realtime group chat client. Nothing in this
//! crate performs I/O: operations return actions ([`SessionAction`]) for a
//! driver to execute, and transport callbacks are fed back in as events
//! ([`SessionEvent`]).
//!
//! # Components
//!
//! - [`IdentityStore`]: the local user's display name, persisted through a
//!   [`KeyValueStore`]
//! - [`GroupDirectory`]: request/response interface to the user/group service
//! - [`MessageLog`]: ordered chat events for the joined group
//! - [`SessionConnection`]: connection lifecycle bound to a
//!   [`ConnectionTarget`]
//! - [`Dispatcher`]: validates outbound messages against the session

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod directory;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod log;
pub mod session;
pub mod target;
pub mod wire;

pub use directory::{
    CreatedGroup, CreatedUser, GroupDirectory, GroupMembers, GroupSummary, JoinedGroup,
};
pub use dispatch::Dispatcher;
pub use error::{
    ConnectionError, DirectoryError, IdentityError, SendError, StoreError, ValidationError,
};
pub use identity::{Identity, IdentityStore, KeyValueStore, MemoryStore, USER_NAME_KEY};
pub use log::{ChatEvent, EventKind, MessageLog};
pub use session::{ConnectionState, SessionAction, SessionConnection, SessionEvent, TransportId};
pub use target::{ConnectionTarget, Group};
pub use wire::{CloseReason, FrameKind, InboundFrame, NORMAL_CLOSE, OutboundFrame, SYSTEM_SENDER};
