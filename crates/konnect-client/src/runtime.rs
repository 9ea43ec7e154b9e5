//! Client runtime.
//!
//! Orchestrates the session manager against real collaborators:
//! - [`GroupDirectory`]: request/response calls for users and groups
//! - [`Connector`]: executes transport actions
//! - the [`SessionEvent`] channel the connector reports on
//!
//! User operations run to completion one at a time; transport events are
//! pulled with [`Runtime::next`] (or [`Runtime::pump`] when the caller wants
//! to process only what is already queued). Neither ever blocks on I/O held
//! by the state machine itself.

use std::collections::VecDeque;

use konnect_core::{
    ChatEvent, ConnectionError, Group, GroupDirectory, GroupMembers, GroupSummary, Identity,
    KeyValueStore, SessionAction, SessionEvent, ValidationError,
};
use tokio::sync::mpsc;

use crate::{connector::Connector, error::ClientError, manager::SessionManager};

/// Something the user should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A chat event was appended to the log
    Message(ChatEvent),
    /// Connection-level condition
    Advisory(ConnectionError),
}

/// Drives a [`SessionManager`] with a directory and a connector.
///
/// # Type Parameters
///
/// - `D`: Group directory
/// - `C`: Transport connector
/// - `S`: Identity storage
pub struct Runtime<D, C, S>
where
    D: GroupDirectory,
    C: Connector,
    S: KeyValueStore,
{
    directory: D,
    connector: C,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    manager: SessionManager<S>,
    notices: VecDeque<Notice>,
}

impl<D, C, S> Runtime<D, C, S>
where
    D: GroupDirectory,
    C: Connector,
    S: KeyValueStore,
{
    /// Create a runtime. Restores the persisted identity from `store`.
    ///
    /// `events` must be the receiver paired with `connector`.
    pub fn new(
        directory: D,
        connector: C,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        store: S,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            directory,
            connector,
            events,
            manager: SessionManager::new(store)?,
            notices: VecDeque::new(),
        })
    }

    /// Session state.
    pub fn manager(&self) -> &SessionManager<S> {
        &self.manager
    }

    /// Transport connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Group directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Register `name` with the directory and adopt it as the identity.
    ///
    /// Reconnects if a group is selected.
    pub async fn register(&mut self, name: &str) -> Result<Identity, ClientError> {
        let identity = Identity::from_name(name)?;
        let created = self.directory.create_user(&identity.name).await?;
        tracing::debug!(user = %created.user_id, "user registered");

        let actions = self.manager.set_identity(&identity.name)?;
        self.execute(actions);
        Ok(identity)
    }

    /// Create a group owned by the current identity and switch to it.
    pub async fn create_group(&mut self, group_name: &str) -> Result<Group, ClientError> {
        let group_name = group_name.trim();
        if group_name.is_empty() {
            return Err(ValidationError::EmptyGroupName.into());
        }
        let creator = self.require_identity()?;

        let group = Group::from(self.directory.create_group(group_name, &creator).await?);
        let actions = self.manager.enter_group(group.clone());
        self.execute(actions);
        Ok(group)
    }

    /// Join an existing group by ID and switch to it.
    ///
    /// The group's name comes from the directory listing when available,
    /// otherwise the ID stands in for it.
    pub async fn join_group(&mut self, group_id: &str) -> Result<Group, ClientError> {
        let group_id = group_id.trim();
        if group_id.is_empty() {
            return Err(ValidationError::EmptyGroupId.into());
        }
        let user = self.require_identity()?;

        let joined = self.directory.join_group(group_id, &user).await?;
        tracing::debug!(message = %joined.message, "joined group");

        let name = match self.directory.list_groups().await {
            Ok(groups) => groups.into_iter().find(|g| g.group_id == group_id).map(|g| g.group_name),
            Err(e) => {
                tracing::debug!(error = %e, "group listing unavailable");
                None
            },
        };
        let group = Group::new(group_id, name.unwrap_or_else(|| group_id.to_string()));

        let actions = self.manager.enter_group(group.clone());
        self.execute(actions);
        Ok(group)
    }

    /// Groups known to the directory.
    pub async fn list_groups(&self) -> Result<Vec<GroupSummary>, ClientError> {
        Ok(self.directory.list_groups().await?)
    }

    /// Members the directory has recorded for the current group.
    pub async fn group_members(&self) -> Result<GroupMembers, ClientError> {
        let group = self.manager.group().ok_or(ClientError::NoGroup)?;
        Ok(self.directory.group_members(&group.id).await?)
    }

    /// Leave the current group.
    pub fn leave_group(&mut self) {
        let actions = self.manager.leave_group();
        self.execute(actions);
    }

    /// Delete the persisted identity and disconnect.
    pub fn forget_identity(&mut self) -> Result<(), ClientError> {
        let actions = self.manager.clear_identity()?;
        self.execute(actions);
        Ok(())
    }

    /// Send a chat message on the open connection.
    ///
    /// The message shows up once the server broadcasts it back.
    pub fn send(&mut self, text: &str) -> Result<(), ClientError> {
        let action = self.manager.send(text)?;
        self.execute(vec![action]);
        Ok(())
    }

    /// Reconnect after the connection was lost.
    ///
    /// Returns `false` if there was nothing to rejoin.
    pub fn rejoin(&mut self) -> bool {
        let actions = self.manager.rejoin();
        let reconnecting = !actions.is_empty();
        self.execute(actions);
        reconnecting
    }

    /// Wait for the next notice.
    ///
    /// Returns `None` once the connector's event channel is closed.
    /// Cancel-safe: nothing is lost if the future is dropped.
    pub async fn next(&mut self) -> Option<Notice> {
        loop {
            if let Some(notice) = self.notices.pop_front() {
                return Some(notice);
            }
            let event = self.events.recv().await?;
            self.dispatch(event);
        }
    }

    /// Process every transport event already queued, without waiting.
    pub fn pump(&mut self) -> Vec<Notice> {
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
        }
        self.notices.drain(..).collect()
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let actions = self.manager.handle(event);
        self.execute(actions);
    }

    fn require_identity(&self) -> Result<String, ClientError> {
        self.manager.identity().map(|i| i.name.clone()).ok_or(ClientError::NoIdentity)
    }

    fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Open { transport, target } => {
                    self.connector.open(transport, &target);
                },
                SessionAction::Send { transport, frame } => self.connector.send(transport, frame),
                SessionAction::Close { transport, code, reason } => {
                    self.connector.close(transport, code, reason);
                },
                SessionAction::Deliver(event) => self.notices.push_back(Notice::Message(event)),
                SessionAction::Advisory(err) => self.notices.push_back(Notice::Advisory(err)),
            }
        }
    }
}
