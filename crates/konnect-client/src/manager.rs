//! Session manager.
//!
//! Holds the three pieces of client state (identity, selected group, session
//! connection) and keeps the connection bound to whatever target they
//! describe. Every mutation of identity or group re-derives the target and
//! calls [`SessionConnection::bind`]; binding is idempotent, so callers never
//! have to work out whether the target actually changed.
//!
//! Like the core, the manager performs no I/O. It returns
//! [`SessionAction`]s for [`crate::Runtime`] to execute.

use konnect_core::{
    ConnectionState, ConnectionTarget, Dispatcher, Group, Identity, IdentityError, IdentityStore,
    KeyValueStore, MessageLog, SendError, SessionAction, SessionConnection, SessionEvent,
    StoreError,
};

/// Identity, group and connection for one local user.
#[derive(Debug)]
pub struct SessionManager<S: KeyValueStore> {
    identity: IdentityStore<S>,
    group: Option<Group>,
    session: SessionConnection,
}

impl<S: KeyValueStore> SessionManager<S> {
    /// Create a manager, restoring any persisted identity.
    ///
    /// No group is selected, so nothing connects yet.
    pub fn new(store: S) -> Result<Self, StoreError> {
        Ok(Self {
            identity: IdentityStore::open(store)?,
            group: None,
            session: SessionConnection::new(),
        })
    }

    /// Current identity.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    /// Selected group.
    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    /// Underlying connection.
    pub fn session(&self) -> &SessionConnection {
        &self.session
    }

    /// Connection state.
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// Events for the current target.
    pub fn log(&self) -> &MessageLog {
        self.session.log()
    }

    /// Target described by the current identity and group. May be incomplete.
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::from_parts(
            self.group.as_ref().map(|g| g.id.as_str()),
            self.identity.get().map(|i| i.name.as_str()),
        )
    }

    /// Set and persist the display name, then rebind.
    ///
    /// On error neither the identity nor the connection changes.
    pub fn set_identity(&mut self, name: &str) -> Result<Vec<SessionAction>, IdentityError> {
        let identity = self.identity.set(name)?;
        tracing::info!(name = %identity.name, "identity set");
        Ok(self.sync())
    }

    /// Forget the persisted identity. Tears down any connection.
    pub fn clear_identity(&mut self) -> Result<Vec<SessionAction>, StoreError> {
        self.identity.clear()?;
        tracing::info!("identity cleared");
        Ok(self.sync())
    }

    /// Select `group` and connect to it if an identity is set.
    pub fn enter_group(&mut self, group: Group) -> Vec<SessionAction> {
        tracing::info!(group = %group.id, name = %group.name, "entering group");
        self.group = Some(group);
        self.sync()
    }

    /// Deselect the group and close its connection.
    pub fn leave_group(&mut self) -> Vec<SessionAction> {
        if let Some(group) = self.group.take() {
            tracing::info!(group = %group.id, "leaving group");
        }
        self.session.unbind()
    }

    /// Encode a message for the open transport.
    pub fn send(&self, text: &str) -> Result<SessionAction, SendError> {
        Dispatcher::new(&self.session).send(text)
    }

    /// Feed a transport event into the connection.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        self.session.handle(event)
    }

    /// Reconnect to the current target after the connection was lost.
    pub fn rejoin(&mut self) -> Vec<SessionAction> {
        self.session.rebind()
    }

    fn sync(&mut self) -> Vec<SessionAction> {
        let target = self.target();
        self.session.bind(target)
    }
}

#[cfg(test)]
mod tests {
    use konnect_core::{CloseReason, MemoryStore, USER_NAME_KEY};

    use super::*;

    fn manager() -> SessionManager<MemoryStore> {
        SessionManager::new(MemoryStore::new()).unwrap()
    }

    fn opened(actions: &[SessionAction]) -> Option<&ConnectionTarget> {
        actions.iter().find_map(|a| match a {
            SessionAction::Open { target, .. } => Some(target),
            _ => None,
        })
    }

    #[test]
    fn connects_once_both_halves_are_known() {
        let mut m = manager();
        assert!(m.set_identity("alice").unwrap().is_empty());
        assert_eq!(m.state(), ConnectionState::Idle);

        let actions = m.enter_group(Group::new("g1", "team"));
        assert_eq!(opened(&actions), Some(&ConnectionTarget::new("g1", "alice")));
        assert_eq!(m.state(), ConnectionState::Connecting);
    }

    #[test]
    fn group_first_then_identity() {
        let mut m = manager();
        assert!(m.enter_group(Group::new("g1", "team")).is_empty());

        let actions = m.set_identity("alice").unwrap();
        assert_eq!(opened(&actions), Some(&ConnectionTarget::new("g1", "alice")));
    }

    #[test]
    fn restores_persisted_identity() {
        let mut store = MemoryStore::new();
        store.save(USER_NAME_KEY, "alice").unwrap();

        let mut m = SessionManager::new(store).unwrap();
        assert_eq!(m.identity().map(|i| i.name.as_str()), Some("alice"));

        let actions = m.enter_group(Group::new("g1", "team"));
        assert!(opened(&actions).is_some());
    }

    #[test]
    fn same_name_again_is_a_no_op() {
        let mut m = manager();
        m.set_identity("alice").unwrap();
        m.enter_group(Group::new("g1", "team"));

        assert!(m.set_identity(" alice ").unwrap().is_empty());
    }

    #[test]
    fn invalid_name_keeps_connection() {
        let mut m = manager();
        m.set_identity("alice").unwrap();
        m.enter_group(Group::new("g1", "team"));

        assert!(m.set_identity("  ").is_err());
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert_eq!(m.identity().map(|i| i.name.as_str()), Some("alice"));
    }

    #[test]
    fn renaming_switches_transport() {
        let mut m = manager();
        m.set_identity("alice").unwrap();
        m.enter_group(Group::new("g1", "team"));
        let first = m.session().transport().unwrap();

        let actions = m.set_identity("alicia").unwrap();
        assert_eq!(actions, vec![SessionAction::Close {
            transport: first,
            code: 1000,
            reason: CloseReason::Switching,
        }]);
    }

    #[test]
    fn clearing_identity_tears_down() {
        let mut m = manager();
        m.set_identity("alice").unwrap();
        m.enter_group(Group::new("g1", "team"));
        let transport = m.session().transport().unwrap();

        let actions = m.clear_identity().unwrap();
        assert_eq!(actions, vec![SessionAction::Close {
            transport,
            code: 1000,
            reason: CloseReason::Leaving,
        }]);
        assert!(m.identity().is_none());
        assert!(m.session().target().is_none());
    }

    #[test]
    fn leave_group_forgets_group() {
        let mut m = manager();
        m.set_identity("alice").unwrap();
        m.enter_group(Group::new("g1", "team"));

        let actions = m.leave_group();
        assert!(matches!(actions.as_slice(), [SessionAction::Close {
            reason: CloseReason::Leaving,
            ..
        }]));
        assert!(m.group().is_none());
        assert!(!m.target().is_complete());
    }

    #[test]
    fn send_requires_open_connection() {
        let mut m = manager();
        m.set_identity("alice").unwrap();
        m.enter_group(Group::new("g1", "team"));
        assert!(matches!(m.send("hi"), Err(SendError::NotConnected { .. })));

        let transport = m.session().transport().unwrap();
        m.handle(SessionEvent::Opened { transport });
        assert!(m.send("hi").is_ok());
    }
}
