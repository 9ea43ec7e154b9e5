//! Property tests for the session manager: the connection always follows the
//! selected identity and group, whatever order they change in.

use std::collections::BTreeSet;

use konnect_client::SessionManager;
use konnect_core::{
    ConnectionState, Group, MemoryStore, SessionAction, SessionEvent, TransportId,
};
use proptest::prelude::*;

const NAMES: [&str; 3] = ["alice", "bob", "  "];
const GROUPS: [&str; 2] = ["g1", "g2"];

#[derive(Debug, Clone)]
enum Op {
    SetName(usize),
    Clear,
    Enter(usize),
    Leave,
    Rejoin,
    /// Transport layer completes every pending open and close
    Complete,
    /// Current transport drops without a close frame
    Drop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NAMES.len()).prop_map(Op::SetName),
        Just(Op::Clear),
        (0..GROUPS.len()).prop_map(Op::Enter),
        Just(Op::Leave),
        Just(Op::Rejoin),
        Just(Op::Complete),
        Just(Op::Drop),
    ]
}

/// Transports as seen from the network side.
#[derive(Default)]
struct Transports {
    opening: BTreeSet<TransportId>,
    open: BTreeSet<TransportId>,
    closing: BTreeSet<TransportId>,
}

impl Transports {
    fn live(&self) -> usize {
        self.opening.len() + self.open.len() + self.closing.len()
    }

    fn apply(&mut self, actions: &[SessionAction]) -> Result<(), TestCaseError> {
        for action in actions {
            match action {
                SessionAction::Open { transport, .. } => {
                    prop_assert_eq!(self.live(), 0, "opened {} with another live", transport);
                    self.opening.insert(*transport);
                },
                SessionAction::Close { transport, .. } => {
                    let known = self.opening.remove(transport) || self.open.remove(transport);
                    prop_assert!(known, "closed unknown {}", transport);
                    self.closing.insert(*transport);
                },
                SessionAction::Send { .. }
                | SessionAction::Deliver(_)
                | SessionAction::Advisory(_) => {},
            }
        }
        Ok(())
    }
}

fn drive(
    manager: &mut SessionManager<MemoryStore>,
    transports: &mut Transports,
    op: &Op,
) -> Result<(), TestCaseError> {
    let actions = match *op {
        Op::SetName(n) => manager.set_identity(NAMES[n]).unwrap_or_default(),
        Op::Clear => manager.clear_identity().unwrap_or_default(),
        Op::Enter(g) => manager.enter_group(Group::new(GROUPS[g], GROUPS[g])),
        Op::Leave => manager.leave_group(),
        Op::Rejoin => manager.rejoin(),
        Op::Complete => {
            for transport in std::mem::take(&mut transports.closing) {
                let event = SessionEvent::Closed { transport, code: Some(1000), reason: "".into() };
                let actions = manager.handle(event);
                transports.apply(&actions)?;
            }
            for transport in std::mem::take(&mut transports.opening) {
                transports.open.insert(transport);
                let actions = manager.handle(SessionEvent::Opened { transport });
                transports.apply(&actions)?;
            }
            return check(manager, transports);
        },
        Op::Drop => {
            let mut actions = Vec::new();
            for transport in std::mem::take(&mut transports.open) {
                let event = SessionEvent::Closed { transport, code: None, reason: String::new() };
                actions.extend(manager.handle(event));
            }
            actions
        },
    };
    transports.apply(&actions)?;
    check(manager, transports)
}

fn check(
    manager: &SessionManager<MemoryStore>,
    transports: &Transports,
) -> Result<(), TestCaseError> {
    prop_assert!(transports.live() <= 1);

    let wanted = manager.target();
    match manager.session().target() {
        Some(bound) => prop_assert_eq!(bound, &wanted),
        None => prop_assert!(!wanted.is_complete(), "complete target {} left unbound", wanted),
    }

    if manager.state() == ConnectionState::Open {
        prop_assert!(manager.identity().is_some() && manager.group().is_some());
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_connection_follows_selection(ops in prop::collection::vec(op(), 1..50)) {
        let mut manager = SessionManager::new(MemoryStore::new()).unwrap();
        let mut transports = Transports::default();
        for op in &ops {
            drive(&mut manager, &mut transports, op)?;
        }
    }

    #[test]
    fn prop_settles_open_when_complete(ops in prop::collection::vec(op(), 1..50)) {
        let mut manager = SessionManager::new(MemoryStore::new()).unwrap();
        let mut transports = Transports::default();
        for op in &ops {
            drive(&mut manager, &mut transports, op)?;
        }
        drive(&mut manager, &mut transports, &Op::Rejoin)?;
        drive(&mut manager, &mut transports, &Op::Complete)?;
        drive(&mut manager, &mut transports, &Op::Complete)?;

        if manager.target().is_complete() {
            prop_assert_eq!(manager.state(), ConnectionState::Open);
        } else {
            prop_assert_eq!(manager.session().transport(), None);
        }
    }
}
