//! Session rules registered by [`super::InvariantRegistry::standard`].
//!
//! Each check walks the snapshot's clients and reports the first one that
//! breaks the rule, naming it in the violation message.

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// A client never has more than one transport.
///
/// Counts links the server holds plus opens still in flight, so a switch
/// that opened the new transport before the old one closed is caught even
/// if the server has not seen either yet.
pub struct SingleLiveTransport;

impl Invariant for SingleLiveTransport {
    fn name(&self) -> &'static str {
        "single_live_transport"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.live_transports > 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{} has {} live transports",
                        client.client, client.live_transports
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The message log belongs to the bound target.
///
/// A non-empty log implies a bound target, and sequence numbers run
/// 1, 2, 3, ... without gaps.
pub struct LogScopedToTarget;

impl Invariant for LogScopedToTarget {
    fn name(&self) -> &'static str {
        "log_scoped_to_target"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if !client.sequences.is_empty() && client.target.is_none() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{} holds {} events with no target",
                        client.client,
                        client.sequences.len()
                    ),
                });
            }

            let expected = (1..).take(client.sequences.len());
            if !client.sequences.iter().copied().eq(expected) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{} sequences {:?}", client.client, client.sequences),
                });
            }
        }
        Ok(())
    }
}

/// An open session has both an identity and a group, and is bound to them.
pub struct OpenImpliesCompleteTarget;

impl Invariant for OpenImpliesCompleteTarget {
    fn name(&self) -> &'static str {
        "open_implies_complete_target"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.open_transport.is_none() {
                continue;
            }

            let complete = client.target.as_ref().is_some_and(|t| t.is_complete());
            if !complete || client.identity.is_none() || client.group.is_none() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{} open with target {:?}, identity {:?}, group {:?}",
                        client.client, client.target, client.identity, client.group
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A bound target is always the current (group, identity) pair.
pub struct TargetFollowsSelection;

impl Invariant for TargetFollowsSelection {
    fn name(&self) -> &'static str {
        "target_follows_selection"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(target) = &client.target else {
                continue;
            };

            let group_matches = client.group.as_deref() == Some(target.group_id.as_str());
            let user_matches = client.identity.as_deref() == Some(target.user_name.as_str());
            if !group_matches || !user_matches {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{} bound to {target} but selected group {:?} as {:?}",
                        client.client, client.group, client.identity
                    ),
                });
            }
        }
        Ok(())
    }
}
