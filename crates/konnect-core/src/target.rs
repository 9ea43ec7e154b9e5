//! Groups and the connection targets derived from them.

use std::fmt;

/// A chat group the user has created or joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    /// Server-assigned group ID (used in the transport path)
    pub id: String,
    /// Human-readable group name
    pub name: String,
}

impl Group {
    /// Create a group record.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// The (group, user) pair a transport connection is bound to.
///
/// Two targets are equal iff both fields match. A target with either field
/// blank is still representable so callers can hand over whatever they have;
/// [`ConnectionTarget::is_complete`] decides whether it may be connected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConnectionTarget {
    /// Group ID
    pub group_id: String,
    /// Display name of the local user
    pub user_name: String,
}

impl ConnectionTarget {
    /// Create a target from its two halves.
    pub fn new(group_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self { group_id: group_id.into(), user_name: user_name.into() }
    }

    /// Build a target from optional halves, leaving missing ones blank.
    pub fn from_parts(group_id: Option<&str>, user_name: Option<&str>) -> Self {
        Self::new(group_id.unwrap_or_default(), user_name.unwrap_or_default())
    }

    /// Both group and user are present (non-blank).
    pub fn is_complete(&self) -> bool {
        !self.group_id.trim().is_empty() && !self.user_name.trim().is_empty()
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_id, self.user_name)
    }
}
