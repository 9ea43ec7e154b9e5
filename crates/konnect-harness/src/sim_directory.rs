//! In-memory group directory.
//!
//! Applies the same rules as the REST service: blank fields are rejected
//! with 400, unknown users and groups with 404, registering an existing user
//! succeeds, and a group's creator is its first member. Group IDs are
//! deterministic eight-digit hex counters.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use konnect_core::{
    CreatedGroup, CreatedUser, DirectoryError, GroupDirectory, GroupMembers, GroupSummary,
    JoinedGroup,
};

#[derive(Debug, Clone)]
struct GroupRecord {
    id: String,
    name: String,
    creator: String,
    members: Vec<String>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: BTreeSet<String>,
    groups: Vec<GroupRecord>,
    next_group: u32,
    offline: bool,
    calls: usize,
}

fn rejected(status: u16, message: impl Into<String>) -> DirectoryError {
    DirectoryError::Rejected { status, message: message.into() }
}

/// Shared in-memory [`GroupDirectory`].
///
/// Cheap to clone; clones share the same records, so several simulated
/// clients can use one directory.
#[derive(Debug, Clone, Default)]
pub struct SimDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl SimDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a call: count it and fail if offline.
    fn call(&self) -> Result<MutexGuard<'_, DirectoryState>, DirectoryError> {
        let mut state = self.lock();
        state.calls += 1;
        if state.offline {
            return Err(DirectoryError::Network("directory offline".to_string()));
        }
        Ok(state)
    }

    /// Make every call fail with [`DirectoryError::Network`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Number of calls made so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Registered user names.
    pub fn users(&self) -> Vec<String> {
        self.lock().users.iter().cloned().collect()
    }

    /// Members of a group. `None` if the group does not exist.
    pub fn members(&self, group_id: &str) -> Option<Vec<String>> {
        self.lock().groups.iter().find(|g| g.id == group_id).map(|g| g.members.clone())
    }
}

#[async_trait]
impl GroupDirectory for SimDirectory {
    async fn create_user(&self, name: &str) -> Result<CreatedUser, DirectoryError> {
        let mut state = self.call()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(rejected(400, "Name cannot be empty"));
        }

        if !state.users.insert(name.to_string()) {
            tracing::debug!(%name, "user already exists");
        }
        Ok(CreatedUser { user_id: name.to_string(), name: name.to_string() })
    }

    async fn create_group(
        &self,
        group_name: &str,
        creator_name: &str,
    ) -> Result<CreatedGroup, DirectoryError> {
        let mut state = self.call()?;
        let group_name = group_name.trim();
        let creator_name = creator_name.trim();
        if group_name.is_empty() {
            return Err(rejected(400, "Group name cannot be empty"));
        }
        if creator_name.is_empty() {
            return Err(rejected(400, "Creator name cannot be empty"));
        }
        if !state.users.contains(creator_name) {
            return Err(rejected(
                404,
                format!("User '{creator_name}' not found. Please set username first."),
            ));
        }

        state.next_group += 1;
        let record = GroupRecord {
            id: format!("{:08x}", state.next_group),
            name: group_name.to_string(),
            creator: creator_name.to_string(),
            members: vec![creator_name.to_string()],
        };
        let created = CreatedGroup { group_id: record.id.clone(), group_name: record.name.clone() };
        state.groups.push(record);
        Ok(created)
    }

    async fn join_group(
        &self,
        group_id: &str,
        user_name: &str,
    ) -> Result<JoinedGroup, DirectoryError> {
        let mut state = self.call()?;
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(rejected(400, "User name cannot be empty"));
        }
        if !state.users.contains(user_name) {
            return Err(rejected(
                404,
                format!("User '{user_name}' not found. Please set username first."),
            ));
        }
        let Some(group) = state.groups.iter_mut().find(|g| g.id == group_id) else {
            return Err(rejected(404, "Group not found"));
        };

        if group.members.iter().any(|m| m == user_name) {
            let message =
                format!("User '{user_name}' is already a member of group '{}'", group.name);
            return Ok(JoinedGroup { message });
        }
        group.members.push(user_name.to_string());
        Ok(JoinedGroup { message: format!("User '{user_name}' joined group '{}'", group.name) })
    }

    async fn list_groups(&self) -> Result<Vec<GroupSummary>, DirectoryError> {
        let state = self.call()?;
        Ok(state
            .groups
            .iter()
            .map(|g| GroupSummary {
                group_id: g.id.clone(),
                group_name: g.name.clone(),
                creator_name: g.creator.clone(),
            })
            .collect())
    }

    async fn group_members(&self, group_id: &str) -> Result<GroupMembers, DirectoryError> {
        let state = self.call()?;
        let Some(group) = state.groups.iter().find(|g| g.id == group_id) else {
            return Err(rejected(404, "Group not found"));
        };
        Ok(GroupMembers {
            group_id: group.id.clone(),
            group_name: group.name.clone(),
            members: group.members.clone(),
        })
    }
}
