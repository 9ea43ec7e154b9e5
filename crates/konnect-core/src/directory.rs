//! Group directory interface.
//!
//! Request/response calls to the service that owns user and group records.
//! The session layer treats them as opaque remote calls and never retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::DirectoryError, target::Group};

/// User record returned by [`GroupDirectory::create_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    /// Server-side user ID (equal to the name)
    pub user_id: String,
    /// Display name as stored by the service
    pub name: String,
}

/// Group record returned by [`GroupDirectory::create_group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedGroup {
    /// Server-assigned group ID
    pub group_id: String,
    /// Group name
    pub group_name: String,
}

impl From<CreatedGroup> for Group {
    fn from(created: CreatedGroup) -> Self {
        Group::new(created.group_id, created.group_name)
    }
}

/// Confirmation returned by [`GroupDirectory::join_group`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedGroup {
    /// Human-readable confirmation
    pub message: String,
}

/// Entry returned by [`GroupDirectory::list_groups`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    /// Server-assigned group ID
    pub group_id: String,
    /// Group name
    pub group_name: String,
    /// Name of the user who created the group
    pub creator_name: String,
}

impl From<GroupSummary> for Group {
    fn from(summary: GroupSummary) -> Self {
        Group::new(summary.group_id, summary.group_name)
    }
}

/// Membership record returned by [`GroupDirectory::group_members`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembers {
    /// Server-assigned group ID
    pub group_id: String,
    /// Group name
    pub group_name: String,
    /// Names of every user who joined, creator first
    pub members: Vec<String>,
}

/// Remote user/group directory.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Register a user. Registering an existing name succeeds.
    async fn create_user(&self, name: &str) -> Result<CreatedUser, DirectoryError>;

    /// Create a group owned by `creator_name`.
    async fn create_group(
        &self,
        group_name: &str,
        creator_name: &str,
    ) -> Result<CreatedGroup, DirectoryError>;

    /// Add `user_name` to an existing group.
    async fn join_group(
        &self,
        group_id: &str,
        user_name: &str,
    ) -> Result<JoinedGroup, DirectoryError>;

    /// All groups known to the service.
    async fn list_groups(&self) -> Result<Vec<GroupSummary>, DirectoryError>;

    /// Users recorded as members of `group_id`.
    ///
    /// Membership is what the directory stored on create and join, not who
    /// is connected right now.
    async fn group_members(&self, group_id: &str) -> Result<GroupMembers, DirectoryError>;
}
