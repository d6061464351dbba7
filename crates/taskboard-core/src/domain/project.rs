//! Project Entity

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, ProjectId, UserId};

/// Role carried by a user-project membership row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Role {
    /// Creator of the project
    Owner,
    /// Collaborator added after creation
    #[default]
    Member,
}

impl Role {
    pub fn id(&self) -> i64 {
        match self {
            Role::Owner => 1,
            Role::Member => 2,
        }
    }
}

/// Project data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    /// ISO-8601 as sent by the server
    pub created_at: Option<String>,
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    /// Active flag
    pub status: bool,
    pub task_count: u32,
    /// Known members; filled from membership writes and member listings
    pub member_ids: BTreeSet<UserId>,
}

impl Entity for Project {
    type Id = ProjectId;

    fn id(&self) -> ProjectId {
        self.id
    }
}
