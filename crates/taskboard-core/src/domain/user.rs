//! User Entity
//!
//! Users are read-only here; identity is managed elsewhere.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, UserId};

/// User data structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub status: Option<i64>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Signed-in user as persisted between page loads.
///
/// Field names match the stored JSON record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Option<UserId>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_status: Option<i64>,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        if self.user_name.is_empty() {
            &self.email
        } else {
            &self.user_name
        }
    }
}
