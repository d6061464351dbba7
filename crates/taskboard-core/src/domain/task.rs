//! Task Entity
//!
//! A task has at most one assignee. The backend stores assignments as
//! junction rows that could hold several per task; the reconciler keeps it
//! at one by always deleting before inserting.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, ProjectId, TaskId, UserId};

/// Board column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Doing,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::Doing, TaskStatus::Done];

    pub fn id(&self) -> i64 {
        match self {
            TaskStatus::Pending => 1,
            TaskStatus::Doing => 2,
            TaskStatus::Done => 3,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(TaskStatus::Pending),
            2 => Some(TaskStatus::Doing),
            3 => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Doing => "Doing",
            TaskStatus::Done => "Done",
        }
    }
}

/// The user currently holding a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub user_id: UserId,
    pub user_name: Option<String>,
}

impl Assignee {
    pub fn display_name(&self) -> String {
        self.user_name
            .clone()
            .unwrap_or_else(|| format!("User #{}", self.user_id))
    }
}

/// Task data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: Option<ProjectId>,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub assignee: Option<Assignee>,
}

impl Task {
    pub fn is_assigned(&self) -> bool {
        self.assignee.is_some()
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }
}
