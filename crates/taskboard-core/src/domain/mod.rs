//! Domain Layer
//!
//! Canonical in-memory shapes shared by every consumer of the core.
//! Nothing in here talks to the network.

mod entity;
mod error;
mod project;
mod task;
mod user;

pub use entity::{Entity, ProjectId, TaskId, UserId, PROVISIONAL_ID_FLOOR};
pub use error::{ClientError, ClientResult};
pub use project::{Project, Role};
pub use task::{Assignee, Task, TaskStatus};
pub use user::{SessionUser, User};
