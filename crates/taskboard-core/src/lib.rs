//! Taskboard Core
//!
//! Layered client core:
//! - domain: canonical entities, ids and errors
//! - normalize: server payload -> canonical entity
//! - transport / client: typed wrappers around the remote resources
//! - lifecycle: cancellable, last-issued-wins list fetches
//! - reconcile: relation choreography over a non-transactional API
//! - session: persisted sign-in state

pub mod client;
pub mod config;
pub mod domain;
pub mod lifecycle;
pub mod normalize;
pub mod reconcile;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{ApiClient, LoginOutcome, ProjectDraft, TaskDraft};
pub use config::ApiConfig;
pub use domain::{
    Assignee, ClientError, ClientResult, Project, ProjectId, Role, SessionUser, Task, TaskId,
    TaskStatus, User, UserId,
};
pub use lifecycle::{cancellable, CancelHandle, ListQuery, ListSnapshot, LoadOutcome, LoadState};
pub use reconcile::{InFlight, InFlightGuard, Reconciler};
pub use session::{MemoryStore, Session, SessionStore};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport};
