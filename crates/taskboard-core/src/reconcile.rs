//! Assignment Reconciler
//!
//! The backend has no transactions. Relation edits are a fixed sequence of
//! independent calls:
//!
//! - reassigning a task deletes its assignment row, then inserts the new one;
//! - creating a project or task creates the parent first, then its initiating
//!   relation (owner membership, chosen assignee);
//! - adding members fans out one insert per user and keeps what succeeded.
//!
//! Only one reconciliation per task or project runs at a time; a second one
//! is rejected with `ClientError::Busy` while the first holds its guard.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;

use crate::client::{ApiClient, ProjectDraft, TaskDraft};
use crate::domain::{ClientError, ClientResult, Project, ProjectId, Role, Task, TaskId, UserId};

// ========================
// In-flight registry
// ========================

/// Set of ids with a pending operation.
pub struct InFlight<K> {
    pending: Arc<Mutex<HashSet<K>>>,
}

impl<K> Clone for InFlight<K> {
    fn clone(&self) -> Self {
        Self {
            pending: self.pending.clone(),
        }
    }
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            pending: Arc::default(),
        }
    }
}

impl<K: Eq + Hash + Copy> InFlight<K> {
    fn pending(&self) -> MutexGuard<'_, HashSet<K>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `key`; `None` if it is already claimed.
    pub fn try_acquire(&self, key: K) -> Option<InFlightGuard<K>> {
        self.pending().insert(key).then(|| InFlightGuard {
            pending: self.pending.clone(),
            key,
        })
    }

    pub fn contains(&self, key: K) -> bool {
        self.pending().contains(&key)
    }
}

/// Releases its id on drop.
pub struct InFlightGuard<K: Eq + Hash> {
    pending: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

fn claim<K: Eq + Hash + Copy + Display>(
    registry: &InFlight<K>,
    kind: &str,
    key: K,
) -> ClientResult<InFlightGuard<K>> {
    registry
        .try_acquire(key)
        .ok_or_else(|| ClientError::Busy(format!("{kind} {key}")))
}

// ========================
// Reconciler
// ========================

#[derive(Clone)]
pub struct Reconciler {
    client: ApiClient,
    tasks: InFlight<TaskId>,
    projects: InFlight<ProjectId>,
}

impl Reconciler {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tasks: InFlight::default(),
            projects: InFlight::default(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_task_busy(&self, id: TaskId) -> bool {
        self.tasks.contains(id)
    }

    pub fn is_project_busy(&self, id: ProjectId) -> bool {
        self.projects.contains(id)
    }

    /// Makes `target` the only assignee of `task` (or nobody for `None`).
    ///
    /// A failed delete is logged and the insert still runs; a failed insert
    /// is returned, leaving the task unassigned on the server.
    pub async fn reassign(&self, mut task: Task, target: Option<UserId>) -> ClientResult<Task> {
        let _guard = claim(&self.tasks, "task", task.id)?;
        self.apply_assignee(&mut task, target).await?;
        Ok(task)
    }

    /// Saves the scalar fields, then reassigns.
    pub async fn update_task_and_reassign(
        &self,
        id: TaskId,
        project: ProjectId,
        draft: &TaskDraft,
        target: Option<UserId>,
    ) -> ClientResult<Task> {
        let _guard = claim(&self.tasks, "task", id)?;
        let mut task = self.client.update_task(id, project, draft, target).await?;
        self.apply_assignee(&mut task, target).await?;
        Ok(task)
    }

    async fn apply_assignee(&self, task: &mut Task, target: Option<UserId>) -> ClientResult<()> {
        if let Err(err) = self.client.unassign_user_from_task(task.id).await {
            log::warn!(
                "task {}: clearing previous assignee failed, continuing: {}",
                task.id,
                err
            );
        }
        task.assignee = match target {
            Some(user) => Some(self.client.assign_user_to_task(task.id, user).await?),
            None => None,
        };
        Ok(())
    }

    /// Creates the task, then assigns `assignee` if one was chosen. A failed
    /// assignment is logged; the created task is returned either way.
    pub async fn create_task(
        &self,
        project: ProjectId,
        draft: &TaskDraft,
        assignee: Option<UserId>,
    ) -> ClientResult<Task> {
        let mut task = self.client.create_task(project, draft).await?;
        let Some(user) = assignee else {
            return Ok(task);
        };
        if task.id.is_provisional() {
            log::warn!("created task came back without an id; assignee {user} not linked");
            return Ok(task);
        }
        match self.client.assign_user_to_task(task.id, user).await {
            Ok(assigned) => task.assignee = Some(assigned),
            Err(err) => log::warn!("task {}: assigning user {} failed: {}", task.id, user, err),
        }
        Ok(task)
    }

    /// Creates the project, then records `owner` as its owner member.
    /// The membership insert is attempted once; its failure is logged.
    pub async fn create_project(&self, owner: UserId, draft: &ProjectDraft) -> ClientResult<Project> {
        let mut project = self.client.create_project(owner, draft).await?;
        if project.id.is_provisional() {
            log::warn!("created project came back without an id; owner membership skipped");
            return Ok(project);
        }
        match self
            .client
            .assign_user_to_project(owner, project.id, Role::Owner)
            .await
        {
            Ok(()) => {
                project.member_ids.insert(owner);
            }
            Err(err) => log::warn!(
                "project {}: owner membership for user {} failed: {}",
                project.id,
                owner,
                err
            ),
        }
        Ok(project)
    }

    /// Adds `users` as members, concurrently. Ids that are already members
    /// are skipped. Failures are logged and dropped; the successful ids end
    /// up in `member_ids`.
    pub async fn assign_members(&self, project: Project, users: &[UserId]) -> ClientResult<Project> {
        let _guard = claim(&self.projects, "project", project.id)?;
        Ok(self.add_members(project, users).await)
    }

    /// Saves the project fields, then adds `users` as members.
    pub async fn update_project_and_add_members(
        &self,
        id: ProjectId,
        owner: UserId,
        draft: &ProjectDraft,
        users: &[UserId],
    ) -> ClientResult<Project> {
        let _guard = claim(&self.projects, "project", id)?;
        let project = self.client.update_project(id, owner, draft).await?;
        Ok(self.add_members(project, users).await)
    }

    async fn add_members(&self, mut project: Project, users: &[UserId]) -> Project {
        let mut wanted: Vec<UserId> = users
            .iter()
            .copied()
            .filter(|user| !project.member_ids.contains(user))
            .collect();
        wanted.sort();
        wanted.dedup();

        let client = &self.client;
        let project_id = project.id;
        let results = join_all(wanted.into_iter().map(|user| async move {
            let result = client
                .assign_user_to_project(user, project_id, Role::Member)
                .await;
            (user, result)
        }))
        .await;

        for (user, result) in results {
            match result {
                Ok(()) => {
                    project.member_ids.insert(user);
                }
                Err(err) => log::warn!(
                    "project {}: adding member {} failed: {}",
                    project_id,
                    user,
                    err
                ),
            }
        }
        project
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::{FakeBackend, ScriptedTransport};
    use crate::transport::Method;

    fn backend_with_task() -> Arc<FakeBackend> {
        let backend = FakeBackend::new();
        backend.add_user(3, "ana");
        backend.add_user(9, "nine");
        backend.add_task(5, 4, "Write docs");
        backend
    }

    async fn load(reconciler: &Reconciler, id: i64) -> Task {
        reconciler.client().get_task(TaskId(id)).await.unwrap()
    }

    #[tokio::test]
    async fn reassign_deletes_before_inserting() {
        let backend = backend_with_task();
        backend.seed_assignment(5, 3);
        let reconciler = Reconciler::new(backend.client());
        let task = load(&reconciler, 5).await;

        let task = reconciler.reassign(task, Some(UserId(9))).await.unwrap();

        assert_eq!(
            backend.calls(),
            vec!["GET /tasks/5", "DELETE /users-tasks/5", "POST /users-tasks"]
        );
        assert_eq!(backend.assignees_of(5), vec![9]);
        let assignee = task.assignee.unwrap();
        assert_eq!(assignee.user_id, UserId(9));
        assert_eq!(assignee.user_name.as_deref(), Some("nine"));
    }

    #[tokio::test]
    async fn reassign_on_unassigned_task_tolerates_404() {
        let backend = backend_with_task();
        let reconciler = Reconciler::new(backend.client());
        let task = load(&reconciler, 5).await;

        let task = reconciler.reassign(task, Some(UserId(3))).await.unwrap();

        assert_eq!(task.assignee.map(|a| a.user_id), Some(UserId(3)));
        assert_eq!(backend.assignees_of(5), vec![3]);
    }

    #[tokio::test]
    async fn failed_delete_is_logged_and_insert_still_runs() {
        let backend = backend_with_task();
        backend.strict_deletes();
        let reconciler = Reconciler::new(backend.client());
        let task = load(&reconciler, 5).await;

        let task = reconciler.reassign(task, Some(UserId(9))).await.unwrap();

        assert_eq!(task.assignee.map(|a| a.user_id), Some(UserId(9)));
        assert_eq!(backend.assignees_of(5), vec![9]);
    }

    #[tokio::test]
    async fn failed_insert_is_returned() {
        let backend = backend_with_task();
        backend.seed_assignment(5, 3);
        backend.fail_assignments_to(9);
        let reconciler = Reconciler::new(backend.client());
        let task = load(&reconciler, 5).await;

        let err = reconciler.reassign(task, Some(UserId(9))).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(backend.assignees_of(5).is_empty());
    }

    #[tokio::test]
    async fn clearing_the_assignee_skips_the_insert() {
        let backend = backend_with_task();
        backend.seed_assignment(5, 3);
        let reconciler = Reconciler::new(backend.client());
        let task = load(&reconciler, 5).await;
        assert!(task.is_assigned());

        let task = reconciler.reassign(task, None).await.unwrap();

        assert_eq!(task.assignee, None);
        assert_eq!(backend.calls().last().map(String::as_str), Some("DELETE /users-tasks/5"));
        assert!(backend.assignees_of(5).is_empty());
    }

    #[tokio::test]
    async fn task_never_has_two_assignees() {
        let backend = backend_with_task();
        let reconciler = Reconciler::new(backend.client());
        let mut task = load(&reconciler, 5).await;

        for target in [Some(3), Some(9), Some(9), None, Some(3)] {
            task = reconciler.reassign(task, target.map(UserId)).await.unwrap();
            assert!(backend.assignees_of(5).len() <= 1);
            assert_eq!(
                load(&reconciler, 5).await.assignee.map(|a| a.user_id.0),
                target
            );
        }
    }

    #[tokio::test]
    async fn edit_saves_fields_then_reassigns() {
        let backend = backend_with_task();
        backend.seed_assignment(5, 3);
        let reconciler = Reconciler::new(backend.client());
        let draft = TaskDraft::new("Write more docs");

        let task = reconciler
            .update_task_and_reassign(TaskId(5), ProjectId(4), &draft, Some(UserId(9)))
            .await
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec!["PATCH /tasks/5", "DELETE /users-tasks/5", "POST /users-tasks"]
        );
        assert_eq!(task.title, "Write more docs");
        assert_eq!(task.assignee.map(|a| a.user_id), Some(UserId(9)));
    }

    #[tokio::test]
    async fn concurrent_reconciliation_of_same_task_is_busy() {
        let backend = backend_with_task();
        let reconciler = Reconciler::new(backend.client());
        let task = load(&reconciler, 5).await;
        let held = reconciler.tasks.try_acquire(TaskId(5)).unwrap();
        assert!(reconciler.is_task_busy(TaskId(5)));

        let err = reconciler
            .reassign(task.clone(), Some(UserId(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Busy(_)));
        assert_eq!(backend.calls(), vec!["GET /tasks/5"]);

        drop(held);
        assert!(!reconciler.is_task_busy(TaskId(5)));
        assert!(reconciler.reassign(task, Some(UserId(9))).await.is_ok());
    }

    #[test]
    fn guards_are_per_id() {
        let registry: InFlight<TaskId> = InFlight::default();

        let first = registry.try_acquire(TaskId(1));
        let second = registry.try_acquire(TaskId(2));
        let again = registry.try_acquire(TaskId(1));

        assert!(first.is_some());
        assert!(second.is_some());
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn create_task_then_assign() {
        let transport = ScriptedTransport::new();
        transport.on_json(Method::Post, "/tasks", 201, json!({"tasks": 30, "name": "Ship"}));
        transport.on_json(
            Method::Post,
            "/users-tasks",
            201,
            json!({"idUser": {"idUser": 9, "userName": "nine"}, "idTask": {"tasks": 30}}),
        );
        let reconciler = Reconciler::new(transport.client());

        let task = reconciler
            .create_task(ProjectId(4), &TaskDraft::new("Ship"), Some(UserId(9)))
            .await
            .unwrap();

        assert_eq!(task.id, TaskId(30));
        assert_eq!(task.assignee.map(|a| a.user_id), Some(UserId(9)));
        assert_eq!(transport.calls(), vec!["POST /tasks", "POST /users-tasks"]);
    }

    #[tokio::test]
    async fn created_task_survives_failed_assignment() {
        let transport = ScriptedTransport::new();
        transport.on_json(Method::Post, "/tasks", 201, json!({"tasks": 30, "name": "Ship"}));
        transport.on(Method::Post, "/users-tasks", 500, "");
        let reconciler = Reconciler::new(transport.client());

        let task = reconciler
            .create_task(ProjectId(4), &TaskDraft::new("Ship"), Some(UserId(9)))
            .await
            .unwrap();

        assert_eq!(task.id, TaskId(30));
        assert_eq!(task.assignee, None);
    }

    #[tokio::test]
    async fn create_project_records_owner_membership_once() {
        let transport = ScriptedTransport::new();
        transport.on_json(
            Method::Post,
            "/projects",
            201,
            json!({"idProject": 12, "project": "Alpha", "description": "demo"}),
        );
        transport.on(Method::Post, "/users-projects", 201, "");
        let reconciler = Reconciler::new(transport.client());

        let project = reconciler
            .create_project(UserId(7), &ProjectDraft::new("Alpha", "demo"))
            .await
            .unwrap();

        assert_eq!(project.id, ProjectId(12));
        assert!(project.member_ids.contains(&UserId(7)));
        assert_eq!(transport.count(Method::Post, "/users-projects"), 1);
        assert_eq!(
            transport.requests()[1].body,
            Some(json!({"idUser": {"idUser": 7}, "projects": {"idProject": 12}, "idRole": {"idRole": 1}}))
        );
    }

    #[tokio::test]
    async fn failed_owner_membership_still_returns_project() {
        let transport = ScriptedTransport::new();
        transport.on_json(Method::Post, "/projects", 201, json!({"idProject": 12, "project": "Alpha"}));
        transport.on(Method::Post, "/users-projects", 500, "");
        let reconciler = Reconciler::new(transport.client());

        let project = reconciler
            .create_project(UserId(7), &ProjectDraft::new("Alpha", "demo"))
            .await
            .unwrap();

        assert_eq!(project.id, ProjectId(12));
        assert!(project.member_ids.is_empty());
        assert_eq!(transport.count(Method::Post, "/users-projects"), 1);
    }

    #[tokio::test]
    async fn failed_parent_create_makes_no_relation_call() {
        let transport = ScriptedTransport::new();
        transport.on(Method::Post, "/projects", 500, "");
        transport.on(Method::Post, "/tasks", 500, "");
        let reconciler = Reconciler::new(transport.client());

        assert!(reconciler
            .create_project(UserId(7), &ProjectDraft::new("Alpha", "demo"))
            .await
            .is_err());
        assert!(reconciler
            .create_task(ProjectId(4), &TaskDraft::new("Ship"), Some(UserId(9)))
            .await
            .is_err());
        assert_eq!(transport.calls(), vec!["POST /projects", "POST /tasks"]);
    }

    #[tokio::test]
    async fn provisional_parent_skips_relation_call() {
        let transport = ScriptedTransport::new();
        transport.on(Method::Post, "/projects", 201, "");
        let reconciler = Reconciler::new(transport.client());

        let project = reconciler
            .create_project(UserId(7), &ProjectDraft::new("Alpha", "demo"))
            .await
            .unwrap();

        assert!(project.id.is_provisional());
        assert_eq!(transport.calls(), vec!["POST /projects"]);
    }

    #[tokio::test]
    async fn member_fan_out_keeps_partial_success() {
        let transport = ScriptedTransport::new();
        transport
            .on(Method::Post, "/users-projects", 201, "")
            .on(Method::Post, "/users-projects", 500, "")
            .on(Method::Post, "/users-projects", 201, "");
        let reconciler = Reconciler::new(transport.client());
        let project = crate::normalize::project(&json!({"idProject": 4, "project": "Alpha"}));

        let project = reconciler
            .assign_members(project, &[UserId(2), UserId(3), UserId(4)])
            .await
            .unwrap();

        assert_eq!(
            project.member_ids.into_iter().collect::<Vec<_>>(),
            vec![UserId(2), UserId(4)]
        );
        assert_eq!(transport.count(Method::Post, "/users-projects"), 3);
    }

    #[tokio::test]
    async fn existing_members_are_not_reinserted() {
        let transport = ScriptedTransport::new();
        transport.on(Method::Post, "/users-projects", 201, "");
        let reconciler = Reconciler::new(transport.client());
        let mut project = crate::normalize::project(&json!({"idProject": 4}));
        project.member_ids.insert(UserId(2));

        let project = reconciler
            .assign_members(project, &[UserId(2), UserId(5)])
            .await
            .unwrap();

        assert_eq!(transport.count(Method::Post, "/users-projects"), 1);
        assert!(project.member_ids.contains(&UserId(5)));
    }

    #[tokio::test]
    async fn failed_project_update_adds_no_members() {
        let transport = ScriptedTransport::new();
        transport.on_json(Method::Patch, "/projects/4", 500, json!({"message": "locked"}));
        let reconciler = Reconciler::new(transport.client());

        let err = reconciler
            .update_project_and_add_members(
                ProjectId(4),
                UserId(7),
                &ProjectDraft::new("Alpha", "demo"),
                &[UserId(2)],
            )
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "locked");
        assert_eq!(transport.calls(), vec!["PATCH /projects/4"]);
    }

    #[tokio::test]
    async fn project_update_then_members() {
        let transport = ScriptedTransport::new();
        transport.on_json(Method::Patch, "/projects/4", 200, json!({"idProject": 4, "project": "Beta"}));
        transport.on(Method::Post, "/users-projects", 201, "");
        let reconciler = Reconciler::new(transport.client());

        let project = reconciler
            .update_project_and_add_members(
                ProjectId(4),
                UserId(7),
                &ProjectDraft::new("Beta", "demo"),
                &[UserId(2)],
            )
            .await
            .unwrap();

        assert_eq!(project.name, "Beta");
        assert!(project.member_ids.contains(&UserId(2)));
        assert_eq!(transport.calls(), vec!["PATCH /projects/4", "POST /users-projects"]);
    }
}
