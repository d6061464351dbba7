//! List Hooks
//!
//! Bind a `ListQuery` to the component that owns it: a signal mirrors the
//! query's snapshot, the query follows a reactive key, and unmounting
//! cancels whatever is still in flight.

use leptos::prelude::*;
use leptos::task::spawn_local;
use taskboard_core::domain::Entity;
use taskboard_core::{
    ListQuery, ListSnapshot, LoadOutcome, Project, ProjectId, Task, User, UserId,
};

use crate::context::use_app_context;

/// A mounted list: its snapshot signal plus the query behind it.
pub struct ListHandle<K: 'static, T: 'static> {
    pub snapshot: ReadSignal<ListSnapshot<T>>,
    query: StoredValue<ListQuery<K, T>>,
}

impl<K: 'static, T: 'static> Clone for ListHandle<K, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: 'static, T: 'static> Copy for ListHandle<K, T> {}

impl<K, T> ListHandle<K, T>
where
    K: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn data(&self) -> Vec<T> {
        self.snapshot.get().data
    }

    pub fn refetch(&self) {
        let query = self.query.get_value();
        spawn_local(async move {
            query.refetch().await;
        });
    }
}

impl<K, T> ListHandle<K, T>
where
    K: Clone + Send + Sync + 'static,
    T: Entity + Send + Sync + 'static,
{
    /// Optimistic local insert/replace; the next fetch has the final word.
    pub fn upsert(&self, item: T) {
        self.query.get_value().upsert(item);
    }
}

/// Mirrors `query` into a signal and keeps it fetching for `key()`.
pub fn use_list_query<K, T>(
    query: ListQuery<K, T>,
    key: impl Fn() -> Option<K> + 'static,
) -> ListHandle<K, T>
where
    K: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    let (snapshot, set_snapshot) = signal(query.snapshot());
    query.subscribe(move |next| {
        // The owner may already be gone when a late update lands.
        let _ = set_snapshot.try_set(next.clone());
    });

    let tracked = query.clone();
    Effect::new(move |_| {
        let query = tracked.clone();
        match key() {
            Some(key) => spawn_local(async move {
                if let LoadOutcome::Failed(err) = query.track(key).await {
                    log::warn!("list load failed: {err}");
                }
            }),
            None => query.cancel(),
        }
    });

    let mounted = query.clone();
    on_cleanup(move || mounted.cancel());

    ListHandle {
        snapshot,
        query: StoredValue::new(query),
    }
}

// ========================
// Resource lists
// ========================

/// Projects of the signed-in user
pub fn use_projects() -> ListHandle<UserId, Project> {
    let ctx = use_app_context();
    let client = ctx.client();
    let query = ListQuery::new("projects", move |user| {
        let client = client.clone();
        async move { client.list_projects_for_user(user).await }
    });
    use_list_query(query, move || ctx.user_id())
}

pub fn use_tasks(project: impl Fn() -> Option<ProjectId> + 'static) -> ListHandle<ProjectId, Task> {
    let client = use_app_context().client();
    let query = ListQuery::new("tasks", move |project| {
        let client = client.clone();
        async move { client.list_tasks_for_project(project).await }
    });
    use_list_query(query, project)
}

pub fn use_project_users(
    project: impl Fn() -> Option<ProjectId> + 'static,
) -> ListHandle<ProjectId, User> {
    let client = use_app_context().client();
    let query = ListQuery::new("project users", move |project| {
        let client = client.clone();
        async move { client.list_users_for_project(project).await }
    });
    use_list_query(query, project)
}

pub fn use_all_users() -> ListHandle<(), User> {
    let client = use_app_context().client();
    let query = ListQuery::new("users", move |()| {
        let client = client.clone();
        async move { client.list_all_users().await }
    });
    use_list_query(query, || Some(()))
}
