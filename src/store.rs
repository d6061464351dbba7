//! UI State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity.

use leptos::prelude::*;
use reactive_stores::Store;
use taskboard_core::{Project, TaskId};

/// What the project dialog is doing
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectEditor {
    Create,
    Edit(Project),
}

/// What the task dialog is doing
#[derive(Clone, Debug, PartialEq)]
pub enum TaskEditor {
    Create,
    Edit(TaskId),
}

/// Dashboard state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct UiState {
    /// Project whose tasks are on the board
    pub active_project: Option<Project>,
    pub project_editor: Option<ProjectEditor>,
    pub task_editor: Option<TaskEditor>,
}

/// Type alias for the store
pub type UiStore = Store<UiState>;

/// Get the UI store from context
pub fn use_ui_store() -> UiStore {
    expect_context::<UiStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Keep the selection in sync after the project was saved
pub fn store_refresh_active(store: &UiStore, saved: &Project) {
    let binding = store.active_project();
    let mut active = binding.write();
    if active.as_ref().is_some_and(|project| project.id == saved.id) {
        *active = Some(saved.clone());
    }
}

/// Clear everything tied to the signed-in user
pub fn store_reset(store: &UiStore) {
    store.active_project().set(None);
    store.project_editor().set(None);
    store.task_editor().set(None);
}
