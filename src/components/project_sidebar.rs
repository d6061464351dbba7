//! Project Sidebar Component
//!
//! Projects of the signed-in user with a name search, the active selection
//! and logout.

use leptos::prelude::*;
use taskboard_core::{LoadState, Project, UserId};

use crate::context::use_app_context;
use crate::hooks::ListHandle;
use crate::store::{store_reset, use_ui_store, ProjectEditor, UiStateStoreFields};

fn matches_search(project: &Project, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || project.name.to_lowercase().contains(&query)
}

#[component]
pub fn ProjectSidebar(projects: ListHandle<UserId, Project>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_ui_store();

    let user_label = move || {
        ctx.user
            .get()
            .map(|user| user.display_name().to_string())
            .unwrap_or_default()
    };
    let active_id = move || store.active_project().get().map(|project| project.id);
    let (search, set_search) = signal(String::new());
    let filtered = move || {
        let query = search.get();
        projects
            .data()
            .into_iter()
            .filter(|project| matches_search(project, &query))
            .collect::<Vec<_>>()
    };

    let on_logout = move |_| {
        store_reset(&store);
        ctx.sign_out();
    };

    view! {
        <aside class="project-sidebar">
            <div class="sidebar-header">
                <span class="user-name">{user_label}</span>
                <button class="logout-btn" on:click=on_logout>"Log out"</button>
            </div>

            <button
                class="new-project-btn"
                on:click=move |_| store.project_editor().set(Some(ProjectEditor::Create))
            >
                "+ New project"
            </button>

            <input
                type="search"
                class="project-search"
                placeholder="Search projects"
                prop:value=move || search.get()
                on:input=move |ev| set_search.set(event_target_value(&ev))
            />

            <Show when=move || projects.snapshot.get().state == LoadState::Loading>
                <div class="loading small">"Loading..."</div>
            </Show>
            {move || projects.snapshot.get().error.map(|error| view! {
                <p class="list-error">{error}</p>
            })}
            <Show when=move || {
                let snapshot = projects.snapshot.get();
                snapshot.state == LoadState::Ready && snapshot.data.is_empty()
            }>
                <p class="empty-hint">"No projects yet"</p>
            </Show>
            <Show when=move || !projects.data().is_empty() && filtered().is_empty()>
                <p class="empty-hint">"No matching projects"</p>
            </Show>

            <ul class="project-list">
                <For
                    each=filtered
                    key=|project| (project.id, project.name.clone(), project.status)
                    children=move |project| {
                        let id = project.id;
                        let is_active = move || active_id() == Some(id);
                        let selected = project.clone();
                        let edited = project.clone();
                        view! {
                            <li class=move || if is_active() { "project-item active" } else { "project-item" }>
                                <button
                                    class="project-name"
                                    on:click=move |_| {
                                        store.task_editor().set(None);
                                        store.active_project().set(Some(selected.clone()));
                                    }
                                >
                                    {project.name.clone()}
                                    <span class="task-count">{project.task_count}</span>
                                </button>
                                <button
                                    class="edit-btn small"
                                    title="Edit project"
                                    on:click=move |_| store
                                        .project_editor()
                                        .set(Some(ProjectEditor::Edit(edited.clone())))
                                >
                                    "✎"
                                </button>
                            </li>
                        }
                    }
                />
            </ul>
        </aside>
    }
}
