//! Project Form Component
//!
//! Create dialog (owner = signed-in user) and edit dialog, which also adds
//! members picked from the user directory. Editing reloads the project from
//! the server; closing the dialog first cancels that read.

use leptos::prelude::*;
use leptos::task::spawn_local;
use taskboard_core::{cancellable, ClientError, ClientResult, Project, ProjectDraft, User, UserId};

use crate::context::use_app_context;
use crate::hooks::{use_all_users, use_project_users, ListHandle};
use crate::store::{store_refresh_active, use_ui_store, ProjectEditor, UiStateStoreFields};

fn matches_filter(user: &User, filter: &str) -> bool {
    let filter = filter.trim().to_lowercase();
    filter.is_empty()
        || user.name.to_lowercase().contains(&filter)
        || user.email.to_lowercase().contains(&filter)
}

/// Takes the server's fields; keeps what the fresh read left blank.
fn merge_fresh(current: &mut Project, fresh: Project) {
    current.name = fresh.name;
    current.description = fresh.description;
    current.status = fresh.status;
    if fresh.created_at.is_some() {
        current.created_at = fresh.created_at;
    }
    if fresh.owner_id.is_some() {
        current.owner_id = fresh.owner_id;
    }
    current.member_ids.extend(fresh.member_ids);
}

#[component]
pub fn ProjectForm(mode: ProjectEditor, projects: ListHandle<UserId, Project>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_ui_store();

    let editing = match &mode {
        ProjectEditor::Edit(project) => Some(project.clone()),
        ProjectEditor::Create => None,
    };
    let editing_id = editing.as_ref().map(|project| project.id);

    let (name, set_name) = signal(editing.as_ref().map(|p| p.name.clone()).unwrap_or_default());
    let (description, set_description) =
        signal(editing.as_ref().map(|p| p.description.clone()).unwrap_or_default());
    let (active, set_active) = signal(editing.as_ref().map(|p| p.status).unwrap_or(true));
    let (filter, set_filter) = signal(String::new());
    let (picked, set_picked) = signal(Vec::<UserId>::new());
    let (loading, set_loading) = signal(editing.is_some());
    let (saving, set_saving) = signal(false);
    let (error, set_error) = signal::<Option<String>>(None);
    let (current, set_current) = signal(editing);

    // Fresh copy for editing; the list row may be stale
    if let Some(id) = editing_id {
        let client = ctx.client();
        let (read, handle) = cancellable(async move { client.get_project(id).await });
        spawn_local(async move {
            match read.await {
                Ok(project) => {
                    set_name.set(project.name.clone());
                    set_description.set(project.description.clone());
                    set_active.set(project.status);
                    set_current.update(|current| {
                        if let Some(current) = current {
                            merge_fresh(current, project);
                        }
                    });
                    set_loading.set(false);
                }
                Err(ClientError::Cancelled) => {}
                Err(err) => {
                    log::warn!("project {id} reload failed: {err}");
                    set_error.set(Some(err.user_message()));
                    set_loading.set(false);
                }
            }
        });
        on_cleanup(move || handle.cancel());
    }

    let members = use_project_users(move || editing_id);
    let directory = use_all_users();
    let is_member = move |id: UserId| members.data().iter().any(|user| user.id == id);

    let busy = move || {
        loading.get()
            || saving.get()
            || editing_id.is_some_and(|id| ctx.reconciler().is_project_busy(id))
    };
    let close = move || store.project_editor().set(None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy() {
            return;
        }
        let mut draft = ProjectDraft::new(name.get(), description.get());
        draft.active = active.get();
        if let Err(err) = draft.validate() {
            set_error.set(Some(err.user_message()));
            return;
        }
        let owner = match ctx.session().require_user_id() {
            Ok(owner) => owner,
            Err(err) => {
                set_error.set(Some(err.user_message()));
                return;
            }
        };
        let reconciler = ctx.reconciler();
        let editing = current.get_untracked();
        let new_members: Vec<UserId> = picked
            .get()
            .into_iter()
            .filter(|id| !is_member(*id))
            .collect();

        set_saving.set(true);
        set_error.set(None);
        spawn_local(async move {
            let saved: ClientResult<Project> = match editing {
                Some(project) => {
                    draft.created_at = project.created_at.clone();
                    let owner = project.owner_id.unwrap_or(owner);
                    reconciler
                        .update_project_and_add_members(project.id, owner, &draft, &new_members)
                        .await
                }
                None => reconciler.create_project(owner, &draft).await,
            };
            set_saving.set(false);
            match saved {
                Ok(project) => {
                    projects.upsert(project.clone());
                    if editing_id.is_some() {
                        store_refresh_active(&store, &project);
                    } else {
                        store.active_project().set(Some(project));
                    }
                    projects.refetch();
                    close();
                }
                Err(err) => set_error.set(Some(err.user_message())),
            }
        });
    };

    let toggle = move |id: UserId| {
        set_picked.update(|picked| match picked.iter().position(|p| *p == id) {
            Some(index) => {
                picked.remove(index);
            }
            None => picked.push(id),
        })
    };

    view! {
        <div class="modal-backdrop">
            <form class="project-form modal" on:submit=on_submit>
                <h2>{if editing_id.is_some() { "Edit project" } else { "New project" }}</h2>

                <Show when=move || loading.get()>
                    <div class="loading small">"Loading..."</div>
                </Show>

                <input
                    type="text"
                    placeholder="Project name"
                    prop:value=move || name.get()
                    on:input=move |ev| set_name.set(event_target_value(&ev))
                />
                <textarea
                    placeholder="Description"
                    prop:value=move || description.get()
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                ></textarea>
                <label class="checkbox-row">
                    <input
                        type="checkbox"
                        prop:checked=move || active.get()
                        on:change=move |ev| set_active.set(event_target_checked(&ev))
                    />
                    "Active"
                </label>

                <Show when=move || editing_id.is_some()>
                    <fieldset class="member-picker">
                        <legend>"Members"</legend>
                        <input
                            type="search"
                            placeholder="Filter by name or email"
                            prop:value=move || filter.get()
                            on:input=move |ev| set_filter.set(event_target_value(&ev))
                        />
                        <ul class="user-list">
                            <For
                                each=move || {
                                    let filter = filter.get();
                                    directory
                                        .data()
                                        .into_iter()
                                        .filter(|user| matches_filter(user, &filter))
                                        .collect::<Vec<_>>()
                                }
                                key=|user| user.id
                                children=move |user| {
                                    let id = user.id;
                                    view! {
                                        <li>
                                            <label>
                                                <input
                                                    type="checkbox"
                                                    prop:disabled=move || is_member(id)
                                                    prop:checked=move || is_member(id) || picked.get().contains(&id)
                                                    on:change=move |_| toggle(id)
                                                />
                                                {user.name.clone()}
                                                <span class="user-email">{user.email.clone()}</span>
                                            </label>
                                        </li>
                                    }
                                }
                            />
                        </ul>
                    </fieldset>
                </Show>

                {move || error.get().map(|text| view! { <p class="form-error">{text}</p> })}

                <div class="form-actions">
                    <button type="button" on:click=move |_| close()>"Cancel"</button>
                    <button type="submit" disabled=busy>
                        {move || if saving.get() { "Saving..." } else { "Save" }}
                    </button>
                </div>
            </form>
        </div>
    }
}
