//! Task Form Component
//!
//! Create and edit dialog for a task, including its single assignee.
//! Editing starts from a fresh copy of the task; leaving the dialog before
//! it arrives cancels that read.

use chrono::NaiveDate;
use leptos::prelude::*;
use leptos::task::spawn_local;
use taskboard_core::{
    cancellable, ClientError, ClientResult, ProjectId, Task, TaskDraft, TaskStatus, UserId,
};

use crate::context::use_app_context;
use crate::hooks::{use_project_users, ListHandle};
use crate::store::{use_ui_store, TaskEditor, UiStateStoreFields};

const DATE_INPUT: &str = "%Y-%m-%d";

/// `<input type="date">` value -> ISO-8601 timestamp at midnight
pub(crate) fn to_iso(date: &str) -> Option<String> {
    let day = NaiveDate::parse_from_str(date.trim(), DATE_INPUT).ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// ISO-8601 timestamp -> `<input type="date">` value
pub(crate) fn date_input(iso: &str) -> String {
    iso.get(..10)
        .filter(|day| NaiveDate::parse_from_str(day, DATE_INPUT).is_ok())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn short_date(iso: &str) -> Option<String> {
    let day = NaiveDate::parse_from_str(iso.get(..10)?, DATE_INPUT).ok()?;
    Some(day.format("%b %d").to_string())
}

#[component]
pub fn TaskForm(
    mode: TaskEditor,
    project_id: ProjectId,
    tasks: ListHandle<ProjectId, Task>,
) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_ui_store();
    let editing_id = match mode {
        TaskEditor::Edit(id) => Some(id),
        TaskEditor::Create => None,
    };

    let (title, set_title) = signal(String::new());
    let (description, set_description) = signal(String::new());
    let (status, set_status) = signal(TaskStatus::Pending);
    let (start, set_start) = signal(String::new());
    let (end, set_end) = signal(String::new());
    let (assignee, set_assignee) = signal::<Option<UserId>>(None);
    let (loading, set_loading) = signal(editing_id.is_some());
    let (saving, set_saving) = signal(false);
    let (error, set_error) = signal::<Option<String>>(None);

    let members = use_project_users(move || Some(project_id));

    // Fresh copy for editing
    if let Some(id) = editing_id {
        let client = ctx.client();
        let (read, handle) = cancellable(async move { client.get_task(id).await });
        spawn_local(async move {
            match read.await {
                Ok(task) => {
                    set_title.set(task.title);
                    set_description.set(task.description);
                    set_status.set(task.status);
                    set_start.set(task.start_at.as_deref().map(date_input).unwrap_or_default());
                    set_end.set(task.end_at.as_deref().map(date_input).unwrap_or_default());
                    set_assignee.set(task.assignee.map(|a| a.user_id));
                    set_loading.set(false);
                }
                Err(ClientError::Cancelled) => {}
                Err(err) => {
                    set_error.set(Some(err.user_message()));
                    set_loading.set(false);
                }
            }
        });
        on_cleanup(move || handle.cancel());
    }

    let busy = move || {
        loading.get()
            || saving.get()
            || editing_id.is_some_and(|id| ctx.reconciler().is_task_busy(id))
    };
    let close = move || store.task_editor().set(None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if busy() {
            return;
        }
        let draft = TaskDraft {
            title: title.get(),
            description: description.get(),
            status: status.get(),
            start_at: to_iso(&start.get()),
            end_at: to_iso(&end.get()),
        };
        if let Err(err) = draft.validate() {
            set_error.set(Some(err.user_message()));
            return;
        }
        let reconciler = ctx.reconciler();
        let target = assignee.get();

        set_saving.set(true);
        set_error.set(None);
        spawn_local(async move {
            let saved: ClientResult<Task> = match editing_id {
                Some(id) => {
                    reconciler
                        .update_task_and_reassign(id, project_id, &draft, target)
                        .await
                }
                None => reconciler.create_task(project_id, &draft, target).await,
            };
            set_saving.set(false);
            match saved {
                Ok(task) => {
                    tasks.upsert(task);
                    tasks.refetch();
                    close();
                }
                Err(err) => set_error.set(Some(err.user_message())),
            }
        });
    };

    view! {
        <div class="modal-backdrop">
            <form class="task-form modal" on:submit=on_submit>
                <h2>{if editing_id.is_some() { "Edit task" } else { "New task" }}</h2>

                <Show when=move || loading.get()>
                    <div class="loading small">"Loading..."</div>
                </Show>

                <input
                    type="text"
                    placeholder="Task name"
                    prop:value=move || title.get()
                    on:input=move |ev| set_title.set(event_target_value(&ev))
                />
                <textarea
                    placeholder="Description"
                    prop:value=move || description.get()
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                ></textarea>

                <label>
                    "Status"
                    <select
                        prop:value=move || status.get().id().to_string()
                        on:change=move |ev| {
                            let picked = event_target_value(&ev).parse().ok().and_then(TaskStatus::from_id);
                            set_status.set(picked.unwrap_or_default());
                        }
                    >
                        {TaskStatus::ALL
                            .into_iter()
                            .map(|s| view! { <option value=s.id().to_string()>{s.label()}</option> })
                            .collect_view()}
                    </select>
                </label>

                <div class="date-row">
                    <label>
                        "Start"
                        <input
                            type="date"
                            prop:value=move || start.get()
                            on:input=move |ev| set_start.set(event_target_value(&ev))
                        />
                    </label>
                    <label>
                        "Due"
                        <input
                            type="date"
                            prop:value=move || end.get()
                            on:input=move |ev| set_end.set(event_target_value(&ev))
                        />
                    </label>
                </div>

                <label>
                    "Assignee"
                    <select
                        prop:value=move || assignee.get().map(|id| id.to_string()).unwrap_or_default()
                        on:change=move |ev| {
                            set_assignee.set(event_target_value(&ev).parse::<i64>().ok().map(UserId));
                        }
                    >
                        <option value="">"Unassigned"</option>
                        <For
                            each=move || members.data()
                            key=|user| user.id
                            children=move |user| view! {
                                <option value=user.id.to_string()>
                                    {if user.name.is_empty() { user.email.clone() } else { user.name.clone() }}
                                </option>
                            }
                        />
                    </select>
                </label>

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
