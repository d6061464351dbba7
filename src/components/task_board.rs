//! Task Board Component
//!
//! Tasks of the active project in one column per status.

use leptos::prelude::*;
use taskboard_core::{LoadState, Project, TaskStatus};

use super::task_form::short_date;
use super::TaskForm;
use crate::hooks::use_tasks;
use crate::store::{use_ui_store, TaskEditor, UiStateStoreFields};

#[component]
pub fn TaskBoard(project: Project) -> impl IntoView {
    let store = use_ui_store();
    let project_id = project.id;
    let tasks = use_tasks(move || Some(project_id));

    let column = move |status: TaskStatus| {
        view! {
            <section class="task-column">
                <h3>
                    {status.label()}
                    <span class="count">
                        {move || tasks.data().iter().filter(|t| t.status == status).count()}
                    </span>
                </h3>
                <For
                    each=move || {
                        tasks
                            .data()
                            .into_iter()
                            .filter(|task| task.status == status)
                            .collect::<Vec<_>>()
                    }
                    key=|task| (task.id, task.title.clone(), task.assignee.as_ref().map(|a| a.user_id), task.end_at.clone())
                    children=move |task| {
                        let id = task.id;
                        let assignee = task
                            .assignee
                            .as_ref()
                            .map(|a| a.display_name())
                            .unwrap_or_else(|| "Unassigned".to_string());
                        let due = task.end_at.as_deref().and_then(short_date);
                        view! {
                            <article
                                class="task-card"
                                on:click=move |_| store.task_editor().set(Some(TaskEditor::Edit(id)))
                            >
                                <h4>{task.title.clone()}</h4>
                                <p class="assignee">{assignee}</p>
                                {due.map(|due| view! { <p class="due">"Due " {due}</p> })}
                            </article>
                        }
                    }
                />
            </section>
        }
    };

    view! {
        <div class="task-board">
            <header class="board-header">
                <h2>{project.name.clone()}</h2>
                <p class="description">{project.description.clone()}</p>
                <button on:click=move |_| store.task_editor().set(Some(TaskEditor::Create))>
                    "+ New task"
                </button>
            </header>

            <Show when=move || tasks.snapshot.get().state == LoadState::Loading>
                <div class="loading">"Loading tasks..."</div>
            </Show>
            {move || tasks.snapshot.get().error.map(|error| view! {
                <p class="list-error">{error}</p>
            })}

            <div class="columns">
                {TaskStatus::ALL.into_iter().map(column).collect_view()}
            </div>

            {move || store.task_editor().get().map(|mode| view! {
                <TaskForm mode=mode project_id=project_id tasks=tasks />
            })}
        </div>
    }
}
