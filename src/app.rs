//! Taskboard Frontend App
//!
//! Signed out: the login/register view. Signed in: project sidebar on the
//! left, task board of the active project in the center.

use std::sync::Arc;

use leptos::prelude::*;
use reactive_stores::Store;
use taskboard_core::{ApiClient, ApiConfig, Session};

use crate::components::{LoginForm, ProjectForm, ProjectSidebar, TaskBoard};
use crate::context::AppContext;
use crate::hooks::use_projects;
use crate::storage::BrowserStore;
use crate::store::{UiState, UiStateStoreFields};

const SESSION_EXPIRED: &str = "Your session expired, please sign in again";

#[component]
pub fn App() -> impl IntoView {
    let config = ApiConfig::from_env();
    log::info!("API at {}", config.base_url);
    let session = Session::load(Arc::new(BrowserStore::Local), Arc::new(BrowserStore::Session));
    let authenticated = session.is_authenticated();
    let ctx = AppContext::new(ApiClient::from_config(config), Arc::new(session));

    // Provide context to all children
    provide_context(ctx);
    provide_context(Store::new(UiState::default()));

    // Only the flag survived: the stored record is gone, sign in again
    if authenticated && ctx.user_id().is_none() {
        log::warn!("session flag without a usable user record");
        ctx.sign_out_with_notice(SESSION_EXPIRED);
    }

    view! {
        {move || if ctx.user.get().is_some() {
            view! { <Dashboard /> }.into_any()
        } else {
            view! { <LoginForm /> }.into_any()
        }}
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let store = crate::store::use_ui_store();
    let projects = use_projects();

    view! {
        <div class="app-layout">
            <ProjectSidebar projects=projects />

            <main class="main-content">
                {move || match store.active_project().get() {
                    Some(project) => view! { <TaskBoard project=project /> }.into_any(),
                    None => view! {
                        <p class="empty-hint">"Select or create a project"</p>
                    }.into_any(),
                }}
            </main>

            {move || store.project_editor().get().map(|mode| view! {
                <ProjectForm mode=mode projects=projects />
            })}
        </div>
    }
}
