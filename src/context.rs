//! Application Context
//!
//! Shared handles and signals provided via Leptos Context API.

use std::sync::Arc;

use leptos::prelude::*;
use taskboard_core::{ApiClient, Reconciler, Session, SessionUser, UserId};

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    client: StoredValue<ApiClient>,
    session: StoredValue<Arc<Session>>,
    reconciler: StoredValue<Reconciler>,
    /// Signed-in user, mirrored from the session
    pub user: RwSignal<Option<SessionUser>>,
    /// One-shot message for the login view
    notice: RwSignal<Option<String>>,
}

impl AppContext {
    pub fn new(client: ApiClient, session: Arc<Session>) -> Self {
        let user = RwSignal::new(session.user());
        Self {
            reconciler: StoredValue::new(Reconciler::new(client.clone())),
            client: StoredValue::new(client),
            session: StoredValue::new(session),
            user,
            notice: RwSignal::new(None),
        }
    }

    pub fn client(&self) -> ApiClient {
        self.client.get_value()
    }

    pub fn session(&self) -> Arc<Session> {
        self.session.get_value()
    }

    pub fn reconciler(&self) -> Reconciler {
        self.reconciler.get_value()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.get().and_then(|user| user.id)
    }

    /// Call after the session signed someone in
    pub fn signed_in(&self) {
        self.user.set(self.session().user());
    }

    pub fn sign_out(&self) {
        self.session().sign_out();
        self.user.set(None);
    }

    /// Signs out and leaves `message` for the login view.
    pub fn sign_out_with_notice(&self, message: impl Into<String>) {
        self.notice.set(Some(message.into()));
        self.sign_out();
    }

    /// Returns the pending notice once.
    pub fn take_notice(&self) -> Option<String> {
        let notice = self.notice.get_untracked();
        if notice.is_some() {
            self.notice.set(None);
        }
        notice
    }
}

pub fn use_app_context() -> AppContext {
    use_context::<AppContext>().expect("AppContext should be provided")
}
