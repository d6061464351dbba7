//! Session
//!
//! Sign-in state shared by every view. The signed-in user is kept as a JSON
//! record in one of two key-value stores: the persistent one when the user
//! asked to be remembered, the ephemeral one otherwise.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::client::{ApiClient, LoginOutcome};
use crate::domain::{ClientError, ClientResult, SessionUser, UserId};
use crate::normalize;

pub const USER_KEY: &str = "taskboard.user";
pub const FLAG_KEY: &str = "taskboard.logged";

/// String key-value storage (browser `localStorage` / `sessionStorage`).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

pub struct Session {
    persistent: Arc<dyn SessionStore>,
    ephemeral: Arc<dyn SessionStore>,
    current: Mutex<Option<SessionUser>>,
}

impl Session {
    /// Restores the user from the persistent store, then the ephemeral one.
    pub fn load(persistent: Arc<dyn SessionStore>, ephemeral: Arc<dyn SessionStore>) -> Self {
        let user = [&persistent, &ephemeral]
            .into_iter()
            .find_map(|store| read_user(store.as_ref()));
        if let Some(user) = &user {
            log::debug!("restored session for {}", user.display_name());
        }
        Self {
            persistent,
            ephemeral,
            current: Mutex::new(user),
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<SessionUser>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.current().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current().as_ref().and_then(|user| user.id)
    }

    /// The signed-in user's id, for writes that need an owner.
    pub fn require_user_id(&self) -> ClientResult<UserId> {
        self.user_id().ok_or(ClientError::NotSignedIn)
    }

    /// True with a loaded user, or when either store still carries the flag.
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
            || [&self.persistent, &self.ephemeral]
                .iter()
                .any(|store| store.get(FLAG_KEY).as_deref() == Some("true"))
    }

    pub fn sign_in(&self, user: SessionUser, remember: bool) {
        let (target, other) = if remember {
            (&self.persistent, &self.ephemeral)
        } else {
            (&self.ephemeral, &self.persistent)
        };
        match serde_json::to_string(&user) {
            Ok(record) => {
                target.set(USER_KEY, &record);
                target.set(FLAG_KEY, "true");
                other.remove(USER_KEY);
                other.remove(FLAG_KEY);
            }
            Err(err) => log::warn!("session record not stored: {err}"),
        }
        log::info!("signed in as {}", user.display_name());
        *self.current() = Some(user);
    }

    /// Logs in and, when the server accepts the credentials, signs in.
    pub async fn login(
        &self,
        client: &ApiClient,
        email: &str,
        password: &str,
        remember: bool,
    ) -> ClientResult<LoginOutcome> {
        let outcome = client.login(email, password).await?;
        if let LoginOutcome::Authenticated(user) = &outcome {
            self.sign_in(user.clone(), remember);
        }
        Ok(outcome)
    }

    pub fn sign_out(&self) {
        for store in [&self.persistent, &self.ephemeral] {
            store.remove(USER_KEY);
            store.remove(FLAG_KEY);
        }
        *self.current() = None;
        log::info!("signed out");
    }
}

/// Reads the stored record through the normalizer so older id spellings
/// (`idUser`, `userId`) still restore.
fn read_user(store: &dyn SessionStore) -> Option<SessionUser> {
    let raw = store.get(USER_KEY)?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(record) if record.is_object() => Some(normalize::session_user(&record)),
        Ok(_) | Err(_) => {
            log::warn!("ignoring malformed session record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::ScriptedTransport;
    use crate::transport::Method;

    fn ana() -> SessionUser {
        SessionUser {
            id: Some(UserId(7)),
            user_name: "ana".into(),
            email: "a@x.io".into(),
            user_status: Some(1),
        }
    }

    fn stores() -> (Arc<MemoryStore>, Arc<MemoryStore>) {
        (MemoryStore::new(), MemoryStore::new())
    }

    #[test]
    fn remembered_sign_in_uses_persistent_store() {
        let (persistent, ephemeral) = stores();
        let session = Session::load(persistent.clone(), ephemeral.clone());

        session.sign_in(ana(), true);

        let record: Value = serde_json::from_str(&persistent.get(USER_KEY).unwrap()).unwrap();
        assert_eq!(
            record,
            json!({"id": 7, "userName": "ana", "email": "a@x.io", "userStatus": 1})
        );
        assert_eq!(persistent.get(FLAG_KEY).as_deref(), Some("true"));
        assert_eq!(ephemeral.get(USER_KEY), None);
        assert_eq!(session.user_id(), Some(UserId(7)));
    }

    #[test]
    fn unremembered_sign_in_uses_ephemeral_store() {
        let (persistent, ephemeral) = stores();
        let session = Session::load(persistent.clone(), ephemeral.clone());

        session.sign_in(ana(), false);

        assert!(ephemeral.get(USER_KEY).is_some());
        assert_eq!(persistent.get(USER_KEY), None);
    }

    #[test]
    fn load_prefers_persistent_record() {
        let (persistent, ephemeral) = stores();
        persistent.set(USER_KEY, r#"{"id": 7, "userName": "ana"}"#);
        ephemeral.set(USER_KEY, r#"{"id": 8, "userName": "bo"}"#);

        let session = Session::load(persistent, ephemeral);

        assert_eq!(session.user_id(), Some(UserId(7)));
    }

    #[test]
    fn load_falls_back_to_ephemeral_and_accepts_aliases() {
        let (persistent, ephemeral) = stores();
        ephemeral.set(USER_KEY, r#"{"idUser": 8, "userName": "bo"}"#);

        let session = Session::load(persistent, ephemeral);

        assert_eq!(session.user().map(|u| u.user_name), Some("bo".into()));
        assert_eq!(session.user_id(), Some(UserId(8)));
    }

    #[test]
    fn malformed_record_is_ignored() {
        let (persistent, ephemeral) = stores();
        persistent.set(USER_KEY, "not json");

        let session = Session::load(persistent, ephemeral);

        assert_eq!(session.user(), None);
        assert_eq!(session.require_user_id(), Err(ClientError::NotSignedIn));
    }

    #[test]
    fn flag_alone_counts_as_authenticated() {
        let (persistent, ephemeral) = stores();
        ephemeral.set(FLAG_KEY, "true");

        let session = Session::load(persistent, ephemeral);

        assert!(session.user().is_none());
        assert!(session.is_authenticated());
    }

    #[test]
    fn sign_out_clears_both_stores() {
        let (persistent, ephemeral) = stores();
        let session = Session::load(persistent.clone(), ephemeral.clone());
        session.sign_in(ana(), true);
        ephemeral.set(FLAG_KEY, "true");

        session.sign_out();

        assert!(!session.is_authenticated());
        for store in [&persistent, &ephemeral] {
            assert_eq!(store.get(USER_KEY), None);
            assert_eq!(store.get(FLAG_KEY), None);
        }
    }

    #[tokio::test]
    async fn login_signs_in_only_when_accepted() {
        let transport = ScriptedTransport::new();
        transport
            .on(Method::Post, "/users/login", 401, "")
            .on_json(
                Method::Post,
                "/users/login",
                200,
                json!({"idUser": 7, "userName": "ana", "email": "a@x.io"}),
            );
        let client = transport.client();
        let (persistent, ephemeral) = stores();
        let session = Session::load(persistent, ephemeral);

        let rejected = session.login(&client, "a@x.io", "wrong", true).await.unwrap();
        assert!(matches!(rejected, LoginOutcome::InvalidCredentials { .. }));
        assert!(!session.is_authenticated());

        let accepted = session.login(&client, "a@x.io", "right", true).await.unwrap();
        assert!(matches!(accepted, LoginOutcome::Authenticated(_)));
        assert_eq!(session.user_id(), Some(UserId(7)));
    }
}
