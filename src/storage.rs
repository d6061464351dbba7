//! Browser Storage
//!
//! `SessionStore` over `localStorage` / `sessionStorage`. The `Storage`
//! handle is looked up on every call; it is not `Send`.

use taskboard_core::SessionStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrowserStore {
    /// `localStorage`, survives restarts
    Local,
    /// `sessionStorage`, cleared with the tab
    Session,
}

impl BrowserStore {
    fn storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        let storage = match self {
            BrowserStore::Local => window.local_storage(),
            BrowserStore::Session => window.session_storage(),
        };
        storage.ok().flatten()
    }
}

impl SessionStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        let stored = self
            .storage()
            .map(|storage| storage.set_item(key, value).is_ok());
        if stored != Some(true) {
            log::warn!("{:?} storage unavailable; {} not saved", self, key);
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage() {
            let _ = storage.remove_item(key);
        }
    }
}
