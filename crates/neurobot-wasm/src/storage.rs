use web_sys::Storage;

use neurobot_chat::{KeyValueStorage, StoreError};

use crate::utils::describe_js_error;

/// `window.localStorage` as a history backend.
///
/// When the browser denies access (private mode, disabled storage) reads
/// return nothing and writes fail, so the app still runs without persistence.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let storage = crate::window()
            .ok()
            .and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable, history will not be kept");
        }
        Self { storage }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    pub fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.remove_item(key) {
                log::warn!(
                    "failed to remove {:?} from localStorage: {}",
                    key,
                    describe_js_error(&e)
                );
            }
        }
    }
}

impl KeyValueStorage for LocalStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("localStorage is disabled".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::WriteRejected {
                key: key.to_string(),
                reason: describe_js_error(&e),
            })
    }
}
