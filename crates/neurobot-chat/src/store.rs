//! Persistent store adapter for the conversation history.
//!
//! The whole history is kept as one JSON document under a single key and is
//! always rewritten in full.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use neurobot_types::{ArchivedConversation, Conversation, ConversationId};

/// Current layout of the persisted document
pub const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage rejected write to {key:?}: {reason}")]
    WriteRejected { key: String, reason: String },
    #[error("malformed history document: {0}")]
    Malformed(String),
    #[error("unsupported history version {found} (newest known is {SCHEMA_VERSION})")]
    NewerVersion { found: u32 },
    #[error("history under {key:?} was written by a newer client (version {found}), not overwriting it")]
    Protected { key: String, found: u32 },
}

/// String key/value backend the history is persisted into
pub trait KeyValueStorage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with one raw value
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The persisted history document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub version: u32,
    /// Next identifier to hand out; always greater than every stored id
    pub next_id: u64,
    pub conversations: Vec<ArchivedConversation>,
}

impl Default for PersistedHistory {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            next_id: 1,
            conversations: Vec::new(),
        }
    }
}

impl PersistedHistory {
    /// Upgrade a version 1 document: a bare array of conversations
    fn from_legacy(conversations: Vec<Conversation>) -> Self {
        let conversations: Vec<ArchivedConversation> = conversations
            .into_iter()
            .enumerate()
            .map(|(i, messages)| ArchivedConversation {
                id: ConversationId(i as u64 + 1),
                messages,
            })
            .collect();
        Self {
            version: SCHEMA_VERSION,
            next_id: conversations.len() as u64 + 1,
            conversations,
        }
    }

    fn repair_next_id(&mut self) {
        let max_id = self
            .conversations
            .iter()
            .map(|c| c.id.0)
            .max()
            .unwrap_or(0);
        if self.next_id <= max_id {
            log::warn!(
                "history counter {} behind highest id {}, repairing",
                self.next_id,
                max_id
            );
            self.next_id = max_id + 1;
        }
    }

    /// Parse a raw stored value, accepting both schema versions
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let malformed = |e: serde_json::Error| StoreError::Malformed(e.to_string());
        let value: Value = serde_json::from_str(raw).map_err(malformed)?;
        match value {
            Value::Array(_) => {
                let legacy: Vec<Conversation> = serde_json::from_value(value).map_err(malformed)?;
                log::info!("migrating {} legacy conversations", legacy.len());
                Ok(Self::from_legacy(legacy))
            }
            Value::Object(_) => {
                let mut history: PersistedHistory =
                    serde_json::from_value(value).map_err(malformed)?;
                if history.version > SCHEMA_VERSION {
                    return Err(StoreError::NewerVersion {
                        found: history.version,
                    });
                }
                history.version = SCHEMA_VERSION;
                history.repair_next_id();
                Ok(history)
            }
            other => Err(StoreError::Malformed(format!(
                "unexpected history document: {}",
                other
            ))),
        }
    }
}

/// Reads and writes the history document under a fixed key
///
/// A document written by a newer client is never overwritten: once `load`
/// has seen one, `save` refuses and the history lives in memory only.
pub struct HistoryStore<B> {
    backend: B,
    key: String,
    newer_version: Option<u32>,
}

impl<B: KeyValueStorage> HistoryStore<B> {
    pub fn open(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            newer_version: None,
        }
    }

    /// Load the stored history. Missing or unreadable data yields an empty history.
    pub fn load(&mut self) -> PersistedHistory {
        let Some(raw) = self.backend.read(&self.key) else {
            log::debug!("no history stored under {:?}", self.key);
            return PersistedHistory::default();
        };

        match PersistedHistory::parse(&raw) {
            Ok(history) => {
                log::debug!(
                    "loaded {} conversations from {:?}",
                    history.conversations.len(),
                    self.key
                );
                history
            }
            Err(StoreError::NewerVersion { found }) => {
                log::warn!(
                    "history under {:?} has version {}, keeping this session in memory only",
                    self.key,
                    found
                );
                self.newer_version = Some(found);
                PersistedHistory::default()
            }
            Err(e) => {
                log::warn!("discarding unreadable history under {:?}: {}", self.key, e);
                PersistedHistory::default()
            }
        }
    }

    /// Overwrite the stored history with `history`
    pub fn save(&self, history: &PersistedHistory) -> Result<(), StoreError> {
        if let Some(found) = self.newer_version {
            return Err(StoreError::Protected {
                key: self.key.clone(),
                found,
            });
        }
        let json = serde_json::to_string(history)?;
        self.backend.write(&self.key, &json)?;
        log::debug!(
            "saved {} conversations to {:?}",
            history.conversations.len(),
            self.key
        );
        Ok(())
    }

    /// Release the backend
    pub fn close(self) -> B {
        self.backend
    }
}
