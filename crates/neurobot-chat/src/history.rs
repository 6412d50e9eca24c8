//! Archived conversations, kept in sync with the store on every mutation.

use thiserror::Error;

use neurobot_types::{ArchivedConversation, Conversation, ConversationId};

use crate::store::{HistoryStore, KeyValueStorage, PersistedHistory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history index {index} out of range for {len} conversations")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no conversation {0} in history")]
    UnknownConversation(ConversationId),
}

pub struct HistoryManager<B> {
    store: HistoryStore<B>,
    state: PersistedHistory,
}

impl<B: KeyValueStorage> HistoryManager<B> {
    /// Load the history once from `store`
    pub fn open(mut store: HistoryStore<B>) -> Self {
        let state = store.load();
        log::info!("history opened with {} conversations", state.conversations.len());
        Self { store, state }
    }

    pub fn entries(&self) -> &[ArchivedConversation] {
        &self.state.conversations
    }

    pub fn len(&self) -> usize {
        self.state.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.conversations.is_empty()
    }

    /// Current position of the entry with `id`
    pub fn position(&self, id: ConversationId) -> Option<usize> {
        self.state.conversations.iter().position(|c| c.id == id)
    }

    /// Archive a snapshot of `conversation` under a fresh id
    pub fn append(&mut self, conversation: &Conversation) -> ConversationId {
        let id = ConversationId(self.state.next_id);
        self.state.next_id += 1;
        self.state.conversations.push(ArchivedConversation {
            id,
            messages: conversation.clone(),
        });
        self.persist();
        id
    }

    /// Replace the snapshot stored under `id`
    pub fn update(&mut self, id: ConversationId, conversation: &Conversation) -> Result<(), HistoryError> {
        let index = self.position(id).ok_or(HistoryError::UnknownConversation(id))?;
        self.state.conversations[index].messages = conversation.clone();
        self.persist();
        Ok(())
    }

    /// Copy of the entry at `index`
    pub fn load_at(&self, index: usize) -> Result<(ConversationId, Conversation), HistoryError> {
        let entry = self.entry_at(index)?;
        Ok((entry.id, entry.messages.clone()))
    }

    /// Copy of the entry with `id`
    pub fn get(&self, id: ConversationId) -> Result<Conversation, HistoryError> {
        self.state
            .conversations
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.messages.clone())
            .ok_or(HistoryError::UnknownConversation(id))
    }

    /// Remove the entry at `index`; later entries move down by one
    pub fn delete_at(&mut self, index: usize) -> Result<ArchivedConversation, HistoryError> {
        self.entry_at(index)?;
        let removed = self.state.conversations.remove(index);
        self.persist();
        Ok(removed)
    }

    pub fn delete(&mut self, id: ConversationId) -> Result<ArchivedConversation, HistoryError> {
        let index = self.position(id).ok_or(HistoryError::UnknownConversation(id))?;
        self.delete_at(index)
    }

    /// Flush and hand the store back
    pub fn close(self) -> HistoryStore<B> {
        self.persist();
        self.store
    }

    fn entry_at(&self, index: usize) -> Result<&ArchivedConversation, HistoryError> {
        self.state
            .conversations
            .get(index)
            .ok_or(HistoryError::IndexOutOfRange {
                index,
                len: self.state.conversations.len(),
            })
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            log::warn!("failed to persist history: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use neurobot_types::Message;

    const KEY: &str = "history";

    fn open(storage: &MemoryStorage) -> HistoryManager<MemoryStorage> {
        HistoryManager::open(HistoryStore::open(storage.clone(), KEY))
    }

    fn conversation(text: &str) -> Conversation {
        Conversation::from(vec![Message::user(text)])
    }

    #[test]
    fn test_append_persists_snapshot() {
        let storage = MemoryStorage::new();
        let mut history = open(&storage);
        let mut live = conversation("Hello");

        let id = history.append(&live);
        live.push(Message::assistant("Hi!"));

        assert_eq!(history.get(id).unwrap().len(), 1);
        let reopened = open(&storage);
        assert_eq!(reopened.entries()[0].messages, conversation("Hello"));
    }

    #[test]
    fn test_update_replaces_in_place() {
        let storage = MemoryStorage::new();
        let mut history = open(&storage);
        let id = history.append(&conversation("Hello"));

        let mut longer = conversation("Hello");
        longer.push(Message::assistant("Hi!"));
        history.update(id, &longer).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(open(&storage).get(id).unwrap(), longer);
        assert_eq!(
            history.update(ConversationId(99), &longer),
            Err(HistoryError::UnknownConversation(ConversationId(99)))
        );
    }

    #[test]
    fn test_load_at_is_bounds_checked() {
        let mut history = open(&MemoryStorage::new());
        history.append(&conversation("a"));
        history.append(&conversation("b"));

        assert_eq!(history.load_at(1).unwrap().1, conversation("b"));
        assert_eq!(
            history.load_at(2),
            Err(HistoryError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_delete_at_shifts_following_entries() {
        let storage = MemoryStorage::new();
        let mut history = open(&storage);
        let a = history.append(&conversation("a"));
        let b = history.append(&conversation("b"));
        let c = history.append(&conversation("c"));

        let removed = history.delete_at(1).unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(history.position(a), Some(0));
        assert_eq!(history.position(c), Some(1));
        assert_eq!(open(&storage).len(), 2);

        assert!(matches!(
            history.delete_at(2),
            Err(HistoryError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_legacy_history_is_rewritten_with_stable_ids() {
        let legacy = r#"[[{"role":"user","content":"a"}],[{"role":"user","content":"b"}]]"#;
        let storage = MemoryStorage::with_value(KEY, legacy);
        let mut history = open(&storage);

        let id = history.append(&conversation("c"));

        assert_eq!(id, ConversationId(3));
        let raw = storage.raw(KEY).unwrap();
        assert!(raw.contains("\"version\":2"), "stored: {}", raw);
        let stored = PersistedHistory::parse(&raw).unwrap();
        let ids: Vec<_> = stored.conversations.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(stored.conversations[1].messages, conversation("b"));
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let storage = MemoryStorage::new();
        let mut history = open(&storage);
        let first = history.append(&conversation("a"));
        history.delete(first).unwrap();

        let mut reopened = open(&storage);
        let second = reopened.append(&conversation("b"));
        assert!(second > first);
        assert!(reopened.get(first).is_err());
    }
}
