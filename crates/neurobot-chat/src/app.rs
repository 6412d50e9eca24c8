//! View state behind the chat window: the active session plus the history.

use neurobot_types::{
    ArchivedConversation, Conversation, ConversationId, Message, CHAT_FALLBACK_REPLY,
    UPLOAD_FALLBACK_REPLY,
};

use crate::history::{HistoryError, HistoryManager};
use crate::session::Session;
use crate::store::{HistoryStore, KeyValueStorage};
use crate::transport::TransportError;

/// Which request an assistant reply answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Chat,
    Upload,
}

impl ReplyKind {
    /// Assistant message shown in place of a failed reply
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            ReplyKind::Chat => CHAT_FALLBACK_REPLY,
            ReplyKind::Upload => UPLOAD_FALLBACK_REPLY,
        }
    }
}

pub struct ChatApp<B> {
    session: Session,
    history: HistoryManager<B>,
}

impl<B: KeyValueStorage> ChatApp<B> {
    pub fn new(history: HistoryManager<B>) -> Self {
        Self {
            session: Session::new(),
            history,
        }
    }

    /// Open the history stored under `key` in `backend`
    pub fn open(backend: B, key: &str) -> Self {
        Self::new(HistoryManager::open(HistoryStore::open(backend, key)))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn messages(&self) -> &[Message] {
        self.session.messages()
    }

    pub fn history(&self) -> &[ArchivedConversation] {
        self.history.entries()
    }

    /// Position of the active conversation in the history, if archived
    pub fn active_index(&self) -> Option<usize> {
        self.session
            .archived_as()
            .and_then(|id| self.history.position(id))
    }

    /// Validate and record outgoing user text.
    ///
    /// Returns the text to send, or `None` when it is empty or whitespace
    /// only, in which case nothing is recorded.
    pub fn begin_send(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        self.session.append_user(text);
        self.sync_history();
        Some(text.to_string())
    }

    /// Record the outcome of a chat or upload request as one assistant message
    pub fn receive_reply(&mut self, kind: ReplyKind, outcome: Result<String, TransportError>) {
        let content = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("{:?} request failed: {}", kind, e);
                kind.fallback_reply().to_string()
            }
        };
        self.session.append_assistant(content);
        self.sync_history();
    }

    pub fn new_conversation(&mut self) {
        self.session.start();
    }

    pub fn load_conversation_at(&mut self, index: usize) -> Result<(), HistoryError> {
        let (id, conversation) = self.history.load_at(index)?;
        self.session.replace(id, &conversation);
        Ok(())
    }

    pub fn load_conversation(&mut self, id: ConversationId) -> Result<(), HistoryError> {
        let conversation = self.history.get(id)?;
        self.session.replace(id, &conversation);
        Ok(())
    }

    /// Delete a history entry and reset the active session
    pub fn delete_conversation_at(&mut self, index: usize) -> Result<ArchivedConversation, HistoryError> {
        let removed = self.history.delete_at(index)?;
        self.session.start();
        Ok(removed)
    }

    pub fn delete_conversation(&mut self, id: ConversationId) -> Result<ArchivedConversation, HistoryError> {
        let removed = self.history.delete(id)?;
        self.session.start();
        Ok(removed)
    }

    /// `"Speaker : text"` lines of the active conversation
    pub fn transcript_lines(&self) -> Vec<String> {
        self.session.conversation().transcript_lines()
    }

    pub fn close(self) -> HistoryStore<B> {
        self.history.close()
    }

    /// Write the active conversation to its history entry, archiving it on
    /// the first message.
    fn sync_history(&mut self) {
        if self.session.is_empty() {
            return;
        }
        let snapshot: &Conversation = self.session.conversation();
        match self.session.archived_as() {
            Some(id) => {
                if self.history.update(id, snapshot).is_err() {
                    // Entry was deleted behind our back; archive it again.
                    let id = self.history.append(snapshot);
                    self.session.bind(id);
                }
            }
            None => {
                let id = self.history.append(snapshot);
                self.session.bind(id);
            }
        }
    }
}
