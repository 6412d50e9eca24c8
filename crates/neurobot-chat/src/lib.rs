//! Conversation state for the Neurobot chat client
//!
//! Everything here is platform-neutral: the browser front end supplies a
//! [`store::KeyValueStorage`] backed by local storage and a
//! [`transport::ChatTransport`] backed by `fetch`.

pub mod app;
pub mod dispatch;
pub mod history;
pub mod session;
pub mod store;
pub mod transport;

pub use app::{ChatApp, ReplyKind};
pub use history::{HistoryError, HistoryManager};
pub use session::Session;
pub use store::{HistoryStore, KeyValueStorage, MemoryStorage, PersistedHistory, StoreError};
pub use transport::{ChatTransport, TransportError};

pub use neurobot_types::{
    ArchivedConversation, ClientConfig, Conversation, ConversationId, Message, Role,
};
