//! Core types and structures for neurobot
//!
//! This crate provides the data model shared by the chat core and the
//! browser front end.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;

pub use config::{ClientConfig, ConfigError};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the Neurobot backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Local storage key holding the archived conversations
pub const HISTORY_STORAGE_KEY: &str = "neurobot_conversations";

/// Local storage key holding the selected theme
pub const THEME_STORAGE_KEY: &str = "neurobot_theme";

/// File name offered when downloading an exported transcript
pub const EXPORT_FILENAME: &str = "neurobot_conversation.pdf";

/// Assistant reply shown when the chat endpoint fails
pub const CHAT_FALLBACK_REPLY: &str = "Erreur serveur.";

/// Assistant reply shown when the upload endpoint fails
pub const UPLOAD_FALLBACK_REPLY: &str = "Erreur lors de l’analyse du fichier.";

/// Alert shown when the PDF export fails
pub const EXPORT_FAILURE_ALERT: &str = "Erreur à l'export PDF";

/// Speaker label for user messages in transcripts and the chat window
pub const USER_LABEL: &str = "Vous";

/// Speaker label for assistant messages in transcripts and the chat window
pub const ASSISTANT_LABEL: &str = "Neurobot";

// ============================================================================
// Message Types
// ============================================================================

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when rendering or exporting a message
    pub fn speaker_label(&self) -> &'static str {
        match self {
            Role::User => USER_LABEL,
            Role::Assistant => ASSISTANT_LABEL,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message. Fields are read-only once the message exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Format as a `"Speaker : text"` transcript line
    pub fn transcript_line(&self) -> String {
        format!("{} : {}", self.role.speaker_label(), self.content)
    }
}

// ============================================================================
// Conversation Types
// ============================================================================

/// Ordered, append-only sequence of messages.
///
/// Serializes as a plain JSON array of messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Transcript lines in send order, as sent to the PDF export endpoint
    pub fn transcript_lines(&self) -> Vec<String> {
        self.messages.iter().map(Message::transcript_line).collect()
    }

    /// First user message, truncated to `max_chars` characters
    pub fn preview(&self, max_chars: usize) -> Option<String> {
        let first = self.messages.iter().find(|m| m.role() == Role::User)?;
        let content = first.content().trim();
        if content.chars().count() <= max_chars {
            Some(content.to_string())
        } else {
            let truncated: String = content.chars().take(max_chars).collect();
            Some(format!("{}…", truncated))
        }
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Stable identifier of an archived conversation.
///
/// Identifiers come from a persisted monotonic counter and are never reused
/// within one store, so they survive deletions that shift positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub u64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A conversation snapshot stored in the history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedConversation {
    pub id: ConversationId,
    pub messages: Conversation,
}
