use neurobot_types::{Conversation, ConversationId, Message};

/// The conversation currently being composed.
///
/// A session remembers which history entry it is archived as, so that later
/// messages update that entry instead of archiving the conversation again.
#[derive(Debug, Clone, Default)]
pub struct Session {
    conversation: Conversation,
    archived_as: Option<ConversationId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to an empty, unarchived conversation
    pub fn start(&mut self) {
        self.conversation = Conversation::new();
        self.archived_as = None;
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.conversation.push(Message::user(text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.conversation.push(Message::assistant(text));
    }

    /// Overwrite the session with a copy of a history entry
    pub fn replace(&mut self, id: ConversationId, conversation: &Conversation) {
        self.conversation = conversation.clone();
        self.archived_as = Some(id);
    }

    pub fn bind(&mut self, id: ConversationId) {
        self.archived_as = Some(id);
    }

    pub fn archived_as(&self) -> Option<ConversationId> {
        self.archived_as
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurobot_types::Role;

    #[test]
    fn test_appends_keep_send_order() {
        let mut session = Session::new();
        session.append_user("Hello");
        session.append_assistant("Hi!");
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn test_replace_copies_snapshot() {
        let snapshot = Conversation::from(vec![Message::user("Hello")]);
        let mut session = Session::new();
        session.replace(ConversationId(3), &snapshot);
        session.append_assistant("Hi!");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.archived_as(), Some(ConversationId(3)));
    }

    #[test]
    fn test_start_unbinds() {
        let mut session = Session::new();
        session.append_user("Hello");
        session.bind(ConversationId(1));
        session.start();
        assert!(session.is_empty());
        assert_eq!(session.archived_as(), None);
    }
}
