//! Conversation-related types.

use serde::{Deserialize, Serialize};

/// The message a new conversation opens with.
pub const GREETING: &str =
    "Hi! I'm your Course Advisor. I'll help you choose courses.";

/// The bot message appended when an exchange fails.
pub const FALLBACK_REPLY: &str =
    "Sorry, there was an error processing your request.";

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the advisor.
    User,
    /// The advisor.
    Bot,
}

/// A message in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Position of the message, starting from 1.
    pub id: u64,
    /// Who wrote the message.
    pub role: Role,
    /// The message text.
    pub text: String,
}

/// An append-only log of messages.
#[derive(Clone, Debug)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Default for Conversation {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Creates a conversation containing the greeting.
    pub fn new() -> Self {
        let mut conversation = Self { messages: vec![] };
        conversation.append(Role::Bot, GREETING);
        conversation
    }

    /// Appends a message and returns it.
    pub fn append<S: Into<String>>(
        &mut self,
        role: Role,
        text: S,
    ) -> &ConversationMessage {
        let id = self.messages.len() as u64 + 1;
        self.messages.push(ConversationMessage {
            id,
            role,
            text: text.into(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Returns all messages in order.
    #[inline]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.messages()[0].text, GREETING);

        let msg = conversation.append(Role::User, "Hi");
        assert_eq!(msg.id, 2);
        let msg = conversation.append(Role::Bot, "Hello");
        assert_eq!(msg.id, 3);

        let roles: Vec<_> =
            conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::Bot, Role::User, Role::Bot]);
    }

    #[test]
    fn test_wire_format() {
        let msg = ConversationMessage {
            id: 1,
            role: Role::Bot,
            text: "hey".to_owned(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"id":1,"role":"bot","text":"hey"}"#
        );
    }
}
