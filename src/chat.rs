//! In-memory conversation history for persona chats

use crate::prompts::Persona;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Ai,
    Human,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::Ai => "AI",
            ChatRole::Human => "Human",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Progress of a streamed chat reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// Next piece of the reply text
    Delta { text: String },
    /// Final reply, as stored in the history
    Done { reply: String },
}

/// Linear history, seeded with the persona's welcome message
#[derive(Debug, Clone, Serialize)]
pub struct ChatHistory {
    pub persona: Persona,
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new(persona: Persona) -> Self {
        Self {
            persona,
            messages: vec![ChatMessage::new(ChatRole::Ai, persona.prompt().welcome)],
        }
    }

    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_starts_with_welcome() {
        let history = ChatHistory::new(Persona::Customer);
        assert_eq!(history.messages().len(), 1);
        assert_eq!(history.messages()[0].role, ChatRole::Ai);
        assert!(history.messages()[0].content.contains("shipment ID"));
    }

    #[test]
    fn test_push_appends_in_order() {
        let mut history = ChatHistory::new(Persona::Driver);
        history.push(ChatRole::Human, "Accident on I-87");
        history.push(ChatRole::Ai, "Which route will you take?");
        let roles: Vec<ChatRole> = history.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [ChatRole::Ai, ChatRole::Human, ChatRole::Ai]);
    }
}
