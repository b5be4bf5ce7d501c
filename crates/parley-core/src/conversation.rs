//! Conversation model handed to the assistant by the persistence layer
//!
//! The store owns ids and ordering; the assistant only reads a conversation.
//! Roles the assistant does not recognise deserialize to `Unknown` so that a
//! newer store schema never breaks reply generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversationMessage {
    #[serde(default = "new_id")]
    pub id: String,
    pub role: ConversationRole,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: ConversationRole, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Conversation {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_id(new_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            messages: Vec::new(),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.push(ConversationMessage::new(ConversationRole::User, content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &ConversationMessage {
        self.push(ConversationMessage::new(ConversationRole::Assistant, content))
    }

    /// Appends a message. Messages are never reordered.
    pub fn push(&mut self, message: ConversationMessage) -> &ConversationMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn user_messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| m.role == ConversationRole::User)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}
