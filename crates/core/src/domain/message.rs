use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ServerProduct;
use crate::domain::quote::Quote;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Agent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    LeadCapture,
    Recommendation,
    Quote,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageAttachment {
    Products(Vec<ServerProduct>),
    Quote(Box<Quote>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<MessageAttachment>,
}

/// Append-only message log for one conversation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>, at: DateTime<Utc>) -> &ChatMessage {
        self.push(Sender::User, content.into(), MessageKind::Text, None, at)
    }

    pub fn push_agent(
        &mut self,
        content: impl Into<String>,
        kind: MessageKind,
        attachment: Option<MessageAttachment>,
        at: DateTime<Utc>,
    ) -> &ChatMessage {
        self.push(Sender::Agent, content.into(), kind, attachment, at)
    }

    fn push(
        &mut self,
        sender: Sender,
        content: String,
        kind: MessageKind,
        attachment: Option<MessageAttachment>,
        at: DateTime<Utc>,
    ) -> &ChatMessage {
        let id = MessageId(format!("msg-{:04}", self.messages.len() + 1));
        self.messages.push(ChatMessage { id, content, sender, timestamp: at, kind, attachment });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages appended after the first `offset` entries.
    pub fn since(&self, offset: usize) -> &[ChatMessage] {
        &self.messages[offset.min(self.messages.len())..]
    }
}
