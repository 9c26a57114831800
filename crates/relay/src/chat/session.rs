//! Chat session model
//!
//! A `ChatSession` is the full lifecycle record of one customer's support
//! interaction: its ordered message log, status, and the agent bound to it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::directory::{AgentIdentity, CustomerIdentity};

/// Chat session ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub Uuid);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Message ID: a process-wide monotonic sequence, so ids double as a
/// display ordering for the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Customer,
    Agent,
    System,
}

/// Topic the customer picked when opening the chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Api,
    Technical,
    Billing,
    General,
    Other,
}

impl Subject {
    /// Localized subject phrase used in the welcome message
    pub fn localized(&self) -> &'static str {
        match self {
            Subject::Api => "pertanyaan API",
            Subject::Technical => "masalah teknis",
            Subject::Billing => "billing & pembayaran",
            Subject::General => "pertanyaan umum",
            Subject::Other => "pertanyaan Anda",
        }
    }
}

/// Session lifecycle status
///
/// `waiting → active → ended`; `customer_disconnected` is reachable from
/// `waiting` or `active` and is non-terminal (the session stays listed
/// until explicitly ended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Waiting,
    Active,
    Ended,
    CustomerDisconnected,
}

/// A single chat message, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub sender_name: String,
}

/// One customer's support chat: message log plus agent binding
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: ChatId,
    pub customer: CustomerIdentity,
    pub agent: Option<AgentIdentity>,
    pub messages: Vec<Message>,
    pub status: ChatStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ChatSession {
    /// Create a new waiting session for a customer
    pub fn new(customer: CustomerIdentity) -> Self {
        Self {
            id: customer.chat_id,
            customer,
            agent: None,
            messages: Vec::new(),
            status: ChatStatus::Waiting,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Append a message to the ordered log
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// First-claim-wins agent binding: succeeds only while unassigned,
    /// transitioning `waiting → active`.
    pub fn try_assign(&mut self, agent: AgentIdentity) -> bool {
        if self.agent.is_some() {
            return false;
        }
        self.agent = Some(agent);
        self.status = ChatStatus::Active;
        true
    }
}

/// Welcome message text, localized by subject
pub fn welcome_text(name: &str, username: &str, subject: Subject) -> String {
    format!(
        "Halo {name}! Selamat datang di SXTream Support. Username Anda: @{username}. \
         Saya siap membantu Anda dengan {}. Ada yang bisa saya bantu hari ini?",
        subject.localized()
    )
}

/// Terminal system message appended when a chat ends
pub const END_MESSAGE_TEXT: &str =
    "Chat session telah berakhir. Terima kasih telah menggunakan layanan kami.";

/// System message appended when a chat is handed to another agent
pub fn transfer_text(agent_name: &str) -> String {
    format!("Chat telah ditransfer ke {agent_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::connection::ConnectionId;

    fn customer(chat_id: ChatId) -> CustomerIdentity {
        CustomerIdentity {
            connection_id: ConnectionId::new(),
            name: "Ana".to_string(),
            username: "ana1".to_string(),
            subject: Subject::Billing,
            chat_id,
        }
    }

    #[test]
    fn test_welcome_text_mentions_subject() {
        let text = welcome_text("Ana", "ana1", Subject::Billing);
        assert!(text.contains("Halo Ana!"));
        assert!(text.contains("@ana1"));
        assert!(text.contains("billing & pembayaran"));

        assert!(welcome_text("B", "b", Subject::Api).contains("pertanyaan API"));
        assert!(welcome_text("B", "b", Subject::Other).contains("pertanyaan Anda"));
    }

    #[test]
    fn test_try_assign_first_claim_wins() {
        let chat_id = ChatId::new();
        let mut session = ChatSession::new(customer(chat_id));
        assert_eq!(session.status, ChatStatus::Waiting);

        let first = AgentIdentity::new(ConnectionId::new(), "Budi".to_string());
        let second = AgentIdentity::new(ConnectionId::new(), "Citra".to_string());

        assert!(session.try_assign(first));
        assert_eq!(session.status, ChatStatus::Active);

        assert!(!session.try_assign(second));
        assert_eq!(
            session.agent.as_ref().map(|a| a.name.as_str()),
            Some("Budi")
        );
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&ChatStatus::CustomerDisconnected).unwrap(),
            r#""customer_disconnected""#
        );
        assert_eq!(serde_json::to_string(&ChatStatus::Waiting).unwrap(), r#""waiting""#);
        assert_eq!(serde_json::to_string(&MessageKind::Customer).unwrap(), r#""customer""#);
    }
}
