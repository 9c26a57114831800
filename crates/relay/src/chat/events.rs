//! Event types and wire serialization
//!
//! Defines all inbound and outbound named events with type-safe serde
//! serialization. Event names are kebab-case on the wire, payload fields
//! camelCase, matching the browser clients exactly.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::connection::ConnectionId;
use super::directory::CustomerIdentity;
use super::session::{ChatId, ChatSession, Message, Subject};
use super::stats::Stats;

// =============================================================================
// Inbound Events
// =============================================================================

/// Events sent by connected clients. The sender's role is resolved from
/// the connection directory, never trusted from the event itself.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open a new support chat
    JoinAsCustomer {
        name: String,
        username: String,
        subject: Subject,
    },

    /// Join the agent pool
    JoinAsAgent { name: String },

    /// Message from a customer to their own chat
    CustomerMessage { message: String },

    /// Message from an agent to a specific chat
    AgentMessage { chat_id: ChatId, message: String },

    /// Agent opens a chat; claims it if still unassigned
    SelectChat { chat_id: ChatId },

    /// Typing indicator on. Customers omit the chat id (their chat is
    /// known); agents must name the chat they are typing into.
    TypingStart {
        #[serde(default)]
        chat_id: Option<ChatId>,
    },

    /// Typing indicator off
    TypingStop {
        #[serde(default)]
        chat_id: Option<ChatId>,
    },

    /// Announce a handoff to another agent
    TransferChat { chat_id: ChatId, agent_name: String },

    /// Terminate a chat session
    EndChat { chat_id: ChatId },
}

// =============================================================================
// Outbound Events
// =============================================================================

/// Events emitted by the relay
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Session created; sent to the opening customer
    ChatStarted { chat_id: ChatId, message: Message },

    /// New waiting chat; sent to the agent group
    NewChat {
        chat_id: ChatId,
        customer: CustomerIdentity,
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
    },

    /// Dashboard snapshot for a newly joined agent
    InitialData { chats: Vec<ChatSession>, stats: Stats },

    /// Message appended to a chat
    NewMessage { chat_id: ChatId, message: Message },

    /// Acknowledgment echoed to the sending customer
    MessageSent { message: Message },

    /// Full log and customer profile for a selecting agent
    ChatHistory {
        chat_id: ChatId,
        messages: Vec<Message>,
        customer: CustomerIdentity,
    },

    /// Counter update after a state-changing transition
    StatsUpdate { stats: Stats },

    /// Customer started typing; sent to the agent group
    UserTyping { chat_id: ChatId, user_name: String },

    /// Customer stopped typing
    UserTypingStop { chat_id: ChatId },

    /// Agent started typing; sent to the chat room
    AgentTyping { chat_id: ChatId, agent_name: String },

    /// Agent stopped typing
    AgentTypingStop { chat_id: ChatId },

    /// Handoff announcement; sent to the agent group
    ChatTransferred { chat_id: ChatId, message: Message },

    /// Session terminated. The chat room gets the terminal message; the
    /// agent group gets the bare chat id.
    ChatEnded {
        chat_id: ChatId,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<Message>,
    },

    /// Customer's connection dropped while their chat was open
    CustomerDisconnected { chat_id: ChatId },

    /// An agent left the pool
    AgentDisconnected { agent_id: ConnectionId },
}
