//! Connection directory
//!
//! Maps a live connection identity to the role-specific record it
//! represents. A connection is never both a customer and an agent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::connection::ConnectionId;
use super::session::{ChatId, Subject};

/// A connected customer and the chat they own
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerIdentity {
    pub connection_id: ConnectionId,
    pub name: String,
    pub username: String,
    pub subject: Subject,
    pub chat_id: ChatId,
}

/// Agent availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Online,
}

/// A connected support agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdentity {
    pub connection_id: ConnectionId,
    pub name: String,
    pub status: AgentStatus,
}

impl AgentIdentity {
    pub fn new(connection_id: ConnectionId, name: String) -> Self {
        Self {
            connection_id,
            name,
            status: AgentStatus::Online,
        }
    }
}

/// Role resolved for a connection
#[derive(Debug, Clone)]
pub enum Role {
    Customer(CustomerIdentity),
    Agent(AgentIdentity),
}

#[derive(Default)]
struct Tables {
    customers: HashMap<ConnectionId, CustomerIdentity>,
    agents: HashMap<ConnectionId, AgentIdentity>,
}

/// Directory of all live connections, keyed by connection identity.
///
/// A single lock covers both tables; every routing path does one lookup
/// here before touching session state.
#[derive(Default)]
pub struct ConnectionDirectory {
    tables: RwLock<Tables>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a customer identity. Last write wins on duplicate registration.
    pub async fn register_customer(&self, customer: CustomerIdentity) {
        let mut tables = self.tables.write().await;
        tables.customers.insert(customer.connection_id, customer);
    }

    /// Store an agent identity. Last write wins on duplicate registration.
    pub async fn register_agent(&self, agent: AgentIdentity) {
        let mut tables = self.tables.write().await;
        tables.agents.insert(agent.connection_id, agent);
    }

    /// Resolve the role behind a connection, if any
    pub async fn lookup(&self, connection_id: ConnectionId) -> Option<Role> {
        let tables = self.tables.read().await;
        if let Some(customer) = tables.customers.get(&connection_id) {
            return Some(Role::Customer(customer.clone()));
        }
        tables.agents.get(&connection_id).cloned().map(Role::Agent)
    }

    /// Resolve a connection as a customer
    pub async fn customer(&self, connection_id: ConnectionId) -> Option<CustomerIdentity> {
        let tables = self.tables.read().await;
        tables.customers.get(&connection_id).cloned()
    }

    /// Resolve a connection as an agent
    pub async fn agent(&self, connection_id: ConnectionId) -> Option<AgentIdentity> {
        let tables = self.tables.read().await;
        tables.agents.get(&connection_id).cloned()
    }

    /// Remove a connection's identity, returning the role that was removed
    /// so the caller can apply session-state side effects.
    pub async fn remove(&self, connection_id: ConnectionId) -> Option<Role> {
        let mut tables = self.tables.write().await;
        if let Some(customer) = tables.customers.remove(&connection_id) {
            return Some(Role::Customer(customer));
        }
        tables.agents.remove(&connection_id).map(Role::Agent)
    }
}
