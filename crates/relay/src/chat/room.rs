//! Broadcast groups
//!
//! Two delivery scopes exist: the per-chat room (the customer plus any
//! agent viewing that chat) and the global agent group. Sending to a
//! group iterates the live members and delivers individually, tolerating
//! members that disconnect mid-iteration.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::connection::{Connection, ConnectionId};
use super::events::ServerEvent;
use super::session::ChatId;

/// Manages per-chat rooms for broadcasting events
#[derive(Default)]
pub struct RoomManager {
    /// Map of chat_id -> list of member connections
    rooms: RwLock<HashMap<ChatId, Vec<Arc<Connection>>>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a chat room
    pub async fn join(&self, chat_id: ChatId, conn: Arc<Connection>) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(chat_id).or_default().push(Arc::clone(&conn));

        let count = rooms.get(&chat_id).map(|v| v.len()).unwrap_or(0);
        tracing::debug!(
            chat_id = %chat_id,
            connection_id = %conn.connection_id,
            room_size = count,
            "Connection joined chat room"
        );
    }

    /// Broadcast an event to all members of a chat room
    ///
    /// Silently ignores send errors (closed connections will be cleaned up)
    pub async fn broadcast(&self, chat_id: &ChatId, event: ServerEvent) {
        let rooms = self.rooms.read().await;
        if let Some(members) = rooms.get(chat_id) {
            for conn in members {
                if conn.send(event.clone()).is_err() {
                    tracing::warn!(
                        connection_id = %conn.connection_id,
                        chat_id = %chat_id,
                        "Failed to send event to room member (likely closed)"
                    );
                }
            }
        }
    }

    /// Remove a connection from all rooms
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        for members in rooms.values_mut() {
            members.retain(|c| c.connection_id != connection_id);
        }
        rooms.retain(|_, members| !members.is_empty());
    }

    /// Number of members in a chat room
    pub async fn room_size(&self, chat_id: &ChatId) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(chat_id).map(|v| v.len()).unwrap_or(0)
    }
}

/// The broadcast scope containing every currently connected support agent
#[derive(Default)]
pub struct AgentGroup {
    members: RwLock<Vec<Arc<Connection>>>,
}

impl AgentGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent connection to the group
    pub async fn join(&self, conn: Arc<Connection>) {
        let mut members = self.members.write().await;
        members.push(conn);
        tracing::debug!(group_size = members.len(), "Connection joined agent group");
    }

    /// Remove an agent connection from the group
    pub async fn remove(&self, connection_id: ConnectionId) {
        let mut members = self.members.write().await;
        members.retain(|c| c.connection_id != connection_id);
    }

    /// Broadcast an event to every connected agent
    pub async fn broadcast(&self, event: ServerEvent) {
        let members = self.members.read().await;
        for conn in members.iter() {
            if conn.send(event.clone()).is_err() {
                tracing::warn!(
                    connection_id = %conn.connection_id,
                    "Failed to send event to agent (likely closed)"
                );
            }
        }
    }

    /// Broadcast to every agent except the originating connection
    pub async fn broadcast_except(&self, sender: ConnectionId, event: ServerEvent) {
        let members = self.members.read().await;
        for conn in members.iter().filter(|c| c.connection_id != sender) {
            if conn.send(event.clone()).is_err() {
                tracing::warn!(
                    connection_id = %conn.connection_id,
                    "Failed to send event to agent (likely closed)"
                );
            }
        }
    }

    /// Number of connected agents
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}
