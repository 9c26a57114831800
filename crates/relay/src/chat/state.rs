//! Aggregate chat state
//!
//! One registry holding the connection directory, session store, stats
//! aggregator, and broadcast groups, constructed explicitly at server
//! start and shared across all connections.

use std::sync::Arc;
use std::time::Duration;

use super::directory::ConnectionDirectory;
use super::room::{AgentGroup, RoomManager};
use super::stats::StatsAggregator;
use super::store::SessionStore;

/// Shared state for the chat relay
#[derive(Clone)]
pub struct ChatState {
    /// Connection identity -> role record
    pub directory: Arc<ConnectionDirectory>,

    /// All chat sessions and their message logs
    pub store: SessionStore,

    /// Live aggregate counters
    pub stats: StatsAggregator,

    /// Per-chat broadcast rooms
    pub rooms: Arc<RoomManager>,

    /// Global agent broadcast group
    pub agents: Arc<AgentGroup>,
}

impl ChatState {
    /// Create the relay state. `retention` is how long ended sessions stay
    /// queryable before removal.
    pub fn new(retention: Duration) -> Self {
        Self {
            directory: Arc::new(ConnectionDirectory::new()),
            store: SessionStore::new(retention),
            stats: StatsAggregator::new(),
            rooms: Arc::new(RoomManager::new()),
            agents: Arc::new(AgentGroup::new()),
        }
    }
}
