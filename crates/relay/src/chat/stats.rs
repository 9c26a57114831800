//! Live chat statistics
//!
//! Counters are maintained incrementally from session-state transitions,
//! never recomputed by scanning the store.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

/// Aggregate chat counters, broadcast to the agent dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub active_chats: u64,
    pub waiting_chats: u64,
    pub total_chats: u64,
}

/// Owns the process-wide [`Stats`] and mutates it only in response to
/// transitions it is told about.
#[derive(Clone, Default)]
pub struct StatsAggregator {
    stats: Arc<Mutex<Stats>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new waiting session was created
    pub async fn on_chat_created(&self) -> Stats {
        let mut stats = self.stats.lock().await;
        stats.total_chats += 1;
        stats.active_chats += 1;
        stats.waiting_chats += 1;
        *stats
    }

    /// A waiting session was claimed by an agent
    pub async fn on_chat_claimed(&self) -> Stats {
        let mut stats = self.stats.lock().await;
        stats.waiting_chats = stats.waiting_chats.saturating_sub(1);
        *stats
    }

    /// A session ended
    pub async fn on_chat_ended(&self) -> Stats {
        let mut stats = self.stats.lock().await;
        stats.active_chats = stats.active_chats.saturating_sub(1);
        *stats
    }

    /// Current counter snapshot
    pub async fn snapshot(&self) -> Stats {
        *self.stats.lock().await
    }
}
