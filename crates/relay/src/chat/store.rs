//! Session store
//!
//! Owns every chat session and its message log. Each session sits behind
//! its own lock, so operations on the same chat serialize while different
//! chats proceed in parallel; the outer map lock is held only for lookups
//! and insert/remove.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::directory::{AgentIdentity, CustomerIdentity};
use super::session::{
    transfer_text, ChatId, ChatSession, ChatStatus, Message, MessageId, MessageKind,
    END_MESSAGE_TEXT,
};

const SYSTEM_SENDER: &str = "System";

/// One session and, once ended, the task scheduled to remove it
struct Slot {
    session: Mutex<ChatSession>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

type ChatMap = HashMap<ChatId, Arc<Slot>>;

/// All chat sessions, waiting through ended
///
/// Ended sessions are retained for a grace period before removal so
/// trailing reads don't race against deletion.
#[derive(Clone)]
pub struct SessionStore {
    chats: Arc<RwLock<ChatMap>>,
    message_seq: Arc<AtomicU64>,
    retention: Duration,
}

impl SessionStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            chats: Arc::new(RwLock::new(HashMap::new())),
            message_seq: Arc::new(AtomicU64::new(0)),
            retention,
        }
    }

    fn make_message(&self, kind: MessageKind, text: String, sender_name: String) -> Message {
        Message {
            id: MessageId(self.message_seq.fetch_add(1, Ordering::Relaxed) + 1),
            kind,
            text,
            timestamp: OffsetDateTime::now_utc(),
            sender_name,
        }
    }

    async fn slot(&self, chat_id: ChatId) -> Option<Arc<Slot>> {
        let chats = self.chats.read().await;
        chats.get(&chat_id).cloned()
    }

    /// Create a waiting session for a customer, appending the localized
    /// welcome message. Returns the welcome message for the `chat-started`
    /// acknowledgment.
    pub async fn create(&self, customer: CustomerIdentity) -> Message {
        let chat_id = customer.chat_id;
        let welcome = self.make_message(
            MessageKind::System,
            super::session::welcome_text(&customer.name, &customer.username, customer.subject),
            SYSTEM_SENDER.to_string(),
        );

        let mut session = ChatSession::new(customer);
        session.push(welcome.clone());

        let slot = Arc::new(Slot {
            session: Mutex::new(session),
            reaper: Mutex::new(None),
        });

        let mut chats = self.chats.write().await;
        chats.insert(chat_id, slot);
        tracing::info!(chat_id = %chat_id, total_chats = chats.len(), "Chat session created");

        welcome
    }

    /// Clone the current state of one session
    pub async fn snapshot(&self, chat_id: ChatId) -> Option<ChatSession> {
        let slot = self.slot(chat_id).await?;
        let session = slot.session.lock().await;
        Some(session.clone())
    }

    /// Clone every session, oldest first (the agent dashboard view)
    pub async fn snapshot_all(&self) -> Vec<ChatSession> {
        let slots: Vec<Arc<Slot>> = {
            let chats = self.chats.read().await;
            chats.values().cloned().collect()
        };

        let mut sessions = Vec::with_capacity(slots.len());
        for slot in slots {
            sessions.push(slot.session.lock().await.clone());
        }
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    /// Append a message to a session's log. Unknown chat ids are a silent
    /// no-op: a disconnected or ended chat simply drops messages addressed
    /// to it.
    pub async fn append_message(
        &self,
        chat_id: ChatId,
        kind: MessageKind,
        text: String,
        sender_name: String,
    ) -> Option<Message> {
        let slot = self.slot(chat_id).await?;
        let mut session = slot.session.lock().await;
        // Allocate the id under the session lock so id order matches
        // insertion order within a log.
        let message = self.make_message(kind, text, sender_name);
        session.push(message.clone());
        Some(message)
    }

    /// First-claim-wins assignment. Binds the agent and transitions
    /// `waiting → active` only if the chat is still unassigned; returns
    /// whether this call performed the assignment.
    pub async fn assign_agent(&self, chat_id: ChatId, agent: AgentIdentity) -> bool {
        let Some(slot) = self.slot(chat_id).await else {
            return false;
        };
        let mut session = slot.session.lock().await;
        let claimed = session.try_assign(agent);
        if claimed {
            tracing::info!(
                chat_id = %chat_id,
                agent = %session.agent.as_ref().map(|a| a.name.as_str()).unwrap_or_default(),
                "Chat claimed"
            );
        }
        claimed
    }

    /// Append the transfer notification. The agent binding itself is not
    /// changed: the handoff is announced only, and acknowledged out-of-band.
    pub async fn transfer(&self, chat_id: ChatId, new_agent_name: &str) -> Option<Message> {
        let slot = self.slot(chat_id).await?;
        let mut session = slot.session.lock().await;
        let message = self.make_message(
            MessageKind::System,
            transfer_text(new_agent_name),
            SYSTEM_SENDER.to_string(),
        );
        session.push(message.clone());
        Some(message)
    }

    /// End a session: append the terminal message, set `ended`, and
    /// schedule removal after the retention window. Idempotent — repeat
    /// calls and unknown chat ids return `None`.
    pub async fn end(&self, chat_id: ChatId) -> Option<Message> {
        let slot = self.slot(chat_id).await?;

        let message = {
            let mut session = slot.session.lock().await;
            if session.status == ChatStatus::Ended {
                return None;
            }
            let message = self.make_message(
                MessageKind::System,
                END_MESSAGE_TEXT.to_string(),
                SYSTEM_SENDER.to_string(),
            );
            session.push(message.clone());
            session.status = ChatStatus::Ended;
            message
        };

        let chats = Arc::clone(&self.chats);
        let retention = self.retention;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            let mut chats = chats.write().await;
            // The session may already be gone; removing only an
            // ended session keeps this a safe no-op either way.
            let still_ended = match chats.get(&chat_id) {
                Some(slot) => slot.session.lock().await.status == ChatStatus::Ended,
                None => false,
            };
            if still_ended {
                chats.remove(&chat_id);
                tracing::debug!(chat_id = %chat_id, "Ended chat removed after retention window");
            }
        });
        *slot.reaper.lock().await = Some(handle);

        tracing::info!(chat_id = %chat_id, "Chat session ended");
        Some(message)
    }

    /// Mark the owning chat of a dropped customer. The session stays
    /// listed; agents may still append messages, which become
    /// undeliverable no-ops.
    pub async fn mark_customer_disconnected(&self, chat_id: ChatId) -> bool {
        let Some(slot) = self.slot(chat_id).await else {
            return false;
        };
        let mut session = slot.session.lock().await;
        if session.status == ChatStatus::Ended {
            return false;
        }
        session.status = ChatStatus::CustomerDisconnected;
        true
    }

    /// Full message log plus the customer profile, for a selecting agent
    pub async fn history(&self, chat_id: ChatId) -> Option<(Vec<Message>, CustomerIdentity)> {
        let slot = self.slot(chat_id).await?;
        let session = slot.session.lock().await;
        Some((session.messages.clone(), session.customer.clone()))
    }

    /// Number of sessions currently held (all statuses)
    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }

    /// Abort all pending removal tasks. Called on process shutdown so no
    /// reaper outlives the state it references.
    pub async fn shutdown(&self) {
        let slots: Vec<Arc<Slot>> = {
            let chats = self.chats.read().await;
            chats.values().cloned().collect()
        };
        for slot in slots {
            if let Some(handle) = slot.reaper.lock().await.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::connection::ConnectionId;
    use crate::chat::session::Subject;

    const RETENTION: Duration = Duration::from_secs(30);

    fn customer(chat_id: ChatId) -> CustomerIdentity {
        CustomerIdentity {
            connection_id: ConnectionId::new(),
            name: "Ana".to_string(),
            username: "ana1".to_string(),
            subject: Subject::Billing,
            chat_id,
        }
    }

    fn agent(name: &str) -> AgentIdentity {
        AgentIdentity::new(ConnectionId::new(), name.to_string())
    }

    #[tokio::test]
    async fn test_create_appends_localized_welcome() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();

        let welcome = store.create(customer(chat_id)).await;
        assert_eq!(welcome.kind, MessageKind::System);
        assert!(welcome.text.contains("billing & pembayaran"));

        let session = store.snapshot(chat_id).await.unwrap();
        assert_eq!(session.status, ChatStatus::Waiting);
        assert_eq!(session.messages.len(), 1);
        assert!(session.agent.is_none());
    }

    #[tokio::test]
    async fn test_append_to_unknown_chat_is_noop() {
        let store = SessionStore::new(RETENTION);
        let appended = store
            .append_message(
                ChatId::new(),
                MessageKind::Agent,
                "hello".to_string(),
                "Budi".to_string(),
            )
            .await;
        assert!(appended.is_none());
    }

    #[tokio::test]
    async fn test_log_is_append_only_and_ordered() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;

        for i in 0..10 {
            store
                .append_message(
                    chat_id,
                    MessageKind::Customer,
                    format!("msg {i}"),
                    "Ana".to_string(),
                )
                .await
                .unwrap();
        }

        let session = store.snapshot(chat_id).await.unwrap();
        assert_eq!(session.messages.len(), 11);
        for pair in session.messages.windows(2) {
            assert!(pair[0].id < pair[1].id, "message ids must be monotonic");
        }
    }

    #[tokio::test]
    async fn test_assign_agent_second_claim_loses() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;

        assert!(store.assign_agent(chat_id, agent("Budi")).await);
        assert!(!store.assign_agent(chat_id, agent("Citra")).await);

        let session = store.snapshot(chat_id).await.unwrap();
        assert_eq!(session.status, ChatStatus::Active);
        assert_eq!(session.agent.unwrap().name, "Budi");

        // Unknown chat can never be claimed
        assert!(!store.assign_agent(ChatId::new(), agent("Budi")).await);
    }

    #[tokio::test]
    async fn test_concurrent_assign_exactly_one_winner() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.assign_agent(chat_id, agent(&format!("agent-{i}"))).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;

        let first = store.end(chat_id).await;
        assert!(first.is_some());
        assert_eq!(first.unwrap().text, END_MESSAGE_TEXT);

        assert!(store.end(chat_id).await.is_none());
        assert!(store.end(ChatId::new()).await.is_none());

        let session = store.snapshot(chat_id).await.unwrap();
        assert_eq!(session.status, ChatStatus::Ended);
        let terminal = session
            .messages
            .iter()
            .filter(|m| m.text == END_MESSAGE_TEXT)
            .count();
        assert_eq!(terminal, 1);

        store.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_chat_retained_for_grace_period() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;
        store.end(chat_id).await.unwrap();

        // Let the removal task register its timer before moving the clock
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // Queryable right up to the retention window
        tokio::time::advance(Duration::from_secs(29)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.snapshot(chat_id).await.is_some());

        // Gone once the window elapses
        tokio::time::advance(Duration::from_secs(2)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(store.snapshot(chat_id).await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_mark_customer_disconnected() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;
        store.assign_agent(chat_id, agent("Budi")).await;

        assert!(store.mark_customer_disconnected(chat_id).await);
        let session = store.snapshot(chat_id).await.unwrap();
        assert_eq!(session.status, ChatStatus::CustomerDisconnected);

        // The session stays listed and still accepts agent messages
        assert!(store
            .append_message(
                chat_id,
                MessageKind::Agent,
                "are you there?".to_string(),
                "Budi".to_string(),
            )
            .await
            .is_some());

        // Ended chats are left alone
        store.end(chat_id).await;
        assert!(!store.mark_customer_disconnected(chat_id).await);
        assert_eq!(store.snapshot(chat_id).await.unwrap().status, ChatStatus::Ended);

        // Unknown chats are a no-op
        assert!(!store.mark_customer_disconnected(ChatId::new()).await);

        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_transfer_appends_notification_without_rebinding() {
        let store = SessionStore::new(RETENTION);
        let chat_id = ChatId::new();
        store.create(customer(chat_id)).await;
        store.assign_agent(chat_id, agent("Budi")).await;

        let message = store.transfer(chat_id, "Citra").await.unwrap();
        assert_eq!(message.kind, MessageKind::System);
        assert_eq!(message.text, "Chat telah ditransfer ke Citra");

        let session = store.snapshot(chat_id).await.unwrap();
        assert_eq!(session.agent.unwrap().name, "Budi");

        assert!(store.transfer(ChatId::new(), "Citra").await.is_none());
    }
}
