//! Real-time support chat relay core
//!
//! In-memory model of chats, customers, and agents, plus the routing
//! rules between them:
//! - **Connection**: a live connection and its outbound event channel
//! - **Directory**: connection identity -> customer/agent record
//! - **Session/Store**: chat sessions, message logs, lifecycle
//! - **Stats**: live aggregate counters for the agent dashboard
//! - **Room**: per-chat and agent-group broadcast scopes
//! - **Handler**: WebSocket route handler and event dispatch
//! - **Events**: type-safe wire protocol definitions

pub mod connection;
pub mod directory;
pub mod events;
pub mod handler;
pub mod room;
pub mod session;
pub mod state;
pub mod stats;
pub mod store;

pub use handler::ws_handler;
pub use state::ChatState;
