//! SXTream Support Relay Library
//!
//! Real-time support-chat relay: customers and agents connect over
//! WebSockets; the relay routes messages between a customer and the
//! agent handling their session, tracks session lifecycle, and maintains
//! live aggregate statistics.

pub mod chat;
pub mod config;
pub mod routes;
pub mod state;

pub use chat::ChatState;
pub use config::Config;
pub use state::AppState;
