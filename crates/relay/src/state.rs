//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use crate::chat::ChatState;
use crate::config::Config;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chat: ChatState,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let retention = Duration::from_secs(config.chat_retention_secs);
        Self {
            config: Arc::new(config),
            chat: ChatState::new(retention),
        }
    }
}
