//! Application configuration

use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// How long ended chats stay queryable before removal, in seconds
    pub chat_retention_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("BIND_ADDRESS"))?,

            chat_retention_secs: match env::var("CHAT_RETENTION_SECS") {
                Ok(value) => value.parse().map_err(|_| ConfigError::Invalid("CHAT_RETENTION_SECS"))?,
                Err(_) => 30,
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
