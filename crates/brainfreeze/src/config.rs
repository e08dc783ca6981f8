//! Server configuration.

use std::time::Duration;

use brainfreeze_lobby::LobbyConfig;
use brainfreeze_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Everything the server needs to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Close connections that send nothing for this long.
    /// `None` keeps quiet connections open indefinitely.
    pub idle_timeout: Option<Duration>,

    pub lobby: LobbyConfig,

    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8070".to_string(),
            idle_timeout: None,
            lobby: LobbyConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
