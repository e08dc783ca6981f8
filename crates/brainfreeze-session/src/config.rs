//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration shared by every session actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a session waits for the next result before resolving
    /// with what it has. Reset by every accepted submission.
    /// `None` waits forever.
    pub result_timeout: Option<Duration>,

    /// Capacity of each session's command queue.
    pub channel_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            result_timeout: Some(Duration::from_secs(300)),
            channel_size: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.result_timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.channel_size, 64);
    }
}
