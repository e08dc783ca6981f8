//! `BrainfreezeServer` builder and accept loop.
//!
//! This is the entry point for running the coordination server. It ties
//! together all the layers: transport → handler → hub → lobby / session.

use std::net::SocketAddr;
use std::time::Duration;

use brainfreeze_lobby::LobbyConfig;
use brainfreeze_session::SessionConfig;
use brainfreeze_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{BrainfreezeError, Hub, MemoryStore, RecordStore, ServerConfig};

/// Builder for configuring and starting a Brainfreeze server.
///
/// # Example
///
/// ```rust,no_run
/// use brainfreeze::prelude::*;
///
/// # async fn run() -> Result<(), BrainfreezeError> {
/// let server = BrainfreezeServer::builder()
///     .bind("0.0.0.0:8070")
///     .lobby_config(LobbyConfig { countdown_secs: 5, ..LobbyConfig::default() })
///     .build(MemoryStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BrainfreezeServerBuilder {
    config: ServerConfig,
}

impl BrainfreezeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the lobby configuration.
    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.config.lobby = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Closes connections that stay silent for `timeout`.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener and sets up the hub on top of `store`.
    pub async fn build<S: RecordStore>(
        self,
        store: S,
    ) -> Result<BrainfreezeServer<S>, BrainfreezeError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let hub = Hub::new(self.config.lobby, self.config.session, store);

        Ok(BrainfreezeServer {
            transport,
            hub,
            idle_timeout: self.config.idle_timeout,
        })
    }
}

/// A bound Brainfreeze server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BrainfreezeServer<S = MemoryStore> {
    transport: WebSocketTransport,
    hub: Hub<S>,
    idle_timeout: Option<Duration>,
}

impl BrainfreezeServer {
    /// Creates a new builder. The store type is picked by
    /// [`build`](BrainfreezeServerBuilder::build).
    pub fn builder() -> BrainfreezeServerBuilder {
        BrainfreezeServerBuilder::new()
    }
}

impl<S: RecordStore> BrainfreezeServer<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, BrainfreezeError> {
        Ok(self.transport.local_addr()?)
    }

    /// The hub every connection is routed through.
    pub fn hub(&self) -> &Hub<S> {
        &self.hub
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), BrainfreezeError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Brainfreeze server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let hub = self.hub.clone();
                    let idle_timeout = self.idle_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, hub, idle_timeout).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
