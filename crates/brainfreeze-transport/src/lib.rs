//! Transport abstraction layer for Brainfreeze.
//!
//! Provides the [`Transport`] and [`Connection`] traits so the server
//! loop never touches sockets directly. The browsers talk WebSocket, so
//! that is the one implementation shipped here.
//!
//! Connections carry no identity of their own: the connection registry
//! hands out ids when a connection is accepted. The transport only
//! exposes the peer address, for logging.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::net::SocketAddr;

/// A listener that hands out client connections.
pub trait Transport: Send + Sync + 'static {
    /// What `accept` yields.
    type Connection: Connection;
    /// Error for bind/accept.
    type Error: std::error::Error + Send + Sync;

    /// Blocks until the next client has connected.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// A single connection that can send and receive whole messages.
///
/// `send` and `recv` may be called concurrently from the same task via
/// `tokio::select!`: implementations must not let a pending `recv`
/// block a `send`.
pub trait Connection: Send + Sync + 'static {
    /// Error for send/recv/close.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Waits for the next whole message from the client.
    ///
    /// `Ok(None)` means the client closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts the closing handshake.
    async fn close(&self) -> Result<(), Self::Error>;

    /// The remote peer's address.
    fn peer_addr(&self) -> SocketAddr;
}
