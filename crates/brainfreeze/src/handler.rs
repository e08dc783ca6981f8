//! Per-connection handler: register, pump frames, unregister.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The task owns the socket. Inbound frames are decoded and handed to the
//! [`Hub`]; outbound frames arrive on the connection's registry channel
//! and are written out here, so lobby and session actors never wait on a
//! slow client.

use std::time::Duration;

use brainfreeze_protocol::{ClientMessage, Codec, ConnectionId, JsonCodec, ServerMessage};
use brainfreeze_registry::Frame;
use brainfreeze_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::{BrainfreezeError, Hub, RecordStore};

/// Drop guard that runs the disconnect path when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task; unregistering twice
/// is harmless.
struct ConnectionGuard<S: RecordStore> {
    conn_id: ConnectionId,
    hub: Hub<S>,
}

impl<S: RecordStore> Drop for ConnectionGuard<S> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let hub = self.hub.clone();
        tokio::spawn(async move {
            hub.unregister(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: RecordStore>(
    conn: WebSocketConnection,
    hub: Hub<S>,
    idle_timeout: Option<Duration>,
) -> Result<(), BrainfreezeError> {
    let (tx, mut outbound) = mpsc::unbounded_channel();
    let conn_id = hub.register(tx).await;
    let _guard = ConnectionGuard {
        conn_id,
        hub: hub.clone(),
    };
    tracing::info!(%conn_id, peer = %conn.peer_addr(), "connection accepted");

    let result = pump(&conn, &hub, conn_id, &mut outbound, idle_timeout).await;

    hub.unregister(conn_id).await;
    let _ = conn.close().await;
    tracing::info!(%conn_id, "connection closed");
    result
}

/// Moves frames both ways until the client goes away.
///
/// The idle deadline only moves when the client sends something; frames
/// we push out do not count as activity.
async fn pump<S: RecordStore>(
    conn: &WebSocketConnection,
    hub: &Hub<S>,
    conn_id: ConnectionId,
    outbound: &mut mpsc::UnboundedReceiver<Frame>,
    idle_timeout: Option<Duration>,
) -> Result<(), BrainfreezeError> {
    let mut deadline = idle_timeout.map(|limit| Instant::now() + limit);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => conn.send(&frame).await?,
                // Registry entry removed underneath us.
                None => return Ok(()),
            },
            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => {
                    deadline = idle_timeout.map(|limit| Instant::now() + limit);
                    handle_frame(hub, conn_id, &data).await;
                }
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed cleanly");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    return Err(e.into());
                }
            },
            () = wait_until(deadline) => {
                tracing::info!(%conn_id, "connection idle, closing");
                return Ok(());
            }
        }
    }
}

/// Sleeps until `deadline`, or forever without one.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Decodes one inbound frame and routes it.
///
/// Malformed frames are dropped. Rejected requests are answered with an
/// `error` message to this connection only.
async fn handle_frame<S: RecordStore>(hub: &Hub<S>, conn_id: ConnectionId, data: &[u8]) {
    let msg: ClientMessage = match JsonCodec.decode(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "dropping malformed message");
            return;
        }
    };

    if let Err(e) = hub.handle(conn_id, msg).await {
        tracing::debug!(%conn_id, error = %e, "request rejected");
        // Through the gateway so the reply stays ordered with broadcasts.
        hub.gateway()
            .send(conn_id, &ServerMessage::Error { message: e.to_string() })
            .await;
    }
}
