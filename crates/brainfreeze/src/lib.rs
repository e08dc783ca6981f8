//! # Brainfreeze
//!
//! Multiplayer coordination server for the Brainfreeze casual games.
//!
//! Browsers connect over WebSocket, wait in a lobby for their game, get
//! promoted together into a session when the lobby's countdown runs out,
//! and are told who won once every result is in. The games themselves
//! run client-side; this server only coordinates who plays with whom and
//! compares final scores.
//!
//! ## Layers
//!
//! ```text
//! handler (one task per socket)
//!     ↓ ClientMessage
//! Hub ──→ Registry (where is each connection?)
//!     ├──→ LobbyManager   → lobby actors   (join / leave / countdown)
//!     └──→ SessionManager → session actors (results / outcome)
//!                                 ↓ SessionReport
//!                           recorder → RecordStore
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brainfreeze::prelude::*;
//!
//! # async fn run() -> Result<(), BrainfreezeError> {
//! let server = BrainfreezeServer::builder()
//!     .bind("0.0.0.0:8070")
//!     .build(MemoryStore::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod hub;
mod logging;
mod recorder;
mod server;
mod store;

pub use config::ServerConfig;
pub use error::BrainfreezeError;
pub use hub::Hub;
pub use logging::init_logging;
pub use recorder::persist_report;
pub use server::{BrainfreezeServer, BrainfreezeServerBuilder};
pub use store::{GameId, GameRecord, MemoryStore, RecordStore, ScoreRecord, StoreError, UserRecord};

/// Everything needed to embed or test the server.
pub mod prelude {
    pub use crate::{
        BrainfreezeError, BrainfreezeServer, BrainfreezeServerBuilder, GameId, GameRecord, Hub,
        MemoryStore, RecordStore, ScoreRecord, ServerConfig, StoreError, UserRecord,
    };
    pub use brainfreeze_countdown::{Countdown, CountdownStep};
    pub use brainfreeze_lobby::{LobbyConfig, LobbyError, LobbyInfo, LobbyState};
    pub use brainfreeze_protocol::{
        ClientMessage, ConnectionId, GameType, LobbyKind, ProtocolError, Score, ServerMessage,
        SessionId, Submission, UserId,
    };
    pub use brainfreeze_registry::{Membership, RegistryError};
    pub use brainfreeze_session::{
        SessionConfig, SessionError, SessionInfo, SessionReport, Standing, Verdict,
    };
    pub use brainfreeze_transport::TransportError;
}
