//! Wire protocol for Brainfreeze multiplayer.
//!
//! This crate defines the "language" that browser clients and the
//! coordination server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`GameType`],
//!   [`LobbyKind`], [`Score`], the id newtypes): the structures that
//!   travel on the wire or label things in logs.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the
//! lobby/session actors. It doesn't know about connections or timers;
//! it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (frames) → Protocol (ClientMessage) → Hub → Lobby / Session
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, ConnectionId, GameType, LobbyKind, Score, ServerMessage,
    SessionId, Submission, UserId,
};
