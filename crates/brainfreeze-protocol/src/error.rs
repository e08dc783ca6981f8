//! What can go wrong turning messages into bytes and back.
//!
//! Each crate in Brainfreeze defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization/deserialization, not
//! in networking or lobby bookkeeping.

/// Encode/decode failures.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A message could not be serialized.
    #[cfg(feature = "json")]
    #[error("cannot encode message: {0}")]
    Encode(serde_json::Error),

    /// A frame could not be parsed as a message.
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, a missing
    /// `score` field, or a negative score.
    #[cfg(feature = "json")]
    #[error("cannot decode message: {0}")]
    Decode(serde_json::Error),
}
