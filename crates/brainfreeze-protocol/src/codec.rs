//! Message serialization.
//!
//! The codec turns [`ServerMessage`](crate::ServerMessage)s into frame
//! bytes and frame bytes into [`ClientMessage`](crate::ClientMessage)s.
//! The rest of the server doesn't care HOW messages are serialized; it
//! just needs something that implements the [`Codec`] trait.
//!
//! The browser clients speak JSON, so [`JsonCodec`] is the only
//! implementation we ship.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts messages to frame bytes and back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads. The gateway holds one
///   codec and every lobby/session actor encodes through it.
/// - `'static` → the codec doesn't borrow temporary data, so it can live
///   inside long-lived async tasks.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the decoded value
/// doesn't borrow from the input frame, so the frame buffer can be dropped
/// right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes one message.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` for malformed JSON, an unknown
    /// `type`, or missing fields.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// The JSON wire format the browser clients speak.
///
/// ## Example
///
/// ```rust
/// use brainfreeze_protocol::{Codec, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
/// let msg = ServerMessage::Countdown { seconds: 3 };
///
/// let bytes = codec.encode(&msg).unwrap();
/// assert_eq!(bytes, br#"{"type":"countdown","seconds":3}"#);
///
/// let decoded: ServerMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
