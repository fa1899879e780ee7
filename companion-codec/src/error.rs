//! Decode error kinds, one enum per failure domain, mirroring the
//! `Incomplete`/`Failed` split of a `GreetingDecodeError`.

use std::io;

use companion_types::GraphError;
use thiserror::Error;

/// Error during decoding of a single wire primitive (bool, intN, float,
/// NUL-terminated string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// Fewer bytes remain than the primitive requires, or no NUL terminator
    /// was found for a string. Recoverable by reading more bytes.
    #[error("incomplete: not enough bytes for this primitive")]
    Incomplete,
}

/// Error during framing.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Fewer bytes remain than the frame's declared length. Recoverable by
    /// reading more bytes; fatal only if EOF is reached first.
    #[error("incomplete: frame header or body not fully buffered")]
    Incomplete,
    /// The peer closed the connection after writing part of a frame.
    #[error("peer closed mid-frame after {bytes_consumed} bytes")]
    TruncatedByPeerClose { bytes_consumed: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Clone for FrameError {
    fn clone(&self) -> Self {
        match self {
            Self::Incomplete => Self::Incomplete,
            Self::TruncatedByPeerClose { bytes_consumed } => Self::TruncatedByPeerClose {
                bytes_consumed: *bytes_consumed,
            },
            Self::Io(err) => Self::Io(io::Error::from(err.kind())),
        }
    }
}

impl PartialEq for FrameError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Incomplete, Self::Incomplete) => true,
            (Self::TruncatedByPeerClose { bytes_consumed: a }, Self::TruncatedByPeerClose { bytes_consumed: b }) => {
                a == b
            }
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            _ => false,
        }
    }
}

/// Error during `DATA_UPDATE` record decoding and application.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// Fewer bytes remain than the record requires. Fatal: a `DATA_UPDATE`
    /// frame's payload is already fully buffered by the framer, so a
    /// record that doesn't fit is a malformed payload, not a stream restart.
    #[error("incomplete: record truncated inside an otherwise-complete DATA_UPDATE payload")]
    Incomplete,
    /// The leading type tag did not name one of the eight known value types.
    #[error("unknown value_type tag {0}")]
    UnknownValueType(u8),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Error during handshake decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// The first frame was neither `CONNECTION_ACCEPTED` nor
    /// `CONNECTION_REFUSED`.
    #[error("first message was type {0}, expected CONNECTION_ACCEPTED or CONNECTION_REFUSED")]
    UnexpectedFirstMessage(u8),
    /// Server sent `CONNECTION_REFUSED`, carrying an optional diagnostic.
    #[error("server refused the connection: {0:?}")]
    Refused(Option<String>),
    /// `serde_json::Error` is neither `Clone` nor `PartialEq`; its message is
    /// captured instead of the error value itself.
    #[error("malformed handshake JSON payload: {0}")]
    Json(String),
}

impl From<serde_json::Error> for HandshakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
