//! The runtime's unified error type. Every fatal condition the
//! service can observe — from any of its three activities — converges here
//! so `Service::wait()` can report one cause.

use std::io::Error as IoError;

use companion_codec::{FrameError, HandshakeError, RecordError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("malformed DATA_UPDATE record: {0}")]
    Record(#[from] RecordError),
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// Server sent `CONNECTION_REFUSED` during handshake.
    #[error("server refused the connection: {0:?}")]
    Refused(Option<String>),
    /// A `COMMAND_RESULT` named an id not in the outstanding map.
    #[error("COMMAND_RESULT for unknown request id {0}")]
    UnknownResponse(u32),
    /// `COMMAND_RESULT` payload wasn't a JSON object carrying an integer `id`.
    #[error("malformed COMMAND_RESULT payload: {0}")]
    MalformedResponse(String),
    /// Clean EOF on receive with no partial frame — not really a failure.
    #[error("peer closed the connection")]
    PeerClosed,
}

impl Clone for ServiceError {
    /// `wait()` may be awaited by more than one caller; each gets its own
    /// copy of the terminal cause. `io::Error` isn't `Clone`, so it's
    /// round-tripped through its `ErrorKind`.
    fn clone(&self) -> Self {
        match self {
            Self::Io(err) => Self::Io(IoError::from(err.kind())),
            Self::Frame(err) => Self::Frame(err.clone()),
            Self::Record(err) => Self::Record(err.clone()),
            Self::Handshake(err) => Self::Handshake(err.clone()),
            Self::Refused(diag) => Self::Refused(diag.clone()),
            Self::UnknownResponse(id) => Self::UnknownResponse(*id),
            Self::MalformedResponse(msg) => Self::MalformedResponse(msg.clone()),
            Self::PeerClosed => Self::PeerClosed,
        }
    }
}
