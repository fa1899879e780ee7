//! Wire codec for the companion-app protocol.
//!
//! Three layers, thinnest first: [`primitive`] packs/unpacks little-endian
//! scalars and NUL-terminated strings; [`frame`] turns a byte stream into
//! `(type, payload)` frames (optionally as a `tokio_util` [`Decoder`]/
//! [`Encoder`] pair behind the `tokio` feature); [`graph_codec`] and
//! [`handshake`] interpret specific payload shapes.
//!
//! [`Decoder`]: tokio_util::codec::Decoder
//! [`Encoder`]: tokio_util::codec::Encoder

pub mod error;
pub mod frame;
pub mod graph_codec;
pub mod handshake;
pub mod primitive;

pub use error::{FrameError, HandshakeError, PrimitiveError, RecordError};
pub use frame::{decode_frame, encode_frame, Frame};
pub use graph_codec::{decode_record, encode_object_diff, encode_record, full_snapshot, RecordDecoder};
pub use handshake::{decode_first_message, encode_accepted, encode_refused, HandshakeOutcome};

#[cfg(feature = "tokio")]
pub use frame::FrameCodec;
