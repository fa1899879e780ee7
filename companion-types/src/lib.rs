//! Misuse-resistant data structures for the companion-app protocol.
//!
//! This crate holds the protocol's *shapes* — the value graph, message and
//! command enums, handshake payloads — with no parsing or I/O attached.
//! [`companion_codec`](https://docs.rs/companion-codec) turns bytes into
//! these types and back; [`companion_client`](https://docs.rs/companion-client)
//! drives them over a socket.

pub mod command;
pub mod discovery;
pub mod graph;
pub mod handshake;
pub mod message;
pub mod value;

pub use command::{CommandKind, CommandRequest, LocationMarkerKind};
pub use graph::{Graph, GraphError, Id, Node};
pub use handshake::VersionInfo;
pub use message::MessageType;
pub use value::{Value, ValueType};
