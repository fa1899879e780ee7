//! TCP connection setup and the handshake exchange.

use companion_codec::{decode_first_message, encode_accepted, encode_refused, FrameCodec, HandshakeOutcome};
use companion_types::VersionInfo;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

use crate::error::ServiceError;

/// The default companion-app TCP port.
pub const DEFAULT_PORT: u16 = 27000;

/// Connects to `addr`, completes the client-role handshake, and returns the
/// framed connection plus the server's advertised version.
pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<(Framed<TcpStream, FrameCodec>, VersionInfo), ServiceError> {
    let stream = TcpStream::connect(addr).await?;
    let mut framed = Framed::new(stream, FrameCodec);

    let first = framed.next().await.ok_or(ServiceError::PeerClosed)??;
    match decode_first_message(&first)? {
        HandshakeOutcome::Accepted(info) => Ok((framed, info)),
        HandshakeOutcome::Refused(diagnostic) => Err(ServiceError::Refused(diagnostic)),
    }
}

/// Server role: immediately after accepting `stream`, sends
/// `CONNECTION_ACCEPTED` carrying `info`.
pub async fn accept(stream: TcpStream, info: &VersionInfo) -> Result<Framed<TcpStream, FrameCodec>, ServiceError> {
    let mut framed = Framed::new(stream, FrameCodec);
    framed.send(encode_accepted(info)).await?;
    Ok(framed)
}

/// Server role: immediately after accepting `stream`, refuses the
/// connection with an optional diagnostic.
pub async fn refuse(stream: TcpStream, diagnostic: Option<&str>) -> Result<(), ServiceError> {
    let mut framed = Framed::new(stream, FrameCodec);
    framed.send(encode_refused(diagnostic)).await?;
    Ok(())
}
