//! UDP broadcast discovery: a client probes the local network
//! for servers, a server answers one probe at a time. Grounded on
//! `mrpippy.discovery` (`discover`, `DiscoverServer`), with `select()`
//! polling replaced by `tokio::time::timeout` and the blocking socket
//! replaced by `tokio::net::UdpSocket`.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use companion_types::discovery::{DiscoverProbe, DiscoverReply};
use tokio::net::UdpSocket;

use crate::error::ServiceError;

/// The UDP port discovery probes and replies are exchanged on.
pub const DISCOVERY_PORT: u16 = 28000;

/// One discovered server: its advertised TCP address and machine type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredServer {
    pub addr: String,
    pub machine_type: String,
}

/// Broadcasts `repeats` autodiscover probes and collects replies for
/// `timeout`. Replies missing a required key are ignored; replies with
/// `IsBusy: true` are dropped unless `allow_busy` is set.
pub async fn discover(timeout: Duration, repeats: u32, allow_busy: bool) -> Result<HashSet<DiscoveredServer>, ServiceError> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;

    let probe = serde_json::to_vec(&DiscoverProbe::default()).expect("DiscoverProbe always serializes");
    let broadcast: SocketAddr = ([255, 255, 255, 255], DISCOVERY_PORT).into();
    for _ in 0..repeats {
        socket.send_to(&probe, broadcast).await?;
    }

    let mut results = HashSet::new();
    let mut buf = [0u8; 1024];
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        let received = match tokio::time::timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(result) => result?,
            Err(_) => break,
        };
        let (len, _from) = received;
        let Ok(reply) = serde_json::from_slice::<DiscoverReply>(&buf[..len]) else {
            continue;
        };
        if reply.is_busy && !allow_busy {
            continue;
        }
        results.insert(DiscoveredServer {
            addr: reply.addr,
            machine_type: reply.machine_type,
        });
    }
    Ok(results)
}

/// Answers autodiscover probes on [`DISCOVERY_PORT`], advertising one fixed
/// `(addr, machine_type, busy)` tuple.
pub struct DiscoverServer {
    socket: UdpSocket,
    addr: String,
    machine_type: String,
    busy: bool,
}

impl DiscoverServer {
    pub async fn bind(addr: String, machine_type: String, busy: bool) -> Result<Self, ServiceError> {
        let socket = UdpSocket::bind(("0.0.0.0", DISCOVERY_PORT)).await?;
        socket.set_broadcast(true)?;
        Ok(Self { socket, addr, machine_type, busy })
    }

    /// Waits for and answers a single well-formed probe; malformed datagrams
    /// are ignored and don't count against the caller.
    pub async fn serve_one(&self) -> Result<(), ServiceError> {
        let mut buf = [0u8; 1024];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            if serde_json::from_slice::<DiscoverProbe>(&buf[..len]).is_err() {
                continue;
            }
            let reply = DiscoverReply {
                machine_type: self.machine_type.clone(),
                addr: self.addr.clone(),
                is_busy: self.busy,
            };
            let payload = serde_json::to_vec(&reply).expect("DiscoverReply always serializes");
            self.socket.send_to(&payload, from).await?;
            return Ok(());
        }
    }

    pub async fn serve_forever(&self) -> Result<(), ServiceError> {
        loop {
            self.serve_one().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_and_server_round_trip_a_probe_and_reply() {
        let server = DiscoverServer::bind("192.168.1.5:27000".to_string(), "PC".to_string(), false)
            .await
            .expect("bind discovery server");
        let server_task = tokio::spawn(async move {
            server.serve_one().await.unwrap();
        });

        let found = discover(Duration::from_millis(500), 1, false).await.unwrap();
        server_task.await.unwrap();

        assert!(found.contains(&DiscoveredServer {
            addr: "192.168.1.5:27000".to_string(),
            machine_type: "PC".to_string(),
        }));
    }
}
