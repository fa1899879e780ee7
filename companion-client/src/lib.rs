//! Async client/server runtime for the companion-app protocol: connection
//! setup and handshake, the concurrent service loop, RPC correlation, and
//! broadcast discovery.

mod config;
mod connection;
mod discovery;
mod error;
mod rpc;
mod service;
mod views;

pub use config::ServiceConfig;
pub use connection::{accept, connect, refuse, DEFAULT_PORT};
pub use discovery::{discover, DiscoverServer, DiscoveredServer, DISCOVERY_PORT};
pub use error::ServiceError;
pub use rpc::RpcCorrelator;
pub use service::{Service, SubscriptionId};
pub use views::{Inventory, InventoryItem, PlayerStatus};
