//! Channel handshake types passed through the middleware untouched.

use serde::{Deserialize, Serialize};

/// Channel ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Unordered,
    Ordered,
}

/// The other end of a channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub port_id: String,
    pub channel_id: String,
}

/// Capability proving the caller owns a channel end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelCapability(pub u64);

/// Arguments shared by `OnChanOpenInit` and `OnChanOpenTry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOpen {
    pub order: Order,
    pub connection_hops: Vec<String>,
    pub port_id: String,
    pub channel_id: String,
    pub capability: ChannelCapability,
    pub counterparty: Counterparty,
    /// Proposed version on init, counterparty version on try.
    pub version: String,
}
