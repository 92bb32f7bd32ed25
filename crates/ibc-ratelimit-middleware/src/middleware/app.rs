//! Interfaces the middleware wraps and presents.
//!
//! `IbcModule` is the packet-lifecycle callback set the core router drives;
//! `Ics4Wrapper` is the channel layer an application sends through. A
//! middleware implements both so it can sit between a router and an app.

use bytes::Bytes;

use ibc_ratelimit_core::error::Result;
use ibc_ratelimit_core::protocol::channel::{ChannelCapability, ChannelOpen};
use ibc_ratelimit_core::protocol::{Acknowledgement, Packet, TimeoutHeight};

/// Packet-lifecycle callbacks of an application module.
pub trait IbcModule: Send + Sync {
    fn on_chan_open_init(&self, open: &ChannelOpen) -> Result<String>;

    fn on_chan_open_try(&self, open: &ChannelOpen) -> Result<String>;

    fn on_chan_open_ack(
        &self,
        port_id: &str,
        channel_id: &str,
        counterparty_channel_id: &str,
        counterparty_version: &str,
    ) -> Result<()>;

    fn on_chan_open_confirm(&self, port_id: &str, channel_id: &str) -> Result<()>;

    fn on_chan_close_init(&self, port_id: &str, channel_id: &str) -> Result<()>;

    fn on_chan_close_confirm(&self, port_id: &str, channel_id: &str) -> Result<()>;

    /// An error acknowledgement discards the app's state changes upstream.
    fn on_recv_packet(&self, packet: &Packet, relayer: &str) -> Acknowledgement;

    fn on_acknowledgement_packet(
        &self,
        packet: &Packet,
        acknowledgement: &[u8],
        relayer: &str,
    ) -> Result<()>;

    fn on_timeout_packet(&self, packet: &Packet, relayer: &str) -> Result<()>;
}

/// Channel-layer operations an application sends through.
pub trait Ics4Wrapper: Send + Sync {
    /// Commit a packet and return its assigned sequence.
    fn send_packet(
        &self,
        capability: ChannelCapability,
        source_port: &str,
        source_channel: &str,
        timeout_height: TimeoutHeight,
        timeout_timestamp: u64,
        data: Bytes,
    ) -> Result<u64>;

    fn write_acknowledgement(
        &self,
        capability: ChannelCapability,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> Result<()>;

    fn get_app_version(&self, port_id: &str, channel_id: &str) -> Option<String>;
}
