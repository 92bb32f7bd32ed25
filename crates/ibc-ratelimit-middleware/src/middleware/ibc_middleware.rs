use std::sync::Arc;

use bytes::Bytes;

use ibc_ratelimit_core::error::Result;
use ibc_ratelimit_core::protocol::channel::{ChannelCapability, ChannelOpen};
use ibc_ratelimit_core::protocol::{
    decode_acknowledgement, validate_receiver_address, AckClassifier, Acknowledgement, Operation,
    Packet, TimeoutHeight,
};

use crate::obs::{Event, EventSink, RateLimitMetrics};
use crate::policy::RateLimitKeeper;

use super::app::{IbcModule, Ics4Wrapper};
use super::error_ack::new_error_acknowledgement;

/// Module name reported in revert-failure events.
pub const MODULE_NAME: &str = "ibcratelimit";

/// Sequence used for the admission check in `send_packet`. The real
/// sequence is assigned by the channel layer after admission.
pub const PLACEHOLDER_SEQUENCE: u64 = 0;

/// Rate limiting interceptor between the core router and a transfer app.
///
/// Admission is checked on send and receive; quota is returned to the
/// policy contract when a sent packet is acknowledged with an error or
/// times out. Everything else is forwarded unchanged.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    app: Arc<dyn IbcModule>,
    channel: Arc<dyn Ics4Wrapper>,
    keeper: Arc<RateLimitKeeper>,
    events: Arc<dyn EventSink>,
    metrics: Arc<RateLimitMetrics>,
    classifier: AckClassifier,
    module_name: String,
}

impl RateLimitMiddleware {
    pub fn new(
        app: Arc<dyn IbcModule>,
        channel: Arc<dyn Ics4Wrapper>,
        keeper: Arc<RateLimitKeeper>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            app,
            channel,
            keeper,
            events,
            metrics: Arc::new(RateLimitMetrics::default()),
            classifier: AckClassifier::default(),
            module_name: MODULE_NAME.to_string(),
        }
    }

    /// Replace the wrapped application.
    pub fn with_ibc_module(mut self, app: Arc<dyn IbcModule>) -> Self {
        self.app = app;
        self
    }

    pub fn with_classifier(mut self, classifier: AckClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<RateLimitMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn metrics(&self) -> &Arc<RateLimitMetrics> {
        &self.metrics
    }

    fn record_revert(&self, trigger: &str, res: &Result<()>) {
        let outcome = match res {
            Ok(()) if !self.keeper.is_contract_configured() => "skipped",
            Ok(()) => "ok",
            Err(_) => "failed",
        };
        self.metrics
            .reverts
            .inc(&[("trigger", trigger), ("outcome", outcome)]);
    }
}

impl Ics4Wrapper for RateLimitMiddleware {
    /// Check the outbound transfer before the channel commits it. A rejection
    /// aborts the send, so nothing needs compensating.
    fn send_packet(
        &self,
        capability: ChannelCapability,
        source_port: &str,
        source_channel: &str,
        timeout_height: TimeoutHeight,
        timeout_timestamp: u64,
        data: Bytes,
    ) -> Result<u64> {
        let op = Operation::SendPacket.as_str();
        if !self.keeper.is_contract_configured() {
            self.metrics.admissions.inc(&[("op", op), ("outcome", "bypass")]);
            return self.channel.send_packet(
                capability,
                source_port,
                source_channel,
                timeout_height,
                timeout_timestamp,
                data,
            );
        }

        // Destination is unknown at this layer.
        let packet = Packet::new(
            data.clone(),
            PLACEHOLDER_SEQUENCE,
            source_port,
            source_channel,
            "",
            "",
            timeout_height.clone(),
            timeout_timestamp,
        );

        if let Err(e) = self
            .keeper
            .check_and_update_rate_limits(Operation::SendPacket, &packet)
        {
            self.metrics.admissions.inc(&[("op", op), ("outcome", "reject")]);
            return Err(e.wrap("rate limit SendPacket failed to authorize transfer"));
        }
        self.metrics.admissions.inc(&[("op", op), ("outcome", "pass")]);

        self.channel.send_packet(
            capability,
            source_port,
            source_channel,
            timeout_height,
            timeout_timestamp,
            data,
        )
    }

    fn write_acknowledgement(
        &self,
        capability: ChannelCapability,
        packet: &Packet,
        ack: &Acknowledgement,
    ) -> Result<()> {
        self.channel.write_acknowledgement(capability, packet, ack)
    }

    fn get_app_version(&self, port_id: &str, channel_id: &str) -> Option<String> {
        self.channel.get_app_version(port_id, channel_id)
    }
}

impl IbcModule for RateLimitMiddleware {
    // Handshakes carry no rate limit concern. Per-channel limits could be
    // seeded here once the contract supports it.

    fn on_chan_open_init(&self, open: &ChannelOpen) -> Result<String> {
        self.app.on_chan_open_init(open)
    }

    fn on_chan_open_try(&self, open: &ChannelOpen) -> Result<String> {
        self.app.on_chan_open_try(open)
    }

    fn on_chan_open_ack(
        &self,
        port_id: &str,
        channel_id: &str,
        counterparty_channel_id: &str,
        counterparty_version: &str,
    ) -> Result<()> {
        self.app.on_chan_open_ack(
            port_id,
            channel_id,
            counterparty_channel_id,
            counterparty_version,
        )
    }

    fn on_chan_open_confirm(&self, port_id: &str, channel_id: &str) -> Result<()> {
        self.app.on_chan_open_confirm(port_id, channel_id)
    }

    fn on_chan_close_init(&self, port_id: &str, channel_id: &str) -> Result<()> {
        self.app.on_chan_close_init(port_id, channel_id)
    }

    fn on_chan_close_confirm(&self, port_id: &str, channel_id: &str) -> Result<()> {
        self.app.on_chan_close_confirm(port_id, channel_id)
    }

    fn on_recv_packet(&self, packet: &Packet, relayer: &str) -> Acknowledgement {
        let op = Operation::RecvPacket.as_str();

        if let Err(e) = validate_receiver_address(packet) {
            self.metrics
                .recv_error_acks
                .inc(&[("code", e.code().as_str())]);
            let msg = e.to_string();
            return new_error_acknowledgement(self.events.as_ref(), Some(&e), &[msg.as_str()]);
        }

        if !self.keeper.is_contract_configured() {
            self.metrics.admissions.inc(&[("op", op), ("outcome", "bypass")]);
            return self.app.on_recv_packet(packet, relayer);
        }

        if let Err(e) = self
            .keeper
            .check_and_update_rate_limits(Operation::RecvPacket, packet)
        {
            self.metrics.admissions.inc(&[("op", op), ("outcome", "reject")]);
            self.metrics
                .recv_error_acks
                .inc(&[("code", e.code().as_str())]);
            return new_error_acknowledgement(self.events.as_ref(), Some(&e), &[]);
        }
        self.metrics.admissions.inc(&[("op", op), ("outcome", "pass")]);

        // Returned as-is even when the app itself fails the packet.
        self.app.on_recv_packet(packet, relayer)
    }

    fn on_acknowledgement_packet(
        &self,
        packet: &Packet,
        acknowledgement: &[u8],
        relayer: &str,
    ) -> Result<()> {
        let ack = decode_acknowledgement(acknowledgement)?;

        if self.classifier.classify(&ack) {
            // Revert failures must not block ack handling.
            let res = self.keeper.revert_sent_packet(packet);
            self.record_revert("ack", &res);
            if let Err(e) = res {
                tracing::warn!(
                    seq = packet.sequence,
                    src = %packet.source_channel,
                    error = %e,
                    "failed to revert rate limit after error ack"
                );
                self.events.emit(Event::ack_revert_failure(
                    &self.module_name,
                    &packet.data_lossy(),
                    &String::from_utf8_lossy(acknowledgement),
                ));
            }
        }

        self.app
            .on_acknowledgement_packet(packet, acknowledgement, relayer)
    }

    fn on_timeout_packet(&self, packet: &Packet, relayer: &str) -> Result<()> {
        let res = self.keeper.revert_sent_packet(packet);
        self.record_revert("timeout", &res);
        if let Err(e) = res {
            tracing::warn!(
                seq = packet.sequence,
                src = %packet.source_channel,
                error = %e,
                "failed to revert rate limit after timeout"
            );
            self.events.emit(Event::timeout_revert_failure(
                &self.module_name,
                &packet.data_lossy(),
            ));
        }

        self.app.on_timeout_packet(packet, relayer)
    }
}
