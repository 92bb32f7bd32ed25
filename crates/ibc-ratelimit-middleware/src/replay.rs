//! Trace replay: drive the middleware from a JSON-lines script.
//!
//! Each line is one step as the host router would deliver it:
//! - `{"step":"send","source_channel":"channel-0","denom":"stake","amount":"10"}`
//! - `{"step":"recv","destination_channel":"channel-0","denom":"stake","amount":"10"}`
//! - `{"step":"ack","sequence":1,"error":"insufficient funds"}` (omit `error` for success)
//! - `{"step":"timeout","sequence":1}`
//!
//! `ack` and `timeout` refer to sequences returned by earlier `send` steps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use serde::Deserialize;

use ibc_ratelimit_core::error::{Result, RateLimitError};
use ibc_ratelimit_core::protocol::channel::{ChannelCapability, ChannelOpen};
use ibc_ratelimit_core::protocol::{
    AckClassifier, Acknowledgement, FungibleTokenPacketData, Height, Packet, TimeoutHeight,
};

use crate::config::RateLimitConfig;
use crate::contract::{ContractAddress, ContractFailure, PolicyContract, QuotaContract};
use crate::middleware::{IbcModule, Ics4Wrapper, RateLimitMiddleware};
use crate::obs::{EventLog, EventSink, FanOutSink, RateLimitMetrics, TracingEventSink};
use crate::policy::{MemoryParamStore, RateLimitKeeper};

const TRANSFER_PORT: &str = "transfer";
const COUNTERPARTY_CHANNEL: &str = "channel-counterparty";
const RELAYER: &str = "replay-relayer";

fn default_amount() -> String {
    "1".into()
}

fn default_party() -> String {
    "cosmos1replay".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Send {
        source_channel: String,
        denom: String,
        #[serde(default = "default_amount")]
        amount: String,
        #[serde(default = "default_party")]
        sender: String,
        #[serde(default = "default_party")]
        receiver: String,
    },
    Recv {
        destination_channel: String,
        denom: String,
        #[serde(default = "default_amount")]
        amount: String,
        #[serde(default = "default_party")]
        sender: String,
        #[serde(default = "default_party")]
        receiver: String,
    },
    Ack {
        sequence: u64,
        #[serde(default)]
        error: Option<String>,
    },
    Timeout {
        sequence: u64,
    },
}

/// Parse a JSON-lines trace, skipping blank lines and `#` comments.
pub fn parse_trace(s: &str) -> Result<Vec<Step>> {
    s.lines()
        .enumerate()
        .filter(|(_, l)| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        })
        .map(|(i, l)| {
            serde_json::from_str(l)
                .map_err(|e| RateLimitError::BadMessage(format!("trace line {}: {e}", i + 1)))
        })
        .collect()
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Sent { sequence: u64 },
    SendRejected { error: String },
    Received { ack: Acknowledgement },
    Acknowledged,
    TimedOut,
    Failed { error: String },
}

/// Transfer app stand-in that accepts everything and logs.
#[derive(Default)]
pub struct LoggingTransferApp;

impl IbcModule for LoggingTransferApp {
    fn on_chan_open_init(&self, open: &ChannelOpen) -> Result<String> {
        Ok(open.version.clone())
    }

    fn on_chan_open_try(&self, open: &ChannelOpen) -> Result<String> {
        Ok(open.version.clone())
    }

    fn on_chan_open_ack(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn on_chan_open_confirm(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn on_chan_close_init(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn on_chan_close_confirm(&self, _: &str, _: &str) -> Result<()> {
        Ok(())
    }

    fn on_recv_packet(&self, packet: &Packet, _relayer: &str) -> Acknowledgement {
        tracing::info!(dst = %packet.destination_channel, "transfer app received packet");
        Acknowledgement::success()
    }

    fn on_acknowledgement_packet(&self, packet: &Packet, _: &[u8], _: &str) -> Result<()> {
        tracing::info!(seq = packet.sequence, "transfer app handled ack");
        Ok(())
    }

    fn on_timeout_packet(&self, packet: &Packet, _: &str) -> Result<()> {
        tracing::info!(seq = packet.sequence, "transfer app handled timeout (refund)");
        Ok(())
    }
}

/// Channel stand-in that assigns sequences and remembers committed packets.
pub struct RecordingChannel {
    next_sequence: AtomicU64,
    sent: DashMap<u64, Packet>,
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self {
            next_sequence: AtomicU64::new(1),
            sent: DashMap::new(),
        }
    }
}

impl RecordingChannel {
    pub fn sent_packet(&self, sequence: u64) -> Option<Packet> {
        self.sent.get(&sequence).map(|p| p.value().clone())
    }
}

impl Ics4Wrapper for RecordingChannel {
    fn send_packet(
        &self,
        _capability: ChannelCapability,
        source_port: &str,
        source_channel: &str,
        timeout_height: TimeoutHeight,
        timeout_timestamp: u64,
        data: Bytes,
    ) -> Result<u64> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let packet = Packet::new(
            data,
            sequence,
            source_port,
            source_channel,
            TRANSFER_PORT,
            COUNTERPARTY_CHANNEL,
            timeout_height,
            timeout_timestamp,
        );
        self.sent.insert(sequence, packet);
        Ok(sequence)
    }

    fn write_acknowledgement(&self, _: ChannelCapability, _: &Packet, _: &Acknowledgement) -> Result<()> {
        Ok(())
    }

    fn get_app_version(&self, _: &str, _: &str) -> Option<String> {
        Some("ics20-1".into())
    }
}

/// Stands in for the contract when none is configured; never reached
/// because the keeper short-circuits unconfigured checks.
struct DisabledContract;

impl PolicyContract for DisabledContract {
    fn invoke(&self, address: &ContractAddress, _: &[u8]) -> std::result::Result<Vec<u8>, ContractFailure> {
        Err(ContractFailure(format!("no contract at {address}")))
    }
}

/// Middleware plus the fakes it wraps.
pub struct Replayer {
    middleware: RateLimitMiddleware,
    channel: Arc<RecordingChannel>,
    events: Arc<EventLog>,
    metrics: Arc<RateLimitMetrics>,
}

impl Replayer {
    pub fn from_config(cfg: &RateLimitConfig) -> Result<Self> {
        let section = &cfg.rate_limit;
        let events = Arc::new(EventLog::new());
        let sink: Arc<dyn EventSink> = Arc::new(
            FanOutSink::new()
                .with(events.clone())
                .with(Arc::new(TracingEventSink)),
        );
        let metrics = Arc::new(RateLimitMetrics::default());

        let contract: Arc<dyn PolicyContract> = if section.contract_address.is_empty() {
            Arc::new(DisabledContract)
        } else {
            let address = ContractAddress::parse(&section.contract_address)?;
            Arc::new(QuotaContract::new(address, &cfg.quotas)?)
        };

        let keeper = Arc::new(RateLimitKeeper::new(
            Arc::new(MemoryParamStore::new(section.params())),
            contract,
            sink.clone(),
            section.authority.clone(),
        ));

        let channel = Arc::new(RecordingChannel::default());
        let middleware = RateLimitMiddleware::new(
            Arc::new(LoggingTransferApp),
            channel.clone(),
            keeper,
            sink,
        )
        .with_metrics(metrics.clone())
        .with_classifier(AckClassifier::new(section.unparsable_ack))
        .with_module_name(section.module_name.clone());

        Ok(Self {
            middleware,
            channel,
            events,
            metrics,
        })
    }

    pub fn middleware(&self) -> &RateLimitMiddleware {
        &self.middleware
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn metrics(&self) -> &RateLimitMetrics {
        &self.metrics
    }

    fn sent(&self, sequence: u64) -> Result<Packet> {
        self.channel
            .sent_packet(sequence)
            .ok_or_else(|| RateLimitError::BadMessage(format!("no sent packet with sequence {sequence}")))
    }

    pub fn step(&self, step: &Step) -> StepOutcome {
        match step {
            Step::Send {
                source_channel,
                denom,
                amount,
                sender,
                receiver,
            } => {
                let data = FungibleTokenPacketData::new(denom, amount, sender, receiver).to_bytes();
                match self.middleware.send_packet(
                    ChannelCapability(1),
                    TRANSFER_PORT,
                    source_channel,
                    Height::new(0, 1_000_000).into(),
                    0,
                    data,
                ) {
                    Ok(sequence) => StepOutcome::Sent { sequence },
                    Err(e) => StepOutcome::SendRejected {
                        error: e.to_string(),
                    },
                }
            }
            Step::Recv {
                destination_channel,
                denom,
                amount,
                sender,
                receiver,
            } => {
                let data = FungibleTokenPacketData::new(denom, amount, sender, receiver).to_bytes();
                let packet = Packet::new(
                    data,
                    0,
                    TRANSFER_PORT,
                    COUNTERPARTY_CHANNEL,
                    TRANSFER_PORT,
                    destination_channel.as_str(),
                    Height::new(0, 1_000_000),
                    0,
                );
                StepOutcome::Received {
                    ack: self.middleware.on_recv_packet(&packet, RELAYER),
                }
            }
            Step::Ack { sequence, error } => {
                let res = self.sent(*sequence).and_then(|packet| {
                    let ack = match error {
                        Some(e) => Acknowledgement::Error(e.clone()),
                        None => Acknowledgement::success(),
                    };
                    self.middleware
                        .on_acknowledgement_packet(&packet, &ack.to_bytes(), RELAYER)
                });
                match res {
                    Ok(()) => StepOutcome::Acknowledged,
                    Err(e) => StepOutcome::Failed {
                        error: e.to_string(),
                    },
                }
            }
            Step::Timeout { sequence } => {
                let res = self
                    .sent(*sequence)
                    .and_then(|packet| self.middleware.on_timeout_packet(&packet, RELAYER));
                match res {
                    Ok(()) => StepOutcome::TimedOut,
                    Err(e) => StepOutcome::Failed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    pub fn run(&self, steps: &[Step]) -> Vec<StepOutcome> {
        steps
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let out = self.step(s);
                tracing::info!(step = i + 1, outcome = ?out, "replayed");
                out
            })
            .collect()
    }
}
