#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use ibc_ratelimit_core::error::{RateLimitError, Result};
use ibc_ratelimit_core::protocol::channel::{ChannelCapability, ChannelOpen};
use ibc_ratelimit_core::protocol::{
    is_ack_error, AckClassifier, Acknowledgement, FungibleTokenPacketData, Height, Packet,
    TimeoutHeight,
};
use ibc_ratelimit_middleware::contract::{ContractAddress, QuotaContract, QuotaSpec};
use ibc_ratelimit_middleware::middleware::{IbcModule, Ics4Wrapper, RateLimitMiddleware};
use ibc_ratelimit_middleware::obs::EventLog;
use ibc_ratelimit_middleware::policy::{MemoryParamStore, Params, RateLimitKeeper};

pub const CONTRACT: &str = "cosmos1qyqszqgpqyqszqgp";
pub const OTHER_CONTRACT: &str = "cosmos1zzzzzzzzzzzz";
pub const GOV: &str = "cosmos10d07y265gmmuvt4z0w9aw880jnsr700j6zn9kn";
pub const CHANNEL: &str = "channel-0";
pub const COUNTERPARTY: &str = "channel-7";
pub const DENOM: &str = "stake";
pub const ESCROW: &str = "escrow/channel-0";
pub const ALICE: &str = "cosmos1alice";
pub const RELAYER: &str = "cosmos1relayer";

/// Balances keyed by account; one denom is enough here.
#[derive(Default)]
pub struct Bank {
    balances: Mutex<HashMap<String, u128>>,
}

impl Bank {
    pub fn fund(&self, account: &str, amount: u128) {
        *self.balances.lock().unwrap().entry(account.to_string()).or_default() += amount;
    }

    pub fn balance(&self, account: &str) -> u128 {
        self.balances.lock().unwrap().get(account).copied().unwrap_or(0)
    }

    pub fn move_funds(&self, from: &str, to: &str, amount: u128) -> Result<()> {
        let mut b = self.balances.lock().unwrap();
        let have = b.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(RateLimitError::Application(format!(
                "insufficient funds: {from} has {have}, needs {amount}"
            )));
        }
        b.insert(from.to_string(), have - amount);
        *b.entry(to.to_string()).or_default() += amount;
        Ok(())
    }
}

/// Transfer app that counts callbacks and refunds escrow on failure.
pub struct MockTransferApp {
    pub bank: Arc<Bank>,
    pub recv_ack: Mutex<Acknowledgement>,
    pub handshake_calls: AtomicUsize,
    pub recv_calls: AtomicUsize,
    pub ack_calls: AtomicUsize,
    pub timeout_calls: AtomicUsize,
}

impl MockTransferApp {
    pub fn new(bank: Arc<Bank>) -> Self {
        Self {
            bank,
            recv_ack: Mutex::new(Acknowledgement::success()),
            handshake_calls: AtomicUsize::new(0),
            recv_calls: AtomicUsize::new(0),
            ack_calls: AtomicUsize::new(0),
            timeout_calls: AtomicUsize::new(0),
        }
    }

    fn refund(&self, packet: &Packet) -> Result<()> {
        let data: FungibleTokenPacketData = serde_json::from_slice(&packet.data)
            .map_err(|e| RateLimitError::Application(e.to_string()))?;
        let amount = data.amount.parse::<u128>().unwrap_or(0);
        self.bank.move_funds(ESCROW, &data.sender, amount)
    }
}

impl IbcModule for MockTransferApp {
    fn on_chan_open_init(&self, open: &ChannelOpen) -> Result<String> {
        self.handshake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(open.version.clone())
    }

    fn on_chan_open_try(&self, open: &ChannelOpen) -> Result<String> {
        self.handshake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(open.version.clone())
    }

    fn on_chan_open_ack(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
        self.handshake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_chan_open_confirm(&self, _: &str, _: &str) -> Result<()> {
        self.handshake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_chan_close_init(&self, _: &str, _: &str) -> Result<()> {
        Err(RateLimitError::Application("channel cannot be closed".into()))
    }

    fn on_chan_close_confirm(&self, _: &str, _: &str) -> Result<()> {
        self.handshake_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_recv_packet(&self, _packet: &Packet, _relayer: &str) -> Acknowledgement {
        self.recv_calls.fetch_add(1, Ordering::SeqCst);
        self.recv_ack.lock().unwrap().clone()
    }

    fn on_acknowledgement_packet(&self, packet: &Packet, ack: &[u8], _: &str) -> Result<()> {
        self.ack_calls.fetch_add(1, Ordering::SeqCst);
        if is_ack_error(ack) {
            self.refund(packet)?;
        }
        Ok(())
    }

    fn on_timeout_packet(&self, packet: &Packet, _: &str) -> Result<()> {
        self.timeout_calls.fetch_add(1, Ordering::SeqCst);
        self.refund(packet)
    }
}

/// Channel layer that assigns sequences and keeps committed packets.
pub struct MockChannel {
    next_sequence: AtomicU64,
    pub sent: Mutex<Vec<Packet>>,
    pub acks_written: AtomicUsize,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self {
            next_sequence: AtomicU64::new(1),
            sent: Mutex::new(Vec::new()),
            acks_written: AtomicUsize::new(0),
        }
    }
}

impl Ics4Wrapper for MockChannel {
    fn send_packet(
        &self,
        _capability: ChannelCapability,
        source_port: &str,
        source_channel: &str,
        timeout_height: TimeoutHeight,
        timeout_timestamp: u64,
        data: Bytes,
    ) -> Result<u64> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Packet::new(
            data,
            sequence,
            source_port,
            source_channel,
            "transfer",
            COUNTERPARTY,
            timeout_height,
            timeout_timestamp,
        ));
        Ok(sequence)
    }

    fn write_acknowledgement(&self, _: ChannelCapability, _: &Packet, _: &Acknowledgement) -> Result<()> {
        self.acks_written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_app_version(&self, port_id: &str, _channel_id: &str) -> Option<String> {
        (port_id == "transfer").then(|| "ics20-1".to_string())
    }
}

/// Middleware wired over mocks and the in-memory quota contract.
pub struct Harness {
    pub bank: Arc<Bank>,
    pub app: Arc<MockTransferApp>,
    pub channel: Arc<MockChannel>,
    pub contract: Arc<QuotaContract>,
    pub keeper: Arc<RateLimitKeeper>,
    pub events: Arc<EventLog>,
    pub middleware: RateLimitMiddleware,
}

impl Harness {
    /// Quota on `CHANNEL`/`DENOM`; `configured` decides whether params point at it.
    pub fn new(configured: bool, max_send: u128, max_recv: u128) -> Self {
        Self::with_classifier(configured, max_send, max_recv, AckClassifier::default())
    }

    pub fn with_classifier(
        configured: bool,
        max_send: u128,
        max_recv: u128,
        classifier: AckClassifier,
    ) -> Self {
        let bank = Arc::new(Bank::default());
        bank.fund(ALICE, 1_000);

        let contract = Arc::new(
            QuotaContract::new(
                ContractAddress::parse(CONTRACT).unwrap(),
                &[QuotaSpec {
                    channel_id: CHANNEL.into(),
                    denom: DENOM.into(),
                    max_send: max_send.to_string(),
                    max_recv: max_recv.to_string(),
                }],
            )
            .unwrap(),
        );
        let events = Arc::new(EventLog::new());
        let params = if configured {
            Params::new(CONTRACT)
        } else {
            Params::default()
        };
        let keeper = Arc::new(RateLimitKeeper::new(
            Arc::new(MemoryParamStore::new(params)),
            contract.clone(),
            events.clone(),
            GOV,
        ));
        let app = Arc::new(MockTransferApp::new(bank.clone()));
        let channel = Arc::new(MockChannel::default());
        let middleware =
            RateLimitMiddleware::new(app.clone(), channel.clone(), keeper.clone(), events.clone())
                .with_classifier(classifier);

        Self {
            bank,
            app,
            channel,
            contract,
            keeper,
            events,
            middleware,
        }
    }

    /// ICS-20 style send: the packet goes out first and escrow moves only if
    /// the send succeeded, which matches an aborted transaction on error.
    pub fn transfer(&self, sender: &str, amount: u128) -> Result<u64> {
        if self.bank.balance(sender) < amount {
            return Err(RateLimitError::Application("insufficient funds".into()));
        }
        let data = FungibleTokenPacketData::new(DENOM, amount.to_string(), sender, "osmo1bob");
        let sequence = self.middleware.send_packet(
            ChannelCapability(1),
            "transfer",
            CHANNEL,
            Height::new(1, 100).into(),
            0,
            data.to_bytes(),
        )?;
        self.bank.move_funds(sender, ESCROW, amount)?;
        Ok(sequence)
    }

    pub fn sent(&self, sequence: u64) -> Packet {
        self.channel
            .sent
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.sequence == sequence)
            .cloned()
            .expect("packet was sent")
    }

    pub fn used_out(&self) -> u128 {
        self.contract.flow(CHANNEL, DENOM).used_out
    }

    pub fn used_in(&self) -> u128 {
        self.contract.flow(CHANNEL, DENOM).used_in
    }
}

/// Inbound transfer arriving on `CHANNEL`.
pub fn incoming(amount: u128, receiver: &str) -> Packet {
    let data = FungibleTokenPacketData::new(DENOM, amount.to_string(), "osmo1bob", receiver);
    Packet::new(
        data.to_bytes(),
        1,
        "transfer",
        COUNTERPARTY,
        "transfer",
        CHANNEL,
        Height::new(1, 100),
        0,
    )
}

pub fn error_ack(msg: &str) -> Bytes {
    Acknowledgement::Error(msg.to_string()).to_bytes()
}
