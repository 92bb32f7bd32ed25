//! In-memory reference policy contract.
//!
//! Absolute per-path quotas with no windowing: a path is a (channel, denom)
//! pair, sends are keyed by source channel and receives by destination
//! channel. Real engines are free to do anything else behind `invoke`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Deserialize;

use ibc_ratelimit_core::error::{Result, RateLimitError};
use ibc_ratelimit_core::protocol::{EngineMsg, UnwrappedPacket};

use super::{ContractAddress, ContractFailure, PolicyContract};

/// Quota for one path, amounts as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaSpec {
    pub channel_id: String,
    pub denom: String,
    pub max_send: String,
    pub max_recv: String,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_send: u128,
    max_recv: u128,
}

/// Usage counters for one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flow {
    pub used_out: u128,
    pub used_in: u128,
}

type PathKey = (String, String);

pub struct QuotaContract {
    address: ContractAddress,
    limits: HashMap<PathKey, Limits>,
    flows: DashMap<PathKey, Flow>,
    invocations: AtomicU64,
}

fn parse_amount(s: &str) -> std::result::Result<u128, String> {
    s.parse::<u128>().map_err(|e| format!("invalid amount {s:?}: {e}"))
}

impl QuotaContract {
    pub fn new(address: ContractAddress, quotas: &[QuotaSpec]) -> Result<Self> {
        let mut limits = HashMap::with_capacity(quotas.len());
        for q in quotas {
            let max_send = parse_amount(&q.max_send).map_err(RateLimitError::InvalidParams)?;
            let max_recv = parse_amount(&q.max_recv).map_err(RateLimitError::InvalidParams)?;
            limits.insert(
                (q.channel_id.clone(), q.denom.clone()),
                Limits { max_send, max_recv },
            );
        }
        Ok(Self {
            address,
            limits,
            flows: DashMap::new(),
            invocations: AtomicU64::new(0),
        })
    }

    pub fn address(&self) -> &ContractAddress {
        &self.address
    }

    /// Current usage of a path (zero if never touched).
    pub fn flow(&self, channel_id: &str, denom: &str) -> Flow {
        self.flows
            .get(&(channel_id.to_string(), denom.to_string()))
            .map(|f| *f.value())
            .unwrap_or_default()
    }

    /// Number of `invoke` calls that reached this contract.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    fn charge(
        &self,
        channel: &str,
        packet: &UnwrappedPacket,
        outbound: bool,
    ) -> std::result::Result<(), String> {
        let key = (channel.to_string(), packet.data.denom.clone());
        let Some(limits) = self.limits.get(&key).copied() else {
            return Ok(());
        };
        let amount = parse_amount(&packet.data.amount)?;

        let mut flow = self.flows.entry(key).or_default();
        let (used, max, dir) = if outbound {
            (&mut flow.used_out, limits.max_send, "send")
        } else {
            (&mut flow.used_in, limits.max_recv, "recv")
        };
        let next = used.saturating_add(amount);
        if next > max {
            return Err(format!(
                "rate limit exceeded: {dir} quota for {channel}/{} used {used} + {amount} > {max}",
                packet.data.denom
            ));
        }
        *used = next;
        Ok(())
    }

    fn undo_send(&self, packet: &UnwrappedPacket) -> std::result::Result<(), String> {
        let key = (packet.source_channel.clone(), packet.data.denom.clone());
        if !self.limits.contains_key(&key) {
            return Ok(());
        }
        let amount = parse_amount(&packet.data.amount)?;
        if let Some(mut flow) = self.flows.get_mut(&key) {
            flow.used_out = flow.used_out.saturating_sub(amount);
        }
        Ok(())
    }
}

impl PolicyContract for QuotaContract {
    fn invoke(
        &self,
        address: &ContractAddress,
        msg: &[u8],
    ) -> std::result::Result<Vec<u8>, ContractFailure> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        if address != &self.address {
            return Err(ContractFailure(format!("no contract at {address}")));
        }
        let msg: EngineMsg = serde_json::from_slice(msg)
            .map_err(|e| ContractFailure(format!("invalid message: {e}")))?;

        let res = match &msg {
            EngineMsg::SendPacket(m) => self.charge(&m.packet.source_channel, &m.packet, true),
            EngineMsg::RecvPacket(m) => {
                self.charge(&m.packet.destination_channel, &m.packet, false)
            }
            EngineMsg::UndoSend(m) => self.undo_send(&m.packet),
        };
        res.map_err(ContractFailure)?;
        Ok(b"{}".to_vec())
    }
}
