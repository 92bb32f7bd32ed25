//! Packet model and the token-transfer payload it usually carries.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Concrete client height: revision number plus height within that revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Height {
    pub revision_number: u64,
    pub revision_height: u64,
}

impl Height {
    pub fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }
}

/// Timeout height as handed over by the host.
///
/// Light clients other than the standard one may report heights in a layout
/// this crate cannot interpret; those arrive as `Foreign` and cannot be
/// forwarded to the policy engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutHeight {
    Concrete(Height),
    Foreign { client_type: String },
}

impl From<Height> for TimeoutHeight {
    fn from(h: Height) -> Self {
        TimeoutHeight::Concrete(h)
    }
}

/// Packet as delivered by the core router. Lives for one send/recv/ack/timeout round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    /// Opaque application payload.
    pub data: Bytes,
    pub timeout_height: TimeoutHeight,
    pub timeout_timestamp: u64,
}

impl Packet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: impl Into<Bytes>,
        sequence: u64,
        source_port: impl Into<String>,
        source_channel: impl Into<String>,
        destination_port: impl Into<String>,
        destination_channel: impl Into<String>,
        timeout_height: impl Into<TimeoutHeight>,
        timeout_timestamp: u64,
    ) -> Self {
        Self {
            sequence,
            source_port: source_port.into(),
            source_channel: source_channel.into(),
            destination_port: destination_port.into(),
            destination_channel: destination_channel.into(),
            data: data.into(),
            timeout_height: timeout_height.into(),
            timeout_timestamp,
        }
    }

    /// Payload as lossy UTF-8, for events and logs.
    pub fn data_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// ICS-20 fungible token transfer payload.
///
/// Every field defaults when absent so `{}` decodes; semantic checks such as
/// denom validity belong to the transfer application and the policy engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
    #[serde(default)]
    pub denom: String,
    /// Decimal string; may exceed 64 bits.
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
}

impl FungibleTokenPacketData {
    pub fn new(
        denom: impl Into<String>,
        amount: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            memo: String::new(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// JSON bytes as placed in `Packet::data`.
    pub fn to_bytes(&self) -> Bytes {
        // Serializing a struct of plain strings cannot fail.
        Bytes::from(serde_json::to_vec(self).unwrap_or_default())
    }
}
