//! Policy engine envelopes and the packet codec that produces them.
//!
//! Wire format (a hard contract with the engine):
//! - `{"send_packet": {"packet": <UnwrappedPacket>}}`
//! - `{"recv_packet": {"packet": <UnwrappedPacket>}}`
//! - `{"undo_send":   {"packet": <UnwrappedPacket>}}`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RateLimitError};
use crate::protocol::packet::{FungibleTokenPacketData, Height, Packet, TimeoutHeight};

/// Receivers at or above this many bytes are rejected before admission.
pub const MAX_RECEIVER_LEN: usize = 4096;

/// Admission operation checked against the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SendPacket,
    RecvPacket,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::SendPacket => "send_packet",
            Operation::RecvPacket => "recv_packet",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = RateLimitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "send_packet" => Ok(Operation::SendPacket),
            "recv_packet" => Ok(Operation::RecvPacket),
            other => Err(RateLimitError::BadMessage(format!(
                "unsupported operation: {other}"
            ))),
        }
    }
}

/// Canonical decomposition of a transfer packet, as the engine sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwrappedPacket {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    pub data: FungibleTokenPacketData,
    pub timeout_height: Height,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout_timestamp: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Envelope body shared by all three variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMsg {
    pub packet: UnwrappedPacket,
}

/// Closed set of messages sent to the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMsg {
    SendPacket(PacketMsg),
    RecvPacket(PacketMsg),
    UndoSend(PacketMsg),
}

impl EngineMsg {
    pub fn packet(&self) -> &UnwrappedPacket {
        match self {
            EngineMsg::SendPacket(m) | EngineMsg::RecvPacket(m) | EngineMsg::UndoSend(m) => {
                &m.packet
            }
        }
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RateLimitError::BadMessage(format!("encode engine message: {e}")))
    }
}

fn decode_transfer_data(packet: &Packet) -> Result<FungibleTokenPacketData> {
    serde_json::from_slice(&packet.data)
        .map_err(|e| RateLimitError::BadMessage(format!("invalid transfer packet data: {e}")))
}

/// Decode a packet into its canonical record.
///
/// Fails with `BadMessage` if the packet is absent, the payload isn't a
/// token-transfer structure, or the timeout height is not concrete.
pub fn unwrap_packet(packet: Option<&Packet>) -> Result<UnwrappedPacket> {
    let packet = packet.ok_or_else(|| RateLimitError::BadMessage("packet is nil".into()))?;

    let data = decode_transfer_data(packet)?;

    let timeout_height = match &packet.timeout_height {
        TimeoutHeight::Concrete(h) => *h,
        TimeoutHeight::Foreign { client_type } => {
            return Err(RateLimitError::BadMessage(format!(
                "bad timeout height: unsupported height type from client {client_type}"
            )));
        }
    };

    Ok(UnwrappedPacket {
        sequence: packet.sequence,
        source_port: packet.source_port.clone(),
        source_channel: packet.source_channel.clone(),
        destination_port: packet.destination_port.clone(),
        destination_channel: packet.destination_channel.clone(),
        data,
        timeout_height,
        timeout_timestamp: packet.timeout_timestamp,
    })
}

/// Unwrap and serialize into the admission envelope for `op`.
pub fn build_engine_message(op: Operation, packet: &Packet) -> Result<Vec<u8>> {
    let msg = PacketMsg {
        packet: unwrap_packet(Some(packet))?,
    };
    let env = match op {
        Operation::SendPacket => EngineMsg::SendPacket(msg),
        Operation::RecvPacket => EngineMsg::RecvPacket(msg),
    };
    env.to_vec()
}

/// Unwrap and serialize into the `undo_send` envelope.
pub fn build_undo_send_message(packet: &Packet) -> Result<Vec<u8>> {
    EngineMsg::UndoSend(PacketMsg {
        packet: unwrap_packet(Some(packet))?,
    })
    .to_vec()
}

/// Reject receivers of `MAX_RECEIVER_LEN` bytes or more.
pub fn validate_receiver_address(packet: &Packet) -> Result<()> {
    let data = decode_transfer_data(packet)?;
    if data.receiver.len() >= MAX_RECEIVER_LEN {
        tracing::debug!(len = data.receiver.len(), "receiver rejected");
        return Err(RateLimitError::BadMessage(format!(
            "receiver address too long. Max: {MAX_RECEIVER_LEN}, Got: {}",
            data.receiver.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn transfer(receiver: &str) -> Packet {
        let data = FungibleTokenPacketData::new("stake", "1000", "cosmos1sender", receiver);
        Packet::new(
            data.to_bytes(),
            7,
            "transfer",
            "channel-0",
            "transfer",
            "channel-1",
            Height::new(10, 100),
            0,
        )
    }

    #[test]
    fn send_envelope_matches_wire_contract() {
        let raw = build_engine_message(Operation::SendPacket, &transfer("cosmos1recv")).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        let p = &v["send_packet"]["packet"];
        assert_eq!(p["sequence"], 7);
        assert_eq!(p["source_channel"], "channel-0");
        assert_eq!(p["destination_channel"], "channel-1");
        assert_eq!(p["data"]["amount"], "1000");
        assert_eq!(p["timeout_height"]["revision_number"], 10);
        assert_eq!(p["timeout_height"]["revision_height"], 100);
        assert!(p.get("timeout_timestamp").is_none());
        assert_eq!(v.as_object().unwrap().len(), 1);
    }

    #[test]
    fn nonzero_timestamp_is_serialized() {
        let mut packet = transfer("r");
        packet.timeout_timestamp = 42;
        let raw = build_undo_send_message(&packet).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(v["undo_send"]["packet"]["timeout_timestamp"], 42);
    }

    #[test]
    fn unknown_operation_is_bad_message() {
        let err = "undo_recv".parse::<Operation>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadMessage);
        assert_eq!("recv_packet".parse::<Operation>().unwrap(), Operation::RecvPacket);
    }

    #[test]
    fn nil_and_foreign_height_fail() {
        assert_eq!(unwrap_packet(None).unwrap_err().code(), ErrorCode::BadMessage);

        let mut packet = transfer("r");
        packet.timeout_height = TimeoutHeight::Foreign {
            client_type: "09-localhost".into(),
        };
        assert_eq!(
            unwrap_packet(Some(&packet)).unwrap_err().code(),
            ErrorCode::BadMessage
        );
    }

    #[test]
    fn receiver_length_boundary() {
        assert!(validate_receiver_address(&transfer(&"a".repeat(4095))).is_ok());
        let err = validate_receiver_address(&transfer(&"a".repeat(4096))).unwrap_err();
        assert!(err.to_string().contains("address too long"));
    }
}
