//! Wire-level protocol modules.
//!
//! - `packet`: packet model and the ICS-20 transfer payload.
//! - `envelope`: policy engine envelopes and the packet codec.
//! - `ack`: acknowledgements and the error-ack classifier.
//! - `channel`: handshake types the middleware forwards as-is.
//!
//! All decoders are panic-free: malformed input is reported as
//! `RateLimitError` so a hostile counterparty cannot halt the host.

pub mod ack;
pub mod channel;
pub mod envelope;
pub mod packet;

pub use ack::{
    decode_acknowledgement, is_ack_error, AckClassifier, AckFallback, Acknowledgement, ReceivedAck,
};
pub use envelope::{
    build_engine_message, build_undo_send_message, unwrap_packet, validate_receiver_address,
    EngineMsg, Operation, UnwrappedPacket, MAX_RECEIVER_LEN,
};
pub use packet::{FungibleTokenPacketData, Height, Packet, TimeoutHeight};
