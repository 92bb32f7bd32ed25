//! Acknowledgement model and the error-ack classifier.
//!
//! Wire shape is the ICS-04 JSON form: `{"result": "<base64>"}` on success,
//! `{"error": "<message>"}` on failure.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RateLimitError};

/// Base64 of the single byte `0x01`, the result ICS-20 writes on success.
pub const SUCCESS_RESULT: &str = "AQ==";

/// Acknowledgement written for a received packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Base64-encoded application result.
    Result(String),
    Error(String),
}

impl Acknowledgement {
    /// Standard ICS-20 success acknowledgement.
    pub fn success() -> Self {
        Acknowledgement::Result(SUCCESS_RESULT.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Acknowledgement::Result(_))
    }

    /// JSON bytes as relayed to the counterparty.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(serde_json::to_vec(self).unwrap_or_default())
    }
}

/// Acknowledgement as received from the counterparty.
///
/// Decoding only checks that the bytes are a JSON object or `null`; the
/// field values are kept untyped so classification decides what they mean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceivedAck {
    result: Option<Value>,
    error: Option<Value>,
}

impl ReceivedAck {
    /// The `error` field, if it is a string.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().and_then(Value::as_str)
    }

    /// Absent, or an empty string.
    fn error_is_blank(&self) -> bool {
        match &self.error {
            None => true,
            Some(v) => v.as_str() == Some(""),
        }
    }

    fn has_result(&self) -> bool {
        self.result.is_some()
    }
}

/// Decode acknowledgement bytes received in `OnAcknowledgementPacket`.
///
/// Bytes that are not JSON, or are JSON but not an object or `null`, mean the
/// counterparty is not speaking the protocol and surface as `UnknownRequest`.
/// Unknown fields and oddly typed values are accepted.
pub fn decode_acknowledgement(bytes: &[u8]) -> Result<ReceivedAck> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        RateLimitError::UnknownRequest(format!(
            "cannot unmarshal ICS-20 transfer packet acknowledgement: {e}"
        ))
    })?;
    match value {
        Value::Null => Ok(ReceivedAck::default()),
        Value::Object(mut fields) => {
            let mut take = |k: &str| fields.remove(k).filter(|v| !v.is_null());
            Ok(ReceivedAck {
                result: take("result"),
                error: take("error"),
            })
        }
        other => Err(RateLimitError::UnknownRequest(format!(
            "cannot unmarshal ICS-20 transfer packet acknowledgement: expected object, got {other}"
        ))),
    }
}

/// How the classifier treats acknowledgements that are neither a clear
/// error (`{"error": "<non-empty>"}`) nor a clear success (`result` present
/// without an error), including bytes that don't decode at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckFallback {
    /// Ambiguous acks count as success; only a clear error reverts.
    #[default]
    #[serde(rename = "success")]
    TreatAsSuccess,
    /// Ambiguous acks count as errors; only a clear success keeps quota used.
    #[serde(rename = "error")]
    TreatAsError,
}

/// Decides whether an acknowledgement represents a failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AckClassifier {
    unparsable: AckFallback,
}

impl AckClassifier {
    pub fn new(unparsable: AckFallback) -> Self {
        Self { unparsable }
    }

    /// Classify an already decoded acknowledgement.
    pub fn classify(&self, ack: &ReceivedAck) -> bool {
        match self.unparsable {
            AckFallback::TreatAsSuccess => ack.error_message().is_some_and(|e| !e.is_empty()),
            AckFallback::TreatAsError => !(ack.has_result() && ack.error_is_blank()),
        }
    }

    /// Whether `bytes` should be handled as an error acknowledgement.
    ///
    /// With the default fallback this is true iff the bytes decode as
    /// `{"error": "<non-empty>"}`; it never fails.
    pub fn is_ack_error(&self, bytes: &[u8]) -> bool {
        match decode_acknowledgement(bytes) {
            Ok(ack) => self.classify(&ack),
            Err(_) => self.unparsable == AckFallback::TreatAsError,
        }
    }
}

/// Classifier with the success-biased default.
pub fn is_ack_error(bytes: &[u8]) -> bool {
    AckClassifier::default().is_ack_error(bytes)
}
