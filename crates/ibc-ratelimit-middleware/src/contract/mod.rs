//! Policy contract capability.
//!
//! The engine is opaque: this crate only addresses it and hands it envelope
//! bytes. Quota accounting lives entirely on the other side of `invoke`.

pub mod quota;

use std::fmt;

use thiserror::Error;

use ibc_ratelimit_core::error::{Result, RateLimitError};

pub use quota::{QuotaContract, QuotaSpec};

/// Failure reported by the policy engine. Treated as a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ContractFailure(pub String);

/// Sandboxed policy engine (e.g. a wasm contract), invoked synchronously.
pub trait PolicyContract: Send + Sync {
    /// Execute `msg` against the contract at `address`. Result bytes are not
    /// consumed by the middleware.
    fn invoke(&self, address: &ContractAddress, msg: &[u8]) -> std::result::Result<Vec<u8>, ContractFailure>;
}

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Validated bech32-shaped contract address.
///
/// Shape only: lowercase human-readable part, `1` separator, at least six
/// data characters from the bech32 charset, 8..=90 characters total. The
/// checksum is verified by the host's address codec, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(RateLimitError::ContractError("contract address is empty".into()));
        }
        if !(8..=90).contains(&s.len()) {
            return Err(RateLimitError::ContractError(format!(
                "invalid contract address length {}: {s}",
                s.len()
            )));
        }
        let (hrp, data) = s.rsplit_once('1').ok_or_else(|| {
            RateLimitError::ContractError(format!("contract address has no separator: {s}"))
        })?;
        if hrp.is_empty() || !hrp.bytes().all(|b| (b'!'..=b'~').contains(&b) && !b.is_ascii_uppercase()) {
            return Err(RateLimitError::ContractError(format!(
                "invalid contract address prefix: {s}"
            )));
        }
        if data.len() < 6 || !data.chars().all(|c| BECH32_CHARSET.contains(c)) {
            return Err(RateLimitError::ContractError(format!(
                "invalid contract address data: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
