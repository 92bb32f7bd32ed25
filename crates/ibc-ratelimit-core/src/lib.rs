//! ibc-ratelimit core: packet codec, acknowledgement model, and error types.
//!
//! This crate defines the wire-level contract between the rate-limit
//! middleware and the policy engine, plus the error surface shared with the
//! middleware crate. It carries no host or runtime dependencies so the same
//! codec can back a chain integration, a simulator, or engine-side tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible
//! path surfaces as `RateLimitError` so a malformed packet from a
//! counterparty cannot crash the host.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, RateLimitError, Result};
