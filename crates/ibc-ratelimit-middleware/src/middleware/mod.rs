//! The rate limiting interceptor and the interfaces it composes with.
//!
//! `RateLimitMiddleware` implements both `IbcModule` and `Ics4Wrapper`, so
//! it stacks transparently between the core router and the transfer app.

pub mod app;
pub mod error_ack;
pub mod ibc_middleware;

pub use app::{IbcModule, Ics4Wrapper};
pub use error_ack::new_error_acknowledgement;
pub use ibc_middleware::{RateLimitMiddleware, MODULE_NAME, PLACEHOLDER_SEQUENCE};
