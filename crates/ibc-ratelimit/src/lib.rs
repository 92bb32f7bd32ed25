//! Top-level facade crate for ibc-ratelimit.
//!
//! Re-exports the wire codec and the middleware stack so hosts can depend on a single crate.

pub mod core {
    pub use ibc_ratelimit_core::*;
}

pub mod middleware {
    pub use ibc_ratelimit_middleware::*;
}
