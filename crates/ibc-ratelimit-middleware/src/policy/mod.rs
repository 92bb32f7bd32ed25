//! Policy layer: params keeper and the rate limit engine.
//!
//! The engine holds no quota state of its own. It resolves the configured
//! contract, encodes the packet, and lets the contract decide.

pub mod engine;
pub mod params;

pub use engine::RateLimitKeeper;
pub use params::{MemoryParamStore, ParamStore, Params};
