//! ibc-ratelimit middleware library entry.
//!
//! This crate wires the param keeper, policy contract capability, rate limit
//! engine, and the packet interceptor into a stack that sits between a
//! chain's core router and its token-transfer application. It is consumed by
//! the replay binary (`main.rs`) and by integration tests.

pub mod config;
pub mod contract;
pub mod middleware;
pub mod obs;
pub mod policy;
pub mod replay;
