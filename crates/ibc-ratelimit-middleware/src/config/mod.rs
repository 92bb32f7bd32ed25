//! Config loader (strict parsing).

pub mod schema;

use std::fs;

use ibc_ratelimit_core::error::{Result, RateLimitError};

pub use schema::{RateLimitConfig, RateLimitSection};

pub fn load_from_file(path: &str) -> Result<RateLimitConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RateLimitError::InvalidParams(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RateLimitConfig> {
    let cfg: RateLimitConfig = serde_yaml::from_str(s)
        .map_err(|e| RateLimitError::InvalidParams(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
