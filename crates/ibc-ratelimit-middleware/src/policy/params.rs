//! Module params and the store they live in.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use ibc_ratelimit_core::error::{Result, RateLimitError};

use crate::contract::ContractAddress;

/// Rate limit params. An empty address disables rate limiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Params {
    #[serde(default)]
    pub contract_address: String,
}

impl Params {
    pub fn new(contract_address: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.contract_address.is_empty() {
            return Ok(());
        }
        ContractAddress::parse(&self.contract_address)
            .map(|_| ())
            .map_err(|e| RateLimitError::InvalidParams(e.to_string()))
    }
}

/// Read/write access to the single params value.
pub trait ParamStore: Send + Sync {
    fn get(&self) -> Params;
    fn set(&self, params: Params);
}

/// Params held in process memory.
#[derive(Debug, Default)]
pub struct MemoryParamStore {
    inner: RwLock<Params>,
}

impl MemoryParamStore {
    pub fn new(params: Params) -> Self {
        Self {
            inner: RwLock::new(params),
        }
    }
}

impl ParamStore for MemoryParamStore {
    fn get(&self) -> Params {
        // Poisoned lock means a writer panicked mid-update; the value itself
        // is a plain string swap, so reading it is still sound.
        match self.inner.read() {
            Ok(g) => g.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }

    fn set(&self, params: Params) {
        match self.inner.write() {
            Ok(mut g) => *g = params,
            Err(p) => *p.into_inner() = params,
        }
    }
}
