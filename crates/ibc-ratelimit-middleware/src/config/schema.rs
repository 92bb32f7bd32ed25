use serde::Deserialize;

use ibc_ratelimit_core::error::{Result, RateLimitError};
use ibc_ratelimit_core::protocol::AckFallback;

use crate::contract::QuotaSpec;
use crate::middleware::MODULE_NAME;
use crate::policy::Params;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    pub version: u32,

    pub rate_limit: RateLimitSection,

    /// Quotas for the in-memory reference contract.
    #[serde(default)]
    pub quotas: Vec<QuotaSpec>,
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RateLimitError::InvalidParams(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.rate_limit.validate()?;

        for q in &self.quotas {
            if q.channel_id.is_empty() || q.denom.is_empty() {
                return Err(RateLimitError::InvalidParams(
                    "quotas[].channel_id and quotas[].denom must not be empty".into(),
                ));
            }
            for (field, v) in [("max_send", &q.max_send), ("max_recv", &q.max_recv)] {
                if v.parse::<u128>().is_err() {
                    return Err(RateLimitError::InvalidParams(format!(
                        "quotas[{}/{}].{field} must be an unsigned integer, got {v:?}",
                        q.channel_id, q.denom
                    )));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    /// Empty disables rate limiting.
    #[serde(default)]
    pub contract_address: String,

    /// Governance account allowed to update params.
    pub authority: String,

    #[serde(default)]
    pub unparsable_ack: AckFallback,

    #[serde(default = "default_module_name")]
    pub module_name: String,
}

impl RateLimitSection {
    pub fn validate(&self) -> Result<()> {
        if self.authority.is_empty() {
            return Err(RateLimitError::InvalidParams(
                "rate_limit.authority must not be empty".into(),
            ));
        }
        if self.module_name.is_empty() {
            return Err(RateLimitError::InvalidParams(
                "rate_limit.module_name must not be empty".into(),
            ));
        }
        self.params().validate()
    }

    pub fn params(&self) -> Params {
        Params::new(self.contract_address.clone())
    }
}

fn default_module_name() -> String {
    MODULE_NAME.into()
}
