use std::sync::Arc;

use ibc_ratelimit_core::error::{Result, RateLimitError};
use ibc_ratelimit_core::protocol::{build_engine_message, build_undo_send_message, Operation, Packet};

use crate::contract::{ContractAddress, PolicyContract};
use crate::obs::{Event, EventSink};

use super::params::{ParamStore, Params};

/// Orchestrates admission checks and compensating reverts.
///
/// Construct once at startup, then share via Arc. Quota accounting happens
/// inside the policy contract; this type only decides whether to ask.
pub struct RateLimitKeeper {
    params: Arc<dyn ParamStore>,
    contract: Arc<dyn PolicyContract>,
    events: Arc<dyn EventSink>,
    /// Account allowed to change params (governance).
    authority: String,
}

impl RateLimitKeeper {
    pub fn new(
        params: Arc<dyn ParamStore>,
        contract: Arc<dyn PolicyContract>,
        events: Arc<dyn EventSink>,
        authority: impl Into<String>,
    ) -> Self {
        Self {
            params,
            contract,
            events,
            authority: authority.into(),
        }
    }

    pub fn get_params(&self) -> Params {
        self.params.get()
    }

    /// Validate and store params. No authority check; callers gate access.
    pub fn set_params(&self, params: Params) -> Result<()> {
        params.validate()?;
        self.params.set(params);
        Ok(())
    }

    /// Governance update path.
    pub fn update_params(&self, authority: &str, params: Params) -> Result<()> {
        if authority != self.authority {
            return Err(RateLimitError::Unauthorized(format!(
                "expected {} got {authority}",
                self.authority
            )));
        }
        self.set_params(params)?;
        tracing::info!(
            contract = %self.get_contract_address(),
            "rate limit params updated"
        );
        self.events.emit(Event::params_updated());
        Ok(())
    }

    pub fn get_contract_address(&self) -> String {
        self.get_params().contract_address
    }

    /// True iff a contract address is set.
    pub fn is_contract_configured(&self) -> bool {
        !self.get_contract_address().is_empty()
    }

    fn contract_address(&self) -> Result<ContractAddress> {
        ContractAddress::parse(&self.get_contract_address())
    }

    /// Ask the contract to admit `packet` for `op` and record its usage.
    ///
    /// Any contract failure is a rejection and surfaces as `RateLimitExceeded`.
    pub fn check_and_update_rate_limits(&self, op: Operation, packet: &Packet) -> Result<()> {
        let address = self.contract_address()?;
        let msg = build_engine_message(op, packet)?;

        match self.contract.invoke(&address, &msg) {
            Ok(_) => {
                tracing::debug!(
                    %op,
                    src = %packet.source_channel,
                    dst = %packet.destination_channel,
                    "rate limit check passed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    %op,
                    src = %packet.source_channel,
                    dst = %packet.destination_channel,
                    error = %e,
                    "rate limit check rejected"
                );
                Err(RateLimitError::RateLimitExceeded(e.0))
            }
        }
    }

    /// Return quota consumed by a sent packet.
    ///
    /// The contract tolerates packets it never tracked, so a spurious undo is
    /// harmless.
    pub fn undo_send_rate_limit(&self, address: &ContractAddress, packet: &Packet) -> Result<()> {
        let msg = build_undo_send_message(packet)?;
        self.contract
            .invoke(address, &msg)
            .map(|_| ())
            .map_err(|e| RateLimitError::ContractError(e.0))
    }

    /// Undo a send after an error ack or timeout. No-op when unconfigured.
    pub fn revert_sent_packet(&self, packet: &Packet) -> Result<()> {
        if !self.is_contract_configured() {
            return Ok(());
        }
        let address = self.contract_address()?;
        self.undo_send_rate_limit(&address, packet)
    }
}
