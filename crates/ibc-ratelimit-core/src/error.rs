//! Shared error type across ibc-ratelimit crates.

use thiserror::Error;

/// Stable error codes (operator-facing API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed payload, missing packet, non-concrete height, unsupported operation.
    BadMessage,
    /// Policy engine could not be addressed or invoked.
    ContractError,
    /// Policy engine rejected the transfer.
    RateLimitExceeded,
    /// Counterparty sent bytes that are not an acknowledgement.
    UnknownRequest,
    /// Signer is not the param authority.
    Unauthorized,
    /// Params or config failed validation.
    InvalidParams,
    /// Error raised by the wrapped application or channel layer.
    Application,
}

impl ErrorCode {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadMessage => "BAD_MESSAGE",
            ErrorCode::ContractError => "CONTRACT_ERROR",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::UnknownRequest => "UNKNOWN_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidParams => "INVALID_PARAMS",
            ErrorCode::Application => "APPLICATION",
        }
    }

    /// Numeric code carried inside error acknowledgements.
    pub fn abci_code(self) -> u32 {
        match self {
            ErrorCode::RateLimitExceeded => 2,
            ErrorCode::BadMessage => 3,
            ErrorCode::ContractError => 4,
            ErrorCode::UnknownRequest => 5,
            ErrorCode::Unauthorized => 6,
            ErrorCode::InvalidParams => 7,
            ErrorCode::Application => 8,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Unified error type used by core and middleware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("bad message: {0}")]
    BadMessage(String),
    #[error("contract error: {0}")]
    ContractError(String),
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),
    #[error("unknown request: {0}")]
    UnknownRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("{0}")]
    Application(String),
}

impl RateLimitError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RateLimitError::BadMessage(_) => ErrorCode::BadMessage,
            RateLimitError::ContractError(_) => ErrorCode::ContractError,
            RateLimitError::RateLimitExceeded(_) => ErrorCode::RateLimitExceeded,
            RateLimitError::UnknownRequest(_) => ErrorCode::UnknownRequest,
            RateLimitError::Unauthorized(_) => ErrorCode::Unauthorized,
            RateLimitError::InvalidParams(_) => ErrorCode::InvalidParams,
            RateLimitError::Application(_) => ErrorCode::Application,
        }
    }

    /// Prefix the inner message with `context`, keeping the code.
    pub fn wrap(self, context: &str) -> Self {
        match self {
            RateLimitError::BadMessage(m) => RateLimitError::BadMessage(format!("{context}: {m}")),
            RateLimitError::ContractError(m) => {
                RateLimitError::ContractError(format!("{context}: {m}"))
            }
            RateLimitError::RateLimitExceeded(m) => {
                RateLimitError::RateLimitExceeded(format!("{context}: {m}"))
            }
            RateLimitError::UnknownRequest(m) => {
                RateLimitError::UnknownRequest(format!("{context}: {m}"))
            }
            RateLimitError::Unauthorized(m) => RateLimitError::Unauthorized(format!("{context}: {m}")),
            RateLimitError::InvalidParams(m) => {
                RateLimitError::InvalidParams(format!("{context}: {m}"))
            }
            RateLimitError::Application(m) => RateLimitError::Application(format!("{context}: {m}")),
        }
    }
}
