use thiserror::Error;

use crate::amf::AmfError;

/// Unified error type for the gateway client
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("authentication required: no session ticket established")]
    AuthenticationRequired,

    #[error("invalid ticket: {0}")]
    InvalidTicket(String),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("encode error: {0}")]
    Encode(#[from] AmfError),

    #[error("config error: {0}")]
    Config(String),
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, GatewayError>;
