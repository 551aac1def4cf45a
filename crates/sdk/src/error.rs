use biblestudy_types::{CalendarError, DecodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("RPC error {code}: {message}")]
    RpcResponse { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("Verse lookup failed for '{reference}': {reason}")]
    VerseLookup { reference: String, reason: String },

    #[error("Aggregation failed: {0}")]
    Aggregation(String),
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::SerializationError(err.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
