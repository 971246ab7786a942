//! Codec errors

use thiserror::Error;

/// Failure to turn a record into its wire string or back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl CodecError {
    pub(crate) fn encode(err: serde_json::Error) -> Self {
        CodecError::Encode(err.to_string())
    }

    pub(crate) fn decode(err: serde_json::Error) -> Self {
        CodecError::Decode(err.to_string())
    }
}
