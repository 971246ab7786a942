//! Nested payload encoding

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Caller payload or handler result, already encoded.
///
/// The encoded record travels as a JSON string inside the outer envelope
/// (double encoding), never merged inline. The envelope codec only ever sees
/// an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    /// Encodes a value of the caller's or handler's declared type
    pub fn new<T: Serialize + ?Sized>(data: &T) -> Result<Self, CodecError> {
        serde_json::to_string(data)
            .map(Self)
            .map_err(CodecError::encode)
    }

    /// Wraps text that is already encoded
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Decodes into the declared type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        serde_json::from_str(&self.0).map_err(CodecError::decode)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
