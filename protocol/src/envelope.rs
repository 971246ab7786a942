//! The four wire envelopes.
//!
//! Each envelope is a self-describing JSON record with camelCase field
//! names. Payloads and results are [`EncodedPayload`] strings nested inside
//! the record.

use crate::error::CodecError;
use crate::ids::CallId;
use crate::paths::ChannelPaths;
use crate::payload::EncodedPayload;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the four envelopes a record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    Request,
    Completion,
    Failure,
    Cancellation,
}

impl EnvelopeKind {
    /// The path this kind travels on
    pub fn path_in(self, paths: &ChannelPaths) -> &str {
        match self {
            EnvelopeKind::Request => &paths.request,
            EnvelopeKind::Completion => &paths.completion,
            EnvelopeKind::Failure => &paths.failure,
            EnvelopeKind::Cancellation => &paths.cancellation,
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeKind::Request => write!(f, "request"),
            EnvelopeKind::Completion => write!(f, "completion"),
            EnvelopeKind::Failure => write!(f, "failure"),
            EnvelopeKind::Cancellation => write!(f, "cancellation"),
        }
    }
}

/// Common surface of the wire records.
pub trait Envelope: Serialize + DeserializeOwned {
    const KIND: EnvelopeKind;

    /// The call this record belongs to
    fn identifier(&self) -> &CallId;

    /// Encodes the whole record, or nothing
    fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::encode)
    }

    fn decode(content: &str) -> Result<Self, CodecError> {
        serde_json::from_str(content).map_err(CodecError::decode)
    }
}

/// Invoke `procedure` with `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub identifier: CallId,
    pub procedure: String,
    pub payload: EncodedPayload,
}

impl Request {
    pub fn new(identifier: CallId, procedure: impl Into<String>, payload: EncodedPayload) -> Self {
        Self {
            identifier,
            procedure: procedure.into(),
            payload,
        }
    }
}

impl Envelope for Request {
    const KIND: EnvelopeKind = EnvelopeKind::Request;

    fn identifier(&self) -> &CallId {
        &self.identifier
    }
}

/// The call succeeded with `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub identifier: CallId,
    pub result: EncodedPayload,
}

impl Completion {
    pub fn new(identifier: CallId, result: EncodedPayload) -> Self {
        Self { identifier, result }
    }
}

impl Envelope for Completion {
    const KIND: EnvelopeKind = EnvelopeKind::Completion;

    fn identifier(&self) -> &CallId {
        &self.identifier
    }
}

/// Failure categories carried by a [`Failure`] envelope.
///
/// Kinds this side does not know are kept verbatim in `Other` so the caller
/// can still report them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorKind {
    InvalidProcedure,
    Cancelled,
    Runtime,
    Other(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::InvalidProcedure => "invalidProcedure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Other(kind) => kind.as_str(),
        }
    }
}

impl From<String> for ErrorKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "invalidProcedure" => ErrorKind::InvalidProcedure,
            "cancelled" => ErrorKind::Cancelled,
            "runtime" => ErrorKind::Runtime,
            _ => ErrorKind::Other(kind),
        }
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub identifier: CallId,
    pub error_kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(identifier: CallId, error_kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            identifier,
            error_kind,
            message: message.into(),
        }
    }

    /// No handler is registered under `procedure`
    pub fn invalid_procedure(identifier: CallId, procedure: &str) -> Self {
        Self::new(
            identifier,
            ErrorKind::InvalidProcedure,
            format!("no handler registered for {}", procedure),
        )
    }

    /// The handler stopped through its cancellation path
    pub fn cancelled(identifier: CallId) -> Self {
        Self::new(identifier, ErrorKind::Cancelled, "cancelled")
    }

    /// The handler (or decoding its payload) failed
    pub fn runtime(identifier: CallId, message: impl Into<String>) -> Self {
        Self::new(identifier, ErrorKind::Runtime, message)
    }
}

impl Envelope for Failure {
    const KIND: EnvelopeKind = EnvelopeKind::Failure;

    fn identifier(&self) -> &CallId {
        &self.identifier
    }
}

/// The caller no longer wants the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub identifier: CallId,
}

impl Cancellation {
    pub fn new(identifier: CallId) -> Self {
        Self { identifier }
    }
}

impl Envelope for Cancellation {
    const KIND: EnvelopeKind = EnvelopeKind::Cancellation;

    fn identifier(&self) -> &CallId {
        &self.identifier
    }
}
