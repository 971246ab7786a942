//! Error types for callers, handlers and registration

use crate::transport::TransportError;
use lifecycle::LifecycleError;
use protocol::{CallId, CodecError, ErrorKind};
use std::fmt;
use thiserror::Error;

/// The single error type a `perform` caller awaits.
///
/// Remote failures are folded into it alongside local encode, decode and
/// transport failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("No such remote procedure: {0}")]
    InvalidProcedure(String),

    #[error("Remote call cancelled")]
    Cancelled,

    #[error("Remote {kind} error: {message}")]
    Remote { kind: ErrorKind, message: String },

    #[error("Too many pending calls (limit {0})")]
    TooManyPending(usize),

    #[error("Call {0} is already outstanding")]
    DuplicateCall(CallId),

    #[error("Call {0} was abandoned before it resolved")]
    Abandoned(CallId),
}

impl From<CodecError> for WorkflowError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Encode(message) => WorkflowError::Encode(message),
            CodecError::Decode(message) => WorkflowError::Decode(message),
        }
    }
}

/// How a handler execution ends when it does not produce a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler observed cancellation and stopped
    #[error("Handler cancelled")]
    Cancelled,

    /// Domain error; the message reaches the caller verbatim
    #[error("{0}")]
    Runtime(String),
}

impl HandlerError {
    pub fn runtime(err: impl fmt::Display) -> Self {
        HandlerError::Runtime(err.to_string())
    }
}

impl From<LifecycleError> for HandlerError {
    fn from(_: LifecycleError) -> Self {
        HandlerError::Cancelled
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::Runtime(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::Runtime(message.to_string())
    }
}

/// Error types for registry operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Procedure already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Procedure not registered: {0}")]
    NotFound(String),
}
