//! # Workflow Protocol
//!
//! This crate defines the wire records exchanged between a caller and a
//! callee over a one-directional `path + string` transport.
//!
//! ## Philosophy
//!
//! - **Correlated, not paired**: The transport has no request/response notion;
//!   every record carries a call identifier instead
//! - **One path per record kind**: Request, Completion, Failure and
//!   Cancellation each travel on their own stable path
//! - **Nested payloads**: Caller payloads and handler results are encoded
//!   records carried as a string field, so the envelope codec never needs the
//!   inner schema
//!
//! ## Records
//!
//! | Envelope       | Direction      | Meaning                          |
//! |----------------|----------------|----------------------------------|
//! | `Request`      | caller → callee | invoke `procedure` with `payload` |
//! | `Completion`   | callee → caller | call succeeded                   |
//! | `Failure`      | callee → caller | call failed                      |
//! | `Cancellation` | caller → callee | caller no longer wants the result |

pub mod envelope;
pub mod error;
pub mod ids;
pub mod paths;
pub mod payload;

pub use envelope::{
    Cancellation, Completion, Envelope, EnvelopeKind, ErrorKind, Failure, Request,
};
pub use error::CodecError;
pub use ids::CallId;
pub use paths::{
    ChannelPaths, CANCELLATION_PATH, COMPLETION_PATH, FAILURE_PATH, REQUEST_PATH,
};
pub use payload::EncodedPayload;
