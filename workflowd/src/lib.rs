//! # Workflow Host Daemon
//!
//! Wires a host and a guest together over the in-memory transport and drives
//! a batch of `/greet` calls through the correlation engine.
//!
//! ## Responsibilities
//!
//! The daemon:
//! - Registers `/greet` on the guest and `/host/status` on the host
//! - Issues concurrent calls from the host, optionally cancelling them
//! - Calls back from the guest to the host once the batch settles
//! - Reports each call's terminal outcome
//!
//! ## Non-Responsibilities
//!
//! The daemon does NOT:
//! - Provide a real cross-process transport
//! - Retry failed or cancelled calls

pub mod runtime;

pub use runtime::{
    CallOutcome, Greeting, GreetingResult, HostRuntime, HostRuntimeConfig, HostRuntimeError,
    HostStatus, RunReport,
};
