//! # Workflow
//!
//! Typed, cancellable remote procedure calls over a transport that only knows
//! how to deliver a string to a path.
//!
//! ## Philosophy
//!
//! - **Correlation over connections**: Every call gets a fresh identifier and
//!   a slot in the correlation table before its Request leaves
//! - **Cancellation is advisory**: The caller says it no longer cares; the
//!   handler decides whether to stop, and the call still ends with the
//!   remote side's answer
//! - **One terminal outcome**: A call resolves exactly once; late or
//!   duplicate replies are dropped
//! - **Transport agnostic**: Anything implementing [`Transport`] works; an
//!   in-memory pair is included for tests and demos
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use workflow::{MemoryTransport, Performer, Registry, WorkflowConfig};
//!
//! # async fn demo() -> Result<(), workflow::WorkflowError> {
//! let config = WorkflowConfig::default();
//! let (host, guest) = MemoryTransport::pair();
//!
//! let registry = Registry::new(Arc::new(guest), &config);
//! registry
//!     .register_sync("/double", |n: i64| Ok(n * 2))
//!     .expect("fresh registry");
//!
//! let performer = Performer::new(Arc::new(host), &config);
//! let doubled: i64 = performer.perform("/double", &21).await?;
//! assert_eq!(doubled, 42);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod dispatch;
pub mod error;
pub mod memory;
pub mod performer;
pub mod registry;
pub mod table;
pub mod transport;

pub use config::{ConfigError, WorkflowConfig, DEFAULT_MAX_PENDING};
pub use error::{HandlerError, RegistryError, WorkflowError};
pub use memory::MemoryTransport;
pub use performer::Performer;
pub use registry::Registry;
pub use table::{CorrelationTable, Reply};
pub use transport::{Subscription, Transport, TransportError};

pub use lifecycle::{CancellationReason, CancellationSource, CancellationToken, LifecycleError};
pub use protocol;
