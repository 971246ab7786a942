//! # Lifecycle
//!
//! Cooperative cancellation primitives shared by callers and handlers.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Cancellation is a signal, never a forced stop
//! - **Cooperative**: Work observes the signal at its own suspension points
//! - **Poll or await**: A token can be checked synchronously or awaited
//!
//! ## Core Concepts
//!
//! - `CancellationToken`: Cloneable handle to check or await cancellation
//! - `CancellationSource`: Controller that can trigger cancellation
//! - `CancellationReason`: Why cancellation occurred

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Reason for cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationReason {
    /// The local caller stopped waiting
    Requested,
    /// A Cancellation arrived from the calling side
    Remote,
    /// The owner of the work is shutting down
    Shutdown,
    /// Custom reason with description
    Custom(String),
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancellationReason::Requested => write!(f, "cancellation requested"),
            CancellationReason::Remote => write!(f, "cancelled by remote caller"),
            CancellationReason::Shutdown => write!(f, "shutting down"),
            CancellationReason::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

type CancellationState = Option<CancellationReason>;

/// A cloneable token that can be checked for cancellation
///
/// CancellationToken is designed to be passed to work that should be
/// cancellable. It's cheap to clone and check, and can be awaited.
///
/// ## Example
///
/// ```
/// use lifecycle::{CancellationSource, CancellationReason};
///
/// let source = CancellationSource::new();
/// let token = source.token();
///
/// assert!(!token.is_cancelled());
///
/// source.cancel(CancellationReason::Remote);
/// assert!(token.is_cancelled());
/// assert_eq!(token.reason(), Some(CancellationReason::Remote));
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: watch::Receiver<CancellationState>,
}

impl CancellationToken {
    /// Creates a new token that is never cancelled
    ///
    /// Useful for operations that don't support cancellation.
    pub fn none() -> Self {
        let (_source, state) = watch::channel(None);
        Self { state }
    }

    /// Checks if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Returns the reason for cancellation, if cancelled
    pub fn reason(&self) -> Option<CancellationReason> {
        self.state.borrow().clone()
    }

    /// Returns an error if cancelled
    pub fn throw_if_cancelled(&self) -> Result<(), LifecycleError> {
        if let Some(reason) = self.reason() {
            Err(LifecycleError::Cancelled { reason })
        } else {
            Ok(())
        }
    }

    /// Completes once cancellation has been requested
    ///
    /// Never completes for a token whose source is gone without having
    /// cancelled (including [`CancellationToken::none`]).
    pub async fn cancelled(&self) {
        let mut state = self.state.clone();
        let source_gone = state.wait_for(|state| state.is_some()).await.is_err();
        if source_gone {
            std::future::pending::<()>().await;
        }
    }
}

/// A controller that can trigger cancellation
///
/// CancellationSource creates tokens and can cancel them all at once.
///
/// ## Example
///
/// ```
/// use lifecycle::{CancellationSource, CancellationReason};
///
/// let source = CancellationSource::new();
/// let token1 = source.token();
/// let token2 = source.token();
///
/// // Both tokens see the same cancellation
/// source.cancel(CancellationReason::Shutdown);
/// assert!(token1.is_cancelled());
/// assert!(token2.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationSource {
    state: Arc<watch::Sender<CancellationState>>,
}

impl CancellationSource {
    /// Creates a new cancellation source
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates a token from this source
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            state: self.state.subscribe(),
        }
    }

    /// Cancels all tokens from this source
    ///
    /// The first reason sticks. Returns `false` if already cancelled.
    pub fn cancel(&self, reason: CancellationReason) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        })
    }

    /// Checks if this source has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().is_some()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors related to lifecycle operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Operation was cancelled: {reason}")]
    Cancelled { reason: CancellationReason },
}
