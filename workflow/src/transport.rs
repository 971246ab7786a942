//! Transport seam.
//!
//! The engine only needs two things from the host transport: fire a string
//! at a path, and receive everything that arrives on a path. Delivery and
//! ordering are whatever the host provides.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Send rejected: {0}")]
    Rejected(String),
}

/// Everything arriving on one path, in arrival order.
///
/// Lazy and non-restartable: once `next` returns `None` the transport is gone.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    inbox: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    /// Creates a subscription and the sender that feeds it
    pub fn channel(path: impl Into<String>) -> (mpsc::UnboundedSender<String>, Self) {
        let (sender, inbox) = mpsc::unbounded_channel();
        let subscription = Self {
            path: path.into(),
            inbox,
        };
        (sender, subscription)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Waits for the next message
    pub async fn next(&mut self) -> Option<String> {
        self.inbox.recv().await
    }
}

/// One side of a `path + string` message channel.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends `content` to whoever subscribes to `path` on the other side
    async fn send(&self, path: &str, content: String) -> Result<(), TransportError>;

    /// Starts receiving what the other side sends to `path`
    fn subscribe(&self, path: &str) -> Subscription;
}
