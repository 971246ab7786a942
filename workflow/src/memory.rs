//! In-process transport pair.
//!
//! Models a host and a guest connected by a message bridge: a send on one end
//! reaches every live subscriber of the same path on the other end, and never
//! loops back to the sender's own subscribers.
//!
//! Meant for tests and demos: each end remembers its most recent sends so
//! tests can inspect the traffic.

use crate::transport::{Subscription, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

/// How many sends each end remembers; older entries are forgotten first
pub const SENT_LOG_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Mailbox {
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
}

impl Mailbox {
    fn subscribe(&self, path: &str) -> Subscription {
        let (sender, subscription) = Subscription::channel(path);
        self.subscribers
            .lock()
            .entry(path.to_string())
            .or_default()
            .push(sender);
        subscription
    }

    /// Returns how many subscribers received the message
    fn deliver(&self, path: &str, content: &str) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(live) = subscribers.get_mut(path) else {
            return 0;
        };
        live.retain(|sender| sender.send(content.to_string()).is_ok());
        live.len()
    }
}

/// One end of an in-memory transport pair.
#[derive(Debug)]
pub struct MemoryTransport {
    inbox: Arc<Mailbox>,
    peer: Arc<Mailbox>,
    sent: Mutex<VecDeque<(String, String)>>,
    send_failure: Mutex<Option<String>>,
}

impl MemoryTransport {
    /// Creates two connected ends
    pub fn pair() -> (Self, Self) {
        let left = Arc::new(Mailbox::default());
        let right = Arc::new(Mailbox::default());
        let a = Self::new(Arc::clone(&left), Arc::clone(&right));
        let b = Self::new(right, left);
        (a, b)
    }

    fn new(inbox: Arc<Mailbox>, peer: Arc<Mailbox>) -> Self {
        Self {
            inbox,
            peer,
            sent: Mutex::new(VecDeque::new()),
            send_failure: Mutex::new(None),
        }
    }

    /// Recent messages this end sent successfully on `path`, oldest first.
    ///
    /// Only the last [`SENT_LOG_CAPACITY`] sends (on any path) are kept.
    pub fn sent(&self, path: &str) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|(sent_path, _)| sent_path == path)
            .map(|(_, content)| content.clone())
            .collect()
    }

    /// Makes every subsequent send fail with `reason` (or succeed again with `None`)
    pub fn set_send_failure(&self, reason: Option<String>) {
        *self.send_failure.lock() = reason;
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, path: &str, content: String) -> Result<(), TransportError> {
        let failure = self.send_failure.lock().clone();
        if let Some(reason) = failure {
            return Err(TransportError::Rejected(reason));
        }

        let receivers = self.peer.deliver(path, &content);
        if receivers == 0 {
            tracing::debug!(path, "no subscriber on the other side; message dropped");
        }
        let mut sent = self.sent.lock();
        if sent.len() == SENT_LOG_CAPACITY {
            sent.pop_front();
        }
        sent.push_back((path.to_string(), content));
        Ok(())
    }

    fn subscribe(&self, path: &str) -> Subscription {
        self.inbox.subscribe(path)
    }
}
