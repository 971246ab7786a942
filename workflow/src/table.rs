//! Correlation table: call identifier → suspended caller.
//!
//! Each outstanding `perform` parks a one-shot sender here. Resolution is
//! "remove, then send": the entry leaves the table under the lock, so a second
//! Completion or Failure for the same identifier finds nothing and is dropped.

use crate::error::WorkflowError;
use parking_lot::Mutex;
use protocol::{CallId, EncodedPayload, ErrorKind};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Terminal outcome delivered to a suspended caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Completed(EncodedPayload),
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<CallId, oneshot::Sender<Reply>>>,
    max_pending: usize,
}

impl CorrelationTable {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            max_pending,
        }
    }

    /// Parks a new caller under `identifier`
    pub fn insert(&self, identifier: CallId) -> Result<oneshot::Receiver<Reply>, WorkflowError> {
        let mut pending = self.pending.lock();
        if pending.contains_key(&identifier) {
            return Err(WorkflowError::DuplicateCall(identifier));
        }
        if pending.len() >= self.max_pending {
            tracing::warn!(
                pending_len = pending.len(),
                max_pending = self.max_pending,
                "too many pending calls; refusing new call"
            );
            return Err(WorkflowError::TooManyPending(self.max_pending));
        }

        let (sender, receiver) = oneshot::channel();
        pending.insert(identifier, sender);
        Ok(receiver)
    }

    /// Removes the entry and resumes its caller.
    ///
    /// Returns `false` when no caller is waiting under `identifier` (already
    /// resolved, abandoned or never issued here); the reply is dropped.
    pub fn resolve(&self, identifier: &CallId, reply: Reply) -> bool {
        let waiter = self.pending.lock().remove(identifier);
        match waiter {
            Some(sender) => {
                if sender.send(reply).is_err() {
                    tracing::debug!(call_id = %identifier, "caller went away before its reply arrived");
                }
                true
            }
            None => {
                tracing::debug!(call_id = %identifier, "dropping reply for unknown call");
                false
            }
        }
    }

    /// Removes an entry without resuming it
    pub fn remove(&self, identifier: &CallId) -> bool {
        self.pending.lock().remove(identifier).is_some()
    }

    pub fn contains(&self, identifier: &CallId) -> bool {
        self.pending.lock().contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abandons every outstanding call; returns how many there were
    pub fn clear(&self) -> usize {
        let abandoned: Vec<_> = self.pending.lock().drain().collect();
        abandoned.len()
    }
}
