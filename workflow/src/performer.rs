//! Caller side: `perform`.
//!
//! A call parks a one-shot handle in the [`CorrelationTable`] *before* its
//! Request goes out, then waits. The Completion and Failure subscriptions
//! resolve the handle; nothing else does, unless the Performer is configured
//! to resolve cancelled calls locally.

use crate::config::WorkflowConfig;
use crate::dispatch::spawn_dispatch;
use crate::error::WorkflowError;
use crate::table::{CorrelationTable, Reply};
use crate::transport::Transport;
use lifecycle::CancellationToken;
use parking_lot::Mutex;
use protocol::{
    CallId, Cancellation, Completion, EncodedPayload, Envelope, ErrorKind, Failure, Request,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Issues typed calls to the remote Registry and awaits their outcome.
pub struct Performer<T: Transport> {
    transport: Arc<T>,
    table: Arc<CorrelationTable>,
    config: WorkflowConfig,
    dispatchers: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Transport> Performer<T> {
    /// Starts the Completion and Failure subscriptions.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(transport: Arc<T>, config: &WorkflowConfig) -> Self {
        let table = Arc::new(CorrelationTable::new(config.max_pending));

        let completions = {
            let table = Arc::clone(&table);
            spawn_dispatch(transport.as_ref(), &config.paths, move |completion: Completion| {
                tracing::debug!(call_id = %completion.identifier, "completion received");
                table.resolve(&completion.identifier, Reply::Completed(completion.result));
            })
        };
        let failures = {
            let table = Arc::clone(&table);
            spawn_dispatch(transport.as_ref(), &config.paths, move |failure: Failure| {
                tracing::debug!(
                    call_id = %failure.identifier,
                    kind = %failure.error_kind,
                    "failure received"
                );
                table.resolve(
                    &failure.identifier,
                    Reply::Failed {
                        kind: failure.error_kind,
                        message: failure.message,
                    },
                );
            })
        };

        Self {
            transport,
            table,
            config: config.clone(),
            dispatchers: Mutex::new(vec![completions, failures]),
        }
    }

    /// Calls `procedure` on the remote side and waits for its result.
    pub async fn perform<P, R>(&self, procedure: &str, payload: &P) -> Result<R, WorkflowError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.perform_with_cancel(procedure, payload, &CancellationToken::none())
            .await
    }

    /// Like [`perform`](Self::perform), but `cancel` can withdraw interest.
    ///
    /// Cancelling sends one Cancellation to the remote side and keeps
    /// waiting: the call still ends with whatever Completion or Failure the
    /// remote side sends. With `resolve_on_cancel` the call returns
    /// [`WorkflowError::Cancelled`] immediately instead, and a later reply is
    /// dropped.
    pub async fn perform_with_cancel<P, R>(
        &self,
        procedure: &str,
        payload: &P,
        cancel: &CancellationToken,
    ) -> Result<R, WorkflowError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let identifier = CallId::new();
        let mut reply = self.table.insert(identifier.clone())?;
        let _pending = PendingCall {
            table: self.table.as_ref(),
            identifier: identifier.clone(),
        };

        let payload = EncodedPayload::new(payload)?;
        let request = Request::new(identifier.clone(), procedure, payload).encode()?;

        tracing::debug!(call_id = %identifier, procedure, "sending request");
        self.transport
            .send(&self.config.paths.request, request)
            .await?;

        let mut cancel_sent = false;
        let reply = loop {
            tokio::select! {
                reply = &mut reply => break reply,
                _ = cancel.cancelled(), if !cancel_sent => {
                    cancel_sent = true;
                    self.send_cancellation(&identifier).await;
                    if self.config.resolve_on_cancel {
                        return Err(WorkflowError::Cancelled);
                    }
                }
            }
        };

        match reply {
            Ok(reply) => settle(procedure, reply),
            Err(_) => Err(WorkflowError::Abandoned(identifier)),
        }
    }

    async fn send_cancellation(&self, identifier: &CallId) {
        let content = match Cancellation::new(identifier.clone()).encode() {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(call_id = %identifier, error = %err, "could not encode cancellation");
                return;
            }
        };

        tracing::debug!(call_id = %identifier, "sending cancellation");
        if let Err(err) = self
            .transport
            .send(&self.config.paths.cancellation, content)
            .await
        {
            tracing::warn!(call_id = %identifier, error = %err, "cancellation not delivered");
        }
    }

    /// Number of calls still waiting for a reply
    pub fn outstanding(&self) -> usize {
        self.table.len()
    }

    /// Stops both subscriptions and abandons every outstanding call.
    ///
    /// Calls still waiting return [`WorkflowError::Abandoned`]; replies that
    /// arrive afterwards are never read.
    pub fn shutdown(&self) {
        for dispatcher in self.dispatchers.lock().drain(..) {
            dispatcher.abort();
        }
        let abandoned = self.table.clear();
        if abandoned > 0 {
            tracing::debug!(abandoned, "performer shut down with calls outstanding");
        }
    }
}

impl<T: Transport> Drop for Performer<T> {
    fn drop(&mut self) {
        for dispatcher in self.dispatchers.get_mut().iter() {
            dispatcher.abort();
        }
    }
}

/// Takes a call's entry out of the table when its `perform` ends early or is
/// dropped, so the table never outlives interest in the reply.
struct PendingCall<'a> {
    table: &'a CorrelationTable,
    identifier: CallId,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if self.table.remove(&self.identifier) {
            tracing::debug!(call_id = %self.identifier, "call left the table unresolved");
        }
    }
}

/// Maps a remote outcome onto the caller's result type
fn settle<R: DeserializeOwned>(procedure: &str, reply: Reply) -> Result<R, WorkflowError> {
    match reply {
        Reply::Completed(result) => Ok(result.decode()?),
        Reply::Failed {
            kind: ErrorKind::InvalidProcedure,
            ..
        } => Err(WorkflowError::InvalidProcedure(procedure.to_string())),
        Reply::Failed {
            kind: ErrorKind::Cancelled,
            ..
        } => Err(WorkflowError::Cancelled),
        Reply::Failed { kind, message } => Err(WorkflowError::Remote { kind, message }),
    }
}
