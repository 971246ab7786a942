//! Callee side: `register` and handler dispatch.
//!
//! Each accepted Request becomes its own task with a [`CancellationSource`]
//! recorded in the in-flight table. A Cancellation only flips that source;
//! the handler decides when (and whether) to stop.

use crate::config::WorkflowConfig;
use crate::dispatch::spawn_dispatch;
use crate::error::{HandlerError, RegistryError};
use crate::transport::Transport;
use lifecycle::{CancellationReason, CancellationSource, CancellationToken};
use parking_lot::{Mutex, RwLock};
use protocol::{
    CallId, Cancellation, ChannelPaths, CodecError, Completion, EncodedPayload, Envelope,
    Failure, Request,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<EncodedPayload, HandlerError>> + Send>>;

/// Decoded call, ready to start; runs the handler's own code when invoked.
type StartHandler = Box<dyn FnOnce(CancellationToken) -> HandlerFuture + Send>;

/// Type-erased handler: decodes the payload up front and defers everything
/// the handler does to [`StartHandler`].
type BoxedHandler =
    Arc<dyn Fn(&EncodedPayload) -> Result<StartHandler, CodecError> + Send + Sync>;

fn erase<P, R, F, Fut>(handler: F) -> BoxedHandler
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(P, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(
        move |payload: &EncodedPayload| -> Result<StartHandler, CodecError> {
            let payload: P = payload.decode()?;
            let handler = Arc::clone(&handler);
            let start: StartHandler = Box::new(move |token: CancellationToken| {
                let work: HandlerFuture = Box::pin(async move {
                    let result = handler(payload, token).await?;
                    EncodedPayload::new(&result).map_err(HandlerError::runtime)
                });
                work
            });
            Ok(start)
        },
    )
}

/// Procedure table plus the state needed to answer Requests.
struct Dispatcher<T: Transport> {
    transport: Arc<T>,
    paths: ChannelPaths,
    handlers: RwLock<HashMap<String, BoxedHandler>>,
    in_flight: Mutex<HashMap<CallId, CancellationSource>>,
}

impl<T: Transport> Dispatcher<T> {
    fn accept(self: &Arc<Self>, request: Request) {
        let Request {
            identifier,
            procedure,
            payload,
        } = request;

        let handler = self.handlers.read().get(&procedure).cloned();
        let Some(handler) = handler else {
            tracing::debug!(call_id = %identifier, procedure = %procedure, "no such procedure");
            self.reply_later(Failure::invalid_procedure(identifier, &procedure));
            return;
        };

        if self.in_flight.lock().contains_key(&identifier) {
            tracing::warn!(call_id = %identifier, "duplicate request for a call in flight; dropped");
            return;
        }

        let start = match handler(&payload) {
            Ok(start) => start,
            Err(err) => {
                tracing::debug!(call_id = %identifier, procedure = %procedure, error = %err, "payload rejected");
                self.reply_later(Failure::runtime(identifier, err.to_string()));
                return;
            }
        };

        let source = CancellationSource::new();
        let token = source.token();
        self.in_flight.lock().insert(identifier.clone(), source);
        tracing::debug!(call_id = %identifier, procedure = %procedure, "handler started");

        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.run(identifier, start, token).await });
    }

    /// Runs the handler in its own task so a panic anywhere in it, including
    /// before its first await, is reported instead of unwinding the dispatch
    /// loop.
    async fn run(self: Arc<Self>, identifier: CallId, start: StartHandler, token: CancellationToken) {
        let outcome = tokio::spawn(async move { start(token).await }).await;
        self.in_flight.lock().remove(&identifier);

        match outcome {
            Ok(Ok(result)) => {
                tracing::debug!(call_id = %identifier, "handler completed");
                self.send(&Completion::new(identifier, result)).await;
            }
            Ok(Err(HandlerError::Cancelled)) => {
                tracing::debug!(call_id = %identifier, "handler cancelled");
                self.send(&Failure::cancelled(identifier)).await;
            }
            Ok(Err(HandlerError::Runtime(message))) => {
                tracing::debug!(call_id = %identifier, error = %message, "handler failed");
                self.send(&Failure::runtime(identifier, message)).await;
            }
            Err(err) if err.is_panic() => {
                tracing::warn!(call_id = %identifier, "handler panicked");
                self.send(&Failure::runtime(identifier, "handler panicked"))
                    .await;
            }
            Err(_) => {
                self.send(&Failure::cancelled(identifier)).await;
            }
        }
    }

    fn signal_cancel(&self, identifier: &CallId) {
        let source = self.in_flight.lock().get(identifier).cloned();
        match source {
            Some(source) => {
                tracing::debug!(call_id = %identifier, "cancelling handler");
                source.cancel(CancellationReason::Remote);
            }
            None => {
                tracing::debug!(call_id = %identifier, "cancellation for unknown call ignored");
            }
        }
    }

    fn reply_later<E: Envelope + Send + Sync + 'static>(self: &Arc<Self>, envelope: E) {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.send(&envelope).await });
    }

    async fn send<E: Envelope>(&self, envelope: &E) {
        let content = match envelope.encode() {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(call_id = %envelope.identifier(), error = %err, "could not encode reply");
                return;
            }
        };
        if let Err(err) = self
            .transport
            .send(E::KIND.path_in(&self.paths), content)
            .await
        {
            tracing::warn!(
                call_id = %envelope.identifier(),
                kind = %E::KIND,
                error = %err,
                "reply not delivered"
            );
        }
    }
}

/// Serves typed handlers to the remote Performer.
pub struct Registry<T: Transport> {
    dispatcher: Arc<Dispatcher<T>>,
    subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Transport> Registry<T> {
    /// Starts the Request and Cancellation subscriptions.
    ///
    /// Must be called from within a tokio runtime. Handlers may be registered
    /// before or after.
    pub fn new(transport: Arc<T>, config: &WorkflowConfig) -> Self {
        let dispatcher = Arc::new(Dispatcher {
            transport,
            paths: config.paths.clone(),
            handlers: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        });

        let requests = {
            let inner = Arc::clone(&dispatcher);
            spawn_dispatch(
                dispatcher.transport.as_ref(),
                &config.paths,
                move |request: Request| inner.accept(request),
            )
        };
        let cancellations = {
            let inner = Arc::clone(&dispatcher);
            spawn_dispatch(
                dispatcher.transport.as_ref(),
                &config.paths,
                move |cancellation: Cancellation| inner.signal_cancel(&cancellation.identifier),
            )
        };

        Self {
            dispatcher,
            subscriptions: Mutex::new(vec![requests, cancellations]),
        }
    }

    /// Registers an async handler that can observe cancellation.
    ///
    /// The handler stops cooperatively: return [`HandlerError::Cancelled`]
    /// (for example via `token.throw_if_cancelled()?`) to report that it
    /// took the cancellation path.
    pub fn register<P, R, F, Fut>(
        &self,
        procedure: impl Into<String>,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.insert(procedure.into(), erase(handler))
    }

    /// Registers a handler that returns immediately and ignores cancellation.
    pub fn register_sync<P, R, F>(
        &self,
        procedure: impl Into<String>,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.register(procedure, move |payload: P, _token| {
            let handler = Arc::clone(&handler);
            async move { handler(payload) }
        })
    }

    fn insert(&self, procedure: String, handler: BoxedHandler) -> Result<(), RegistryError> {
        let mut handlers = self.dispatcher.handlers.write();
        if handlers.contains_key(&procedure) {
            return Err(RegistryError::AlreadyRegistered(procedure));
        }
        tracing::debug!(procedure = %procedure, "procedure registered");
        handlers.insert(procedure, handler);
        Ok(())
    }

    /// Removes a handler; executions already running are unaffected
    pub fn unregister(&self, procedure: &str) -> Result<(), RegistryError> {
        self.dispatcher
            .handlers
            .write()
            .remove(procedure)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(procedure.to_string()))
    }

    pub fn is_registered(&self, procedure: &str) -> bool {
        self.dispatcher.handlers.read().contains_key(procedure)
    }

    /// Registered procedure names, sorted
    pub fn procedures(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dispatcher.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of handler executions currently running
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight.lock().len()
    }

    /// Stops both subscriptions and asks running handlers to stop.
    ///
    /// Handlers that honour the signal still reply with a `cancelled`
    /// Failure.
    pub fn shutdown(&self) {
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.abort();
        }
        self.cancel_in_flight();
    }

    fn cancel_in_flight(&self) {
        let sources: Vec<CancellationSource> =
            self.dispatcher.in_flight.lock().values().cloned().collect();
        for source in sources {
            source.cancel(CancellationReason::Shutdown);
        }
    }
}

impl<T: Transport> Drop for Registry<T> {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().iter() {
            subscription.abort();
        }
        self.cancel_in_flight();
    }
}
