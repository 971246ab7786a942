//! Cancellation propagation tests
//!
//! Validates that a caller's cancellation reaches the running handler exactly
//! once and that the call still ends with a single terminal outcome.

use std::sync::Arc;
use std::time::Duration;
use workflow::{
    CancellationReason, CancellationSource, CancellationToken, HandlerError, MemoryTransport,
    Performer, Registry, WorkflowConfig, WorkflowError,
};

const CANCELLATION_PATH: &str = "/workflow/cancellation";

fn connect(
    config: &WorkflowConfig,
) -> (
    Performer<MemoryTransport>,
    Registry<MemoryTransport>,
    Arc<MemoryTransport>,
) {
    let (host, guest) = MemoryTransport::pair();
    let host = Arc::new(host);
    let performer = Performer::new(Arc::clone(&host), config);
    let registry = Registry::new(Arc::new(guest), config);
    (performer, registry, host)
}

/// Cancels `source` as soon as the registry has started a handler
async fn cancel_once_running(registry: &Registry<MemoryTransport>, source: &CancellationSource) {
    while registry.in_flight() == 0 {
        tokio::task::yield_now().await;
    }
    source.cancel(CancellationReason::Requested);
}

#[tokio::test]
async fn test_cooperative_handler_ends_with_cancelled_failure() {
    let config = WorkflowConfig::default();
    let (performer, registry, host) = connect(&config);
    registry
        .register("/sleep", |millis: u64, token: CancellationToken| async move {
            tokio::select! {
                _ = token.cancelled() => Err(HandlerError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(millis)) => Ok(millis),
            }
        })
        .expect("Failed to register /sleep");

    let source = CancellationSource::new();
    let token = source.token();
    let (result, ()) = tokio::join!(
        performer.perform_with_cancel::<_, u64>("/sleep", &30_000u64, &token),
        cancel_once_running(&registry, &source),
    );

    assert_eq!(result, Err(WorkflowError::Cancelled));
    assert_eq!(host.sent(CANCELLATION_PATH).len(), 1);
    assert_eq!(performer.outstanding(), 0);
    assert_eq!(registry.in_flight(), 0);
}

#[tokio::test]
async fn test_handler_ignoring_cancellation_still_completes() {
    let config = WorkflowConfig::default();
    let (performer, registry, host) = connect(&config);
    registry
        .register("/sleep", |millis: u64, _token: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok::<_, HandlerError>(millis)
        })
        .expect("Failed to register /sleep");

    let source = CancellationSource::new();
    let token = source.token();
    let (result, ()) = tokio::join!(
        performer.perform_with_cancel::<_, u64>("/sleep", &40u64, &token),
        cancel_once_running(&registry, &source),
    );

    assert_eq!(result, Ok(40));
    assert_eq!(host.sent(CANCELLATION_PATH).len(), 1);
}

#[tokio::test]
async fn test_handler_checkpoint_sees_remote_reason() {
    let config = WorkflowConfig::default();
    let (performer, registry, _host) = connect(&config);
    registry
        .register("/steps", |steps: u32, token: CancellationToken| async move {
            for _ in 0..steps {
                token.throw_if_cancelled()?;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok::<_, HandlerError>(format!("{:?}", token.reason()))
        })
        .expect("Failed to register /steps");

    let source = CancellationSource::new();
    let token = source.token();
    let (result, ()) = tokio::join!(
        performer.perform_with_cancel::<_, String>("/steps", &10_000u32, &token),
        cancel_once_running(&registry, &source),
    );

    assert_eq!(result, Err(WorkflowError::Cancelled));
}

#[tokio::test]
async fn test_cancel_before_request_still_sends_one_cancellation() {
    let config = WorkflowConfig::default();
    let (performer, registry, host) = connect(&config);
    registry
        .register_sync("/now", |n: u64| Ok(n))
        .expect("Failed to register /now");

    let source = CancellationSource::new();
    source.cancel(CancellationReason::Requested);

    let result = performer
        .perform_with_cancel::<_, u64>("/now", &7u64, &source.token())
        .await;

    // The immediate handler never looks at the token.
    assert_eq!(result, Ok(7));
    assert_eq!(host.sent(CANCELLATION_PATH).len(), 1);
}

#[tokio::test]
async fn test_resolve_on_cancel_does_not_wait_for_remote() {
    let config = WorkflowConfig {
        resolve_on_cancel: true,
        ..WorkflowConfig::default()
    };
    let (performer, registry, host) = connect(&config);
    registry
        .register("/stubborn", |millis: u64, _token: CancellationToken| async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok::<_, HandlerError>(millis)
        })
        .expect("Failed to register /stubborn");

    let source = CancellationSource::new();
    let token = source.token();
    let (result, ()) = tokio::join!(
        performer.perform_with_cancel::<_, u64>("/stubborn", &50u64, &token),
        cancel_once_running(&registry, &source),
    );

    assert_eq!(result, Err(WorkflowError::Cancelled));
    assert_eq!(performer.outstanding(), 0);
    assert_eq!(host.sent(CANCELLATION_PATH).len(), 1);

    // The handler still finishes; its Completion is dropped on arrival.
    while registry.in_flight() > 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(performer.outstanding(), 0);
}

#[tokio::test]
async fn test_dropping_registry_signals_shutdown() {
    let config = WorkflowConfig::default();
    let (performer, registry, _host) = connect(&config);
    registry
        .register("/wait", |_: (), token: CancellationToken| async move {
            token.cancelled().await;
            match token.reason() {
                Some(CancellationReason::Shutdown) => Err(HandlerError::Cancelled),
                _ => Ok(()),
            }
        })
        .expect("Failed to register /wait");

    let drop_when_running = async move {
        while registry.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        drop(registry);
    };
    let (result, ()) = tokio::join!(performer.perform::<_, ()>("/wait", &()), drop_when_running);

    assert_eq!(result, Err(WorkflowError::Cancelled));
}
