//! Host runtime batch tests

use workflow::WorkflowConfig;
use workflowd::{CallOutcome, GreetingResult, HostRuntime, HostRuntimeConfig};

#[tokio::test(start_paused = true)]
async fn test_batch_completes_every_call() {
    let runtime = HostRuntime::new(HostRuntimeConfig {
        calls: 3,
        delay_ms: 10,
        ..HostRuntimeConfig::default()
    })
    .expect("Failed to create runtime");

    let report = runtime.run().await.expect("Run failed");

    assert_eq!(report.completed(), 3);
    assert_eq!(
        report.outcomes[0],
        CallOutcome::Completed(GreetingResult {
            message: "Hello caller-0".to_string(),
            processed: 3,
        })
    );
    assert_eq!(report.status.calls, 3);
    assert_eq!(report.status.cancelled, 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_cancels_slow_calls() {
    let runtime = HostRuntime::new(HostRuntimeConfig {
        calls: 3,
        delay_ms: 100,
        cancel_after_ms: Some(150),
        ..HostRuntimeConfig::default()
    })
    .expect("Failed to create runtime");

    let report = runtime.run().await.expect("Run failed");

    assert!(matches!(report.outcomes[0], CallOutcome::Completed(_)));
    assert_eq!(report.outcomes[1], CallOutcome::Cancelled);
    assert_eq!(report.outcomes[2], CallOutcome::Cancelled);
    assert_eq!(report.status.cancelled, 2);
}

#[tokio::test(start_paused = true)]
async fn test_batch_with_custom_prefix_and_local_resolution() {
    let mut workflow = WorkflowConfig::default();
    workflow.paths = workflow::protocol::ChannelPaths::with_prefix("/bridge/");
    workflow.resolve_on_cancel = true;

    let runtime = HostRuntime::new(HostRuntimeConfig {
        workflow,
        calls: 2,
        delay_ms: 1_000,
        cancel_after_ms: Some(10),
    })
    .expect("Failed to create runtime");

    let report = runtime.run().await.expect("Run failed");

    assert_eq!(report.cancelled(), 2);
    assert_eq!(runtime.config().workflow.paths.request, "/bridge/request");
}
