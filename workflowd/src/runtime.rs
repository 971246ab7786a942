//! # Host Runtime
//!
//! Boots both sides of the bridge and runs one batch of calls.

use lifecycle::{CancellationReason, CancellationSource, CancellationToken};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use workflow::{
    ConfigError, HandlerError, MemoryTransport, Performer, Registry, RegistryError,
    WorkflowConfig, WorkflowError,
};

pub const GREET_PROCEDURE: &str = "/greet";
pub const STATUS_PROCEDURE: &str = "/host/status";

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registration error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Call error: {0}")]
    Call(#[from] WorkflowError),

    #[error("Call task failed: {0}")]
    Task(String),

    #[error("At least one call is required")]
    NoCalls,
}

/// Payload of `/greet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub name: String,
    pub number: i64,
    /// Milliseconds the handler spends before answering
    pub duration: u64,
}

/// Result of `/greet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingResult {
    pub message: String,
    pub processed: i64,
}

/// Result of `/host/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub calls: usize,
    pub cancelled: usize,
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostRuntimeConfig {
    /// Engine configuration shared by both sides
    pub workflow: WorkflowConfig,
    /// Number of concurrent `/greet` calls
    pub calls: usize,
    /// Base handler delay; call `i` waits `delay_ms * (i + 1)`
    pub delay_ms: u64,
    /// Cancel every call this long after the batch starts
    pub cancel_after_ms: Option<u64>,
}

impl Default for HostRuntimeConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowConfig::default(),
            calls: 3,
            delay_ms: 100,
            cancel_after_ms: None,
        }
    }
}

/// Terminal outcome of one `/greet` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Completed(GreetingResult),
    Cancelled,
    Failed(String),
}

impl CallOutcome {
    fn from_result(result: Result<GreetingResult, WorkflowError>) -> Self {
        match result {
            Ok(result) => CallOutcome::Completed(result),
            Err(WorkflowError::Cancelled) => CallOutcome::Cancelled,
            Err(err) => CallOutcome::Failed(err.to_string()),
        }
    }
}

/// What one run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Outcomes in call order
    pub outcomes: Vec<CallOutcome>,
    /// Answer to the guest's call back into the host
    pub status: HostStatus,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CallOutcome::Completed(_)))
            .count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CallOutcome::Cancelled))
            .count()
    }
}

/// Host runtime
pub struct HostRuntime {
    config: HostRuntimeConfig,
}

impl HostRuntime {
    /// Creates a new host runtime
    pub fn new(config: HostRuntimeConfig) -> Result<Self, HostRuntimeError> {
        config.workflow.validate()?;
        if config.calls == 0 {
            return Err(HostRuntimeError::NoCalls);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &HostRuntimeConfig {
        &self.config
    }

    /// Runs one batch. Must be called from within a tokio runtime.
    pub async fn run(&self) -> Result<RunReport, HostRuntimeError> {
        let workflow = &self.config.workflow;
        let (host_end, guest_end) = MemoryTransport::pair();
        let host_end = Arc::new(host_end);
        let guest_end = Arc::new(guest_end);

        let guest_registry = Registry::new(Arc::clone(&guest_end), workflow);
        guest_registry.register(GREET_PROCEDURE, greet)?;

        let host = Arc::new(Performer::new(Arc::clone(&host_end), workflow));
        let source = CancellationSource::new();
        let canceller = self.config.cancel_after_ms.map(|millis| {
            let source = source.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                tracing::info!(after_ms = millis, "cancelling outstanding calls");
                source.cancel(CancellationReason::Requested);
            })
        });

        tracing::info!(calls = self.config.calls, "starting call batch");
        let mut calls = Vec::with_capacity(self.config.calls);
        for index in 0..self.config.calls {
            let host = Arc::clone(&host);
            let token = source.token();
            let greeting = Greeting {
                name: format!("caller-{index}"),
                number: index as i64 + 1,
                duration: self.config.delay_ms * (index as u64 + 1),
            };
            calls.push(tokio::spawn(async move {
                host.perform_with_cancel::<_, GreetingResult>(GREET_PROCEDURE, &greeting, &token)
                    .await
            }));
        }

        let mut outcomes = Vec::with_capacity(calls.len());
        for (index, call) in calls.into_iter().enumerate() {
            let result = call
                .await
                .map_err(|err| HostRuntimeError::Task(err.to_string()))?;
            let outcome = CallOutcome::from_result(result);
            tracing::info!(call = index, outcome = ?outcome, "call settled");
            outcomes.push(outcome);
        }
        if let Some(canceller) = canceller {
            canceller.abort();
        }

        let cancelled = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, CallOutcome::Cancelled))
            .count();
        let status = HostStatus {
            calls: outcomes.len(),
            cancelled,
        };

        // Reverse direction: the guest asks the host how the batch went.
        let host_registry = Registry::new(Arc::clone(&host_end), workflow);
        host_registry.register_sync(STATUS_PROCEDURE, move |_: ()| Ok(status.clone()))?;
        let guest = Performer::new(guest_end, workflow);
        let status: HostStatus = guest.perform(STATUS_PROCEDURE, &()).await?;

        Ok(RunReport { outcomes, status })
    }
}

/// `/greet`: waits `duration` milliseconds unless cancelled first
async fn greet(greeting: Greeting, token: CancellationToken) -> Result<GreetingResult, HandlerError> {
    if greeting.duration > 0 {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!(name = %greeting.name, "greeting cancelled");
                return Err(HandlerError::Cancelled);
            }
            _ = tokio::time::sleep(Duration::from_millis(greeting.duration)) => {}
        }
    }
    Ok(GreetingResult {
        message: format!("Hello {}", greeting.name),
        processed: greeting.number * 3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_calls_rejected() {
        let config = HostRuntimeConfig {
            calls: 0,
            ..HostRuntimeConfig::default()
        };
        assert!(matches!(
            HostRuntime::new(config),
            Err(HostRuntimeError::NoCalls)
        ));
    }

    #[tokio::test]
    async fn test_greet_answers_immediately_without_duration() {
        let greeting = Greeting {
            name: "A".to_string(),
            number: 1,
            duration: 0,
        };
        let result = greet(greeting, CancellationToken::none()).await;
        assert_eq!(
            result,
            Ok(GreetingResult {
                message: "Hello A".to_string(),
                processed: 3,
            })
        );
    }

    #[tokio::test]
    async fn test_greet_stops_when_cancelled() {
        let source = CancellationSource::new();
        source.cancel(CancellationReason::Requested);
        let greeting = Greeting {
            name: "A".to_string(),
            number: 1,
            duration: 60_000,
        };
        assert_eq!(
            greet(greeting, source.token()).await,
            Err(HandlerError::Cancelled)
        );
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(
            CallOutcome::from_result(Err(WorkflowError::Cancelled)),
            CallOutcome::Cancelled
        );
        assert_eq!(
            CallOutcome::from_result(Err(WorkflowError::InvalidProcedure("/x".to_string()))),
            CallOutcome::Failed("No such remote procedure: /x".to_string())
        );
    }
}
