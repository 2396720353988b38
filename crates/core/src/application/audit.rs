//! Audit Facade - the single "run all checks" operation
//!
//! Every probe runs as its own tokio task (panic isolation), bounded by a
//! semaphore. Results are gathered in registry order at one join point and
//! handed to the aggregator. `run_audit` never fails: execution faults,
//! panics and deadline expiry are all converted to failed results.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::aggregator::aggregate;
use super::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PROBE_TIMEOUT};
use super::engine::{failure_detail, ProbeExecutor};
use crate::domain::{AuditReport, ProbeDefinition, ProbeRegistry, ProbeResult, ProbeVerdict};
use crate::error::{AppError, Result};
use crate::port::{CommandRunner, TimeProvider};

/// Execution knobs for an audit run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditOptions {
    /// Per-probe wall-clock budget
    pub probe_timeout: Duration,
    /// Upper bound on concurrently running probe commands
    pub max_concurrency: usize,
    /// Optional ceiling for the whole run
    pub audit_deadline: Option<Duration>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            audit_deadline: None,
        }
    }
}

impl AuditOptions {
    pub fn validate(&self) -> Result<()> {
        if self.probe_timeout.is_zero() {
            return Err(AppError::Validation(
                "probe timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(AppError::Validation(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        if self.audit_deadline.is_some_and(|d| d.is_zero()) {
            return Err(AppError::Validation(
                "audit deadline must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Audit service: registry + engine + aggregator
pub struct AuditService {
    registry: ProbeRegistry,
    executor: Arc<ProbeExecutor>,
    time_provider: Arc<dyn TimeProvider>,
    options: AuditOptions,
}

impl AuditService {
    pub fn new(
        registry: ProbeRegistry,
        runner: Arc<dyn CommandRunner>,
        time_provider: Arc<dyn TimeProvider>,
        options: AuditOptions,
    ) -> Self {
        let executor = Arc::new(ProbeExecutor::new(
            runner,
            Arc::clone(&time_provider),
            options.probe_timeout,
        ));

        Self {
            registry,
            executor,
            time_provider,
            options,
        }
    }

    /// Run every registered probe and return a fresh report
    pub async fn run_audit(&self) -> AuditReport {
        let start_time = self.time_provider.now_millis();

        info!(
            probes = self.registry.len(),
            max_concurrency = self.options.max_concurrency,
            probe_timeout_ms = self.options.probe_timeout.as_millis() as u64,
            "Starting audit"
        );

        let results = self.execute_all().await;
        let report = aggregate(results);

        info!(
            score = report.score,
            passed = report.summary.passed,
            failed = report.summary.failed,
            duration_ms = self.time_provider.now_millis() - start_time,
            "Audit completed"
        );

        report
    }

    async fn execute_all(&self) -> Vec<ProbeResult> {
        let permits = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let deadline = self
            .options
            .audit_deadline
            .map(|budget| (Instant::now() + budget, budget));

        let handles: Vec<JoinHandle<ProbeResult>> = self
            .registry
            .iter()
            .cloned()
            .map(|def| {
                let executor = Arc::clone(&self.executor);
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    // The semaphore is never closed, so acquisition only waits
                    let _permit = permits.acquire_owned().await.ok();
                    executor.run_probe(&def).await
                })
            })
            .collect();

        let joins = self
            .registry
            .iter()
            .zip(handles)
            .map(|(def, handle)| join_probe(def, handle, deadline));

        join_all(joins).await
    }
}

/// Await one probe task, converting panics and deadline expiry to failures
async fn join_probe(
    def: &ProbeDefinition,
    mut handle: JoinHandle<ProbeResult>,
    deadline: Option<(Instant, Duration)>,
) -> ProbeResult {
    let joined = match deadline {
        Some((at, budget)) => match tokio::time::timeout_at(at, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // Dropping the task drops the runner future, which kills the child
                handle.abort();
                warn!(probe_id = %def.id, "Probe still running at audit deadline");
                let reason = format!("audit deadline exceeded after {}ms", budget.as_millis());
                return ProbeResult::from_verdict(def, ProbeVerdict::fail(failure_detail(&reason)));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(result) => result,
        Err(e) => {
            let reason = if e.is_panic() {
                "probe task panicked"
            } else {
                "probe task cancelled"
            };
            error!(probe_id = %def.id, error = %e, "Probe task did not complete");
            ProbeResult::from_verdict(def, ProbeVerdict::fail(failure_detail(reason)))
        }
    }
}
