// Execution Engine - run one probe, never fail
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::constants::{FAILURE_PREFIX, MAX_FAILURE_EXCERPT_CHARS};
use crate::domain::{ProbeDefinition, ProbeResult, ProbeVerdict};
use crate::port::{CommandRunner, TimeProvider};

/// Runs a probe's command and interprets its output.
///
/// Execution faults (spawn failure, non-zero exit, timeout) become failed
/// results; an un-runnable probe counts as a failed control.
pub struct ProbeExecutor {
    runner: Arc<dyn CommandRunner>,
    time_provider: Arc<dyn TimeProvider>,
    timeout: Duration,
}

impl ProbeExecutor {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        time_provider: Arc<dyn TimeProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            time_provider,
            timeout,
        }
    }

    pub async fn run_probe(&self, def: &ProbeDefinition) -> ProbeResult {
        let start_time = self.time_provider.now_millis();

        let verdict = match self.runner.run(def.command, self.timeout).await {
            Ok(output) if output.is_success() => def.interpret(output.stdout.trim()),
            Ok(output) => {
                let reason = output.failure_reason();
                warn!(
                    probe_id = %def.id,
                    exit_code = ?output.exit_code,
                    reason = %reason,
                    "Probe command exited with failure"
                );
                ProbeVerdict::fail(failure_detail(&reason))
            }
            Err(e) => {
                warn!(probe_id = %def.id, error = %e, "Probe command could not run");
                ProbeVerdict::fail(failure_detail(&e.to_string()))
            }
        };

        debug!(
            probe_id = %def.id,
            passed = verdict.passed,
            duration_ms = self.time_provider.now_millis() - start_time,
            "Probe finished"
        );

        ProbeResult::from_verdict(def, verdict)
    }
}

/// `Command failed: <first line>` with the excerpt capped in length
pub fn failure_detail(reason: &str) -> String {
    let first_line = reason
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error");
    let excerpt: String = first_line.chars().take(MAX_FAILURE_EXCERPT_CHARS).collect();

    format!("{}{}", FAILURE_PREFIX, excerpt)
}
