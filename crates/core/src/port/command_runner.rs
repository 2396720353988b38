// Command Runner Port (ADR-002)
// Abstraction for invoking a probe's external command under a time budget

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Captured result of a command that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub exit_code: Option<i32>,
    pub duration_ms: i64,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Short reason for a non-zero exit: first non-blank stderr line, or the
    /// exit status when stderr is silent
    pub fn failure_reason(&self) -> String {
        match self.stderr.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(line) => line.to_string(),
            None => match self.exit_code {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            },
        }
    }
}

/// Exit classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors (command never produced a usable exit)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("process killed: {0}")]
    Killed(String),

    #[error("io error: {0}")]
    IoError(String),
}

/// Command Runner trait
///
/// Implementations:
/// - ShellCommandRunner (infra-system): spawns `sh -c <command>`
/// - MockCommandRunner: scripted outcomes for tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell command line and capture its output
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::Timeout if it runs longer than `timeout`
    /// - ExecutionError::IoError if output capture fails
    ///
    /// A non-zero exit is NOT an error; it is reported through
    /// `ExecutionResult::status`.
    async fn run(
        &self,
        command: &str,
        timeout: Duration,
    ) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Scripted outcome for one command
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with this stdout
        Output(String),
        /// Exit 0 with this stdout after a delay
        Delayed(String, Duration),
        /// Non-zero exit with stderr
        Exit { code: i32, stderr: String },
        /// Process could not be started
        SpawnFail(String),
        /// Report a timeout immediately
        Timeout,
        /// Never finish (for deadline testing)
        Hang,
        /// Panic with message (for isolation testing)
        Panic(String),
    }

    #[derive(Default)]
    struct Counters {
        calls: usize,
        in_flight: usize,
        peak_in_flight: usize,
    }

    /// Mock Command Runner for testing
    pub struct MockCommandRunner {
        scripted: HashMap<String, MockBehavior>,
        fallback: MockBehavior,
        counters: Arc<Mutex<Counters>>,
    }

    impl MockCommandRunner {
        pub fn new(fallback: MockBehavior) -> Self {
            Self {
                scripted: HashMap::new(),
                fallback,
                counters: Arc::new(Mutex::new(Counters::default())),
            }
        }

        /// Every command prints `stdout` and exits 0
        pub fn new_output(stdout: impl Into<String>) -> Self {
            Self::new(MockBehavior::Output(stdout.into()))
        }

        pub fn with(mut self, command: impl Into<String>, behavior: MockBehavior) -> Self {
            self.scripted.insert(command.into(), behavior);
            self
        }

        pub fn call_count(&self) -> usize {
            self.counters.lock().unwrap().calls
        }

        /// Highest number of commands observed running at once
        pub fn peak_in_flight(&self) -> usize {
            self.counters.lock().unwrap().peak_in_flight
        }

        fn enter(&self) {
            let mut counters = self.counters.lock().unwrap();
            counters.calls += 1;
            counters.in_flight += 1;
            counters.peak_in_flight = counters.peak_in_flight.max(counters.in_flight);
        }

        fn leave(&self) {
            self.counters.lock().unwrap().in_flight -= 1;
        }
    }

    fn success(stdout: String) -> ExecutionResult {
        ExecutionResult {
            status: ExecutionStatus::Success,
            exit_code: Some(0),
            duration_ms: 1,
            stdout,
            stderr: String::new(),
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(
            &self,
            command: &str,
            timeout: Duration,
        ) -> Result<ExecutionResult, ExecutionError> {
            let behavior = self
                .scripted
                .get(command)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone());

            self.enter();
            let outcome = match behavior {
                MockBehavior::Output(stdout) => Ok(success(stdout)),
                MockBehavior::Delayed(stdout, delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(success(stdout))
                }
                MockBehavior::Exit { code, stderr } => Ok(ExecutionResult {
                    status: ExecutionStatus::Failed,
                    exit_code: Some(code),
                    duration_ms: 1,
                    stdout: String::new(),
                    stderr,
                }),
                MockBehavior::SpawnFail(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Timeout => Err(ExecutionError::Timeout(timeout.as_millis() as u64)),
                MockBehavior::Hang => std::future::pending().await,
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for isolation testing
                }
            };
            self.leave();
            outcome
        }
    }
}
