// Shell command runner
// reason: async-trait, tokio for async process management (ADR-001)
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use aegis_core::port::command_runner::{
    CommandRunner, ExecutionError, ExecutionResult, ExecutionStatus,
};
use aegis_core::port::TimeProvider;

/// Runs probe commands through the platform shell.
///
/// Each child gets a cleared environment plus the allowlisted variables
/// (ADR-040), its own process group, and is killed when its handle is
/// dropped, so a timed-out probe never outlives its budget.
pub struct ShellCommandRunner {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl ShellCommandRunner {
    /// Create a new shell command runner
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Environment variables passed through to commands (ADR-040)
    ///
    /// # Example
    /// ```ignore
    /// let runner = ShellCommandRunner::new(
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    /// Filter environment variables to allowlist only (ADR-040)
    ///
    /// Values pass through as raw `OsString`s. Non-UTF-8 keys never match.
    fn filter_env<I>(&self, env: I) -> HashMap<OsString, OsString>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        env.into_iter()
            .filter(|(k, _)| {
                k.to_str()
                    .is_some_and(|key| self.env_allowlist.iter().any(|allowed| allowed == key))
            })
            .collect()
    }

    fn build_command(&self, command: &str) -> Command {
        #[cfg(unix)]
        let mut std_cmd = {
            use std::os::unix::process::CommandExt;

            let mut cmd = std::process::Command::new("sh");
            cmd.arg("-c").arg(command);
            // New group: a timeout can signal the shell's children too
            cmd.process_group(0);
            cmd
        };

        #[cfg(windows)]
        let mut std_cmd = {
            let mut cmd = std::process::Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };

        std_cmd
            .env_clear()
            .envs(self.filter_env(std::env::vars_os()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Spawn child process and wait for output within `budget`
    async fn spawn_and_wait(
        &self,
        command: &str,
        budget: Duration,
    ) -> Result<std::process::Output, ExecutionError> {
        let child = self
            .build_command(command)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))?;
        let mut guard = GroupGuard::new(child.id());

        let waited = timeout(budget, child.wait_with_output()).await;
        let outcome = match waited {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExecutionError::IoError(e.to_string())),
            Err(_) => {
                // The shell itself was killed when its handle dropped;
                // sweep whatever it left in the group.
                if let Some(pid) = guard.pid {
                    if let Err(e) = kill_process_group(pid).await {
                        warn!(pid = pid, error = %e, "Failed to clean up timed-out process group");
                    }
                }
                Err(ExecutionError::Timeout(budget.as_millis() as u64))
            }
        };

        guard.disarm();
        outcome
    }

    /// Build execution result from process output
    fn build_result(&self, output: std::process::Output, duration_ms: i64) -> ExecutionResult {
        let status = if output.status.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };

        ExecutionResult {
            status,
            exit_code: output.status.code(),
            duration_ms,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Kills the child's process group if the wait is abandoned midway
/// (e.g. the audit task is aborted at its deadline).
struct GroupGuard {
    pid: Option<u32>,
    armed: bool,
}

impl GroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        #[cfg(unix)]
        if let Some(pid) = self.pid {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            debug!(pgid = pid, "Abandoned probe command, killing its process group");
            let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
        }
    }
}

/// SIGTERM the group, then SIGKILL if it is still around after the grace period (ADR-002)
#[cfg(unix)]
async fn kill_process_group(pid: u32) -> Result<(), ExecutionError> {
    use aegis_core::application::constants::GRACEFUL_KILL_TIMEOUT;
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(pid as i32);

    match killpg(pgid, Signal::SIGTERM) {
        Ok(()) => {}
        // Group already gone
        Err(Errno::ESRCH) => return Ok(()),
        Err(e) => return Err(ExecutionError::Killed(format!("SIGTERM failed: {}", e))),
    }

    let poll = Duration::from_millis(50);
    let mut waited = Duration::ZERO;
    while waited < GRACEFUL_KILL_TIMEOUT {
        tokio::time::sleep(poll).await;
        waited += poll;

        if killpg(pgid, None).is_err() {
            debug!(pgid = pid, "Process group exited after SIGTERM");
            return Ok(());
        }
    }

    warn!(pgid = pid, "Process group did not exit after SIGTERM, sending SIGKILL");
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ExecutionError::Killed(format!("SIGKILL failed: {}", e))),
    }
}

/// kill_on_drop already terminated the direct child
#[cfg(not(unix))]
async fn kill_process_group(_pid: u32) -> Result<(), ExecutionError> {
    Ok(())
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(
        &self,
        command: &str,
        budget: Duration,
    ) -> Result<ExecutionResult, ExecutionError> {
        let start_time = self.time_provider.now_millis();

        debug!(
            command = %command,
            timeout_ms = budget.as_millis() as u64,
            "Starting probe command"
        );

        let output = self.spawn_and_wait(command, budget).await?;
        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(output, duration_ms);

        debug!(
            command = %command,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Probe command completed"
        );

        Ok(result)
    }
}
