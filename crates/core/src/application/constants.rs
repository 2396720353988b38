// Audit constants (ADR: No magic values)
use std::time::Duration;

/// Wall-clock ceiling for a single probe command (8s)
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Maximum probe commands running at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Longest failure excerpt kept in a result's details (characters)
pub const MAX_FAILURE_EXCERPT_CHARS: usize = 200;

/// Prefix of every execution-fault detail string
pub const FAILURE_PREFIX: &str = "Command failed: ";

/// Grace period between SIGTERM and SIGKILL for a timed-out process group
pub const GRACEFUL_KILL_TIMEOUT: Duration = Duration::from_millis(500);

/// Environment variables passed through to probe commands by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG"];
