//! Execution-fault containment with real processes

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use aegis_core::application::{AuditOptions, AuditService};
use aegis_core::domain::{OutputPolicy, ProbeDefinition, ProbeRegistry};
use aegis_core::port::time_provider::SystemTimeProvider;
use aegis_infra_system::ShellCommandRunner;

fn probe(id: &'static str, command: &'static str) -> ProbeDefinition {
    ProbeDefinition {
        id,
        name: id,
        category: "Test",
        weight: 1,
        command,
        policy: OutputPolicy::Contains { marker: "enabled" },
    }
}

fn service(probes: Vec<ProbeDefinition>, options: AuditOptions) -> AuditService {
    let time_provider = Arc::new(SystemTimeProvider);
    let runner = Arc::new(ShellCommandRunner::new(
        time_provider.clone(),
        vec!["PATH".to_string()],
    ));
    AuditService::new(
        ProbeRegistry::from_definitions(probes),
        runner,
        time_provider,
        options,
    )
}

#[tokio::test]
async fn test_unrunnable_command_is_contained() {
    let report = service(
        vec![
            probe("before", "echo enabled"),
            probe("missing", "/nonexistent/aegis-tool --status"),
            probe("after", "echo enabled"),
        ],
        AuditOptions::default(),
    )
    .run_audit()
    .await;

    assert_eq!(report.results.len(), 3);
    assert!(report.results[0].passed);
    assert!(report.results[2].passed);

    let missing = &report.results[1];
    assert!(!missing.passed);
    assert!(missing.details.starts_with("Command failed: "));
    assert!(missing.details.contains("/nonexistent/aegis-tool"));
    assert!(!missing.details.contains('\n'));
}

#[tokio::test]
async fn test_only_first_line_of_failure_is_kept() {
    let report = service(
        vec![probe(
            "noisy",
            "printf 'first problem\\nsecond problem\\nthird\\n' >&2; exit 2",
        )],
        AuditOptions::default(),
    )
    .run_audit()
    .await;

    assert_eq!(report.results[0].details, "Command failed: first problem");
}

#[tokio::test]
async fn test_probe_timeout() {
    let options = AuditOptions {
        probe_timeout: Duration::from_millis(200),
        ..AuditOptions::default()
    };
    let started = Instant::now();

    let report = service(
        vec![probe("slow", "sleep 10"), probe("quick", "echo enabled")],
        options,
    )
    .run_audit()
    .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        report.results[0].details,
        "Command failed: timed out after 200ms"
    );
    assert!(report.results[1].passed);
    assert_eq!(report.score, 50.0);
}

#[tokio::test]
async fn test_audit_deadline() {
    let options = AuditOptions {
        probe_timeout: Duration::from_secs(30),
        audit_deadline: Some(Duration::from_millis(300)),
        ..AuditOptions::default()
    };
    let started = Instant::now();

    let report = service(
        vec![probe("quick", "echo enabled"), probe("stuck", "sleep 20")],
        options,
    )
    .run_audit()
    .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.results[0].passed);
    assert_eq!(
        report.results[1].details,
        "Command failed: audit deadline exceeded after 300ms"
    );
}

#[tokio::test]
async fn test_everything_failing_scores_zero() {
    let report = service(
        vec![
            probe("a", "exit 1"),
            probe("b", "/nonexistent/tool"),
            probe("c", "echo disabled"),
        ],
        AuditOptions::default(),
    )
    .run_audit()
    .await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.score, 0.0);
    assert_eq!(report.summary.failed, 3);
}

#[tokio::test]
async fn test_non_utf8_environment_does_not_fail_audit() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    std::env::set_var("AEGIS_NON_UTF8_BYTES", OsStr::from_bytes(&[0x66, 0xff, 0x6f]));
    let report = service(vec![probe("echo", "echo enabled")], AuditOptions::default())
        .run_audit()
        .await;
    std::env::remove_var("AEGIS_NON_UTF8_BYTES");

    assert!(report.results[0].passed, "{}", report.results[0].details);
    assert_eq!(report.score, 100.0);
}
