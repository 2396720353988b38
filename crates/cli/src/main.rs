//! Aegis CLI - audit this host's security configuration
//! Composition root: wires the shell runner into the core audit service

mod config;
mod output;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use aegis_core::application::AuditService;
use aegis_core::domain::{ProbeRegistry, UnsetKeyPolicy};
use aegis_core::port::time_provider::SystemTimeProvider;
use aegis_infra_system::ShellCommandRunner;

use crate::config::AegisConfig;

#[derive(Parser)]
#[command(name = "aegis")]
#[command(about = "Host security configuration auditor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: platform config dir, aegis/config.toml)
    #[arg(long, global = true, env = "AEGIS_CONFIG")]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every probe and print the report (default)
    Audit(AuditArgs),

    /// List registered probes
    List,
}

#[derive(Args, Default)]
struct AuditArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Per-probe timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum probes running at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Overall audit deadline in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// How unset configuration keys are judged
    #[arg(long, value_enum)]
    unset_keys: Option<UnsetKeys>,

    /// Exit with status 1 when the score is below this value
    #[arg(long, value_name = "SCORE")]
    fail_under: Option<f64>,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnsetKeys {
    /// Assume the OS default applies (pass)
    AssumeDefault,
    /// Report the control as failed
    Fail,
}

impl From<UnsetKeys> for UnsetKeyPolicy {
    fn from(value: UnsetKeys) -> Self {
        match value {
            UnsetKeys::AssumeDefault => UnsetKeyPolicy::AssumeDefault,
            UnsetKeys::Fail => UnsetKeyPolicy::TreatAsFailure,
        }
    }
}

impl AuditArgs {
    /// Flags win over file and environment values
    fn apply(&self, config: &mut AegisConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.probe_timeout_ms = timeout_ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(deadline_ms) = self.deadline_ms {
            config.audit_deadline_ms = Some(deadline_ms);
        }
        if let Some(unset_keys) = self.unset_keys {
            config.unset_key_policy = unset_keys.into();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init().context("Failed to initialize logging")?;

    let mut config = AegisConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Audit(AuditArgs::default())) {
        Commands::List => {
            output::print_registry(&ProbeRegistry::builtin_with(config.registry_options()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Audit(args) => {
            args.apply(&mut config);
            run_audit(&config, &args).await
        }
    }
}

async fn run_audit(config: &AegisConfig, args: &AuditArgs) -> Result<ExitCode> {
    let options = config.audit_options();
    options.validate()?;

    let time_provider = Arc::new(SystemTimeProvider);
    let runner = Arc::new(ShellCommandRunner::new(
        time_provider.clone(),
        config.env_allowlist.clone(),
    ));
    let service = AuditService::new(
        ProbeRegistry::builtin_with(config.registry_options()),
        runner,
        time_provider,
        options,
    );

    info!(version = aegis_core::VERSION, "Aegis audit starting");
    let report = service.run_audit().await;

    match args.format {
        OutputFormat::Table => output::print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(threshold) = args.fail_under {
        if below_threshold(report.score, threshold) {
            eprintln!(
                "{}",
                format!("✗ Score {:.1} is below {:.1}", report.score, threshold)
                    .red()
                    .bold()
            );
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// A score equal to the threshold passes
fn below_threshold(score: f64, threshold: f64) -> bool {
    score < threshold
}
