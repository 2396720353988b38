// Aegis Infrastructure - System Adapters
// Implements: CommandRunner (ADR-002)

pub mod shell_runner;

pub use shell_runner::ShellCommandRunner;
