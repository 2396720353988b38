// Application Layer - Use Cases

pub mod aggregator;
pub mod audit;
pub mod constants;
pub mod engine;

// Re-exports
pub use aggregator::aggregate;
pub use audit::{AuditOptions, AuditService};
pub use engine::{failure_detail, ProbeExecutor};
