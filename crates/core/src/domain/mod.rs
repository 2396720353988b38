// Domain Layer - Pure probe, policy and report types

pub mod error;
pub mod policy;
pub mod probe;
pub mod registry;
pub mod report;

// Re-exports
pub use error::DomainError;
pub use policy::{OutputPolicy, TriStateDetails, UnsetKeyPolicy};
pub use probe::{ProbeDefinition, ProbeResult, ProbeVerdict};
pub use registry::{ProbeRegistry, RegistryOptions};
pub use report::{AuditReport, AuditSummary, CategoryScore};
