// Domain Error Types

use thiserror::Error;

/// Structural faults in a probe registry.
///
/// These are build/test-time invariant violations; a well-formed registry never
/// produces them at run time.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Duplicate probe id: {0}")]
    DuplicateProbeId(String),

    #[error("Probe id must not be empty (probe name: {0})")]
    EmptyProbeId(String),

    #[error("Probe '{0}' has zero weight")]
    ZeroWeight(String),

    #[error("Probe '{0}' has an empty command")]
    EmptyCommand(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
