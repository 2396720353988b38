// Probe Domain Model

use serde::{Deserialize, Serialize};

use super::policy::OutputPolicy;

/// Static description of one configuration check.
///
/// Built once when the registry is assembled and never mutated afterwards.
/// The `command` is an opaque shell line (it may carry its own `|| echo ...`
/// fallback); the engine never inspects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub weight: u32,
    pub command: &'static str,
    pub policy: OutputPolicy,
}

impl ProbeDefinition {
    /// Interpret the (already trimmed) command output.
    pub fn interpret(&self, output: &str) -> ProbeVerdict {
        self.policy.interpret(output)
    }
}

/// Pass/fail outcome plus explanatory detail for a single invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeVerdict {
    pub passed: bool,
    pub details: String,
}

impl ProbeVerdict {
    pub fn pass(details: impl Into<String>) -> Self {
        Self {
            passed: true,
            details: details.into(),
        }
    }

    pub fn fail(details: impl Into<String>) -> Self {
        Self {
            passed: false,
            details: details.into(),
        }
    }
}

/// One probe's outcome within an audit run.
///
/// Serialized field order matches the report shape consumed by front ends:
/// `{id, name, category, passed, details, weight}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub id: String,
    pub name: String,
    pub category: String,
    pub passed: bool,
    pub details: String,
    pub weight: u32,
}

impl ProbeResult {
    /// Merge a definition's static fields with a verdict
    pub fn from_verdict(def: &ProbeDefinition, verdict: ProbeVerdict) -> Self {
        Self {
            id: def.id.to_string(),
            name: def.name.to_string(),
            category: def.category.to_string(),
            passed: verdict.passed,
            details: verdict.details,
            weight: def.weight,
        }
    }
}
