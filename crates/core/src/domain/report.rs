// Audit Report Domain Model

use serde::{Deserialize, Serialize};

use super::probe::ProbeResult;

/// Outcome of one audit run, handed by value to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// One entry per registered probe, in registry order
    pub results: Vec<ProbeResult>,
    /// Weighted pass ratio on a 0-100 scale
    pub score: f64,
    /// Per-category breakdown, in order of first appearance
    pub categories: Vec<CategoryScore>,
    pub summary: AuditSummary,
}

impl AuditReport {
    pub fn failed(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// Weighted score restricted to one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub passed: usize,
    pub total: usize,
    pub passed_weight: u64,
    pub total_weight: u64,
    pub score: f64,
}

/// Summary counts of an audit run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

/// `100 * passed / total`, or 0 when nothing carries weight
pub fn weighted_score(passed_weight: u64, total_weight: u64) -> f64 {
    if total_weight == 0 {
        return 0.0;
    }
    100.0 * passed_weight as f64 / total_weight as f64
}
