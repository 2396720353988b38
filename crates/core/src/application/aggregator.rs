// Aggregator - results to report (pure, no I/O)
use std::collections::HashMap;

use crate::domain::report::weighted_score;
use crate::domain::{AuditReport, AuditSummary, CategoryScore, ProbeResult};

/// Build a report from materialized results, preserving their order.
///
/// Score: `100 * sum(weight where passed) / sum(weight)`, 0 for an empty set.
pub fn aggregate(results: Vec<ProbeResult>) -> AuditReport {
    let mut categories: Vec<CategoryScore> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut passed_weight = 0u64;
    let mut total_weight = 0u64;
    let mut passed = 0usize;

    for result in &results {
        let weight = u64::from(result.weight);
        total_weight += weight;
        if result.passed {
            passed_weight += weight;
            passed += 1;
        }

        let slot = *index.entry(result.category.as_str()).or_insert_with(|| {
            categories.push(CategoryScore {
                category: result.category.clone(),
                passed: 0,
                total: 0,
                passed_weight: 0,
                total_weight: 0,
                score: 0.0,
            });
            categories.len() - 1
        });

        let category = &mut categories[slot];
        category.total += 1;
        category.total_weight += weight;
        if result.passed {
            category.passed += 1;
            category.passed_weight += weight;
        }
    }

    for category in &mut categories {
        category.score = weighted_score(category.passed_weight, category.total_weight);
    }

    let summary = AuditSummary {
        total: results.len(),
        passed,
        failed: results.len() - passed,
    };

    AuditReport {
        score: weighted_score(passed_weight, total_weight),
        results,
        categories,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, category: &str, weight: u32, passed: bool) -> ProbeResult {
        ProbeResult {
            id: id.to_string(),
            name: id.to_string(),
            category: category.to_string(),
            passed,
            details: String::new(),
            weight,
        }
    }

    #[test]
    fn test_empty_results_score_zero() {
        let report = aggregate(vec![]);

        assert_eq!(report.score, 0.0);
        assert!(report.categories.is_empty());
        assert_eq!(report.summary, AuditSummary::default());
    }

    #[test]
    fn test_all_passed_is_100_all_failed_is_0() {
        let all_pass = aggregate(vec![
            result("a", "Network", 10, true),
            result("b", "Updates", 5, true),
        ]);
        assert_eq!(all_pass.score, 100.0);

        let all_fail = aggregate(vec![
            result("a", "Network", 10, false),
            result("b", "Updates", 5, false),
        ]);
        assert_eq!(all_fail.score, 0.0);
    }

    #[test]
    fn test_weighted_score_and_order() {
        let report = aggregate(vec![
            result("sip", "System Integrity", 15, true),
            result("gatekeeper", "System Integrity", 12, false),
            result("filevault", "Encryption", 15, true),
            result("firewall", "Network", 10, false),
        ]);

        let ids: Vec<&str> = report.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["sip", "gatekeeper", "filevault", "firewall"]);

        // (15 + 15) / 52
        assert!((report.score - 57.692).abs() < 0.001);
        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.failed().count(), 2);
    }

    #[test]
    fn test_category_breakdown() {
        let report = aggregate(vec![
            result("firewall", "Network", 10, true),
            result("sip", "System Integrity", 15, true),
            result("stealth", "Network", 8, false),
        ]);

        let names: Vec<&str> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Network", "System Integrity"]);

        let network = report.category("Network").unwrap();
        assert_eq!(network.total, 2);
        assert_eq!(network.passed, 1);
        assert_eq!(network.total_weight, 18);
        assert!((network.score - 55.555).abs() < 0.001);

        assert_eq!(report.category("System Integrity").unwrap().score, 100.0);
        assert!(report.category("Encryption").is_none());
    }

    #[test]
    fn test_score_always_within_bounds() {
        for mask in 0u32..64 {
            let results = (0..6)
                .map(|i| result("p", "c", i + 1, mask & (1 << i) != 0))
                .collect();
            let report = aggregate(results);

            assert!((0.0..=100.0).contains(&report.score));
        }
    }
}
