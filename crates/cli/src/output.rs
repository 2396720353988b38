//! Terminal rendering for reports and the probe catalog

use colored::{ColoredString, Colorize};
use tabled::{Table, Tabled};

use aegis_core::domain::{AuditReport, ProbeRegistry};

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Probe")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Weight")]
    weight: u32,
    #[tabled(rename = "Details")]
    details: String,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Passed")]
    passed: String,
    #[tabled(rename = "Score")]
    score: String,
}

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "ID")]
    id: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "Weight")]
    weight: u32,
    #[tabled(rename = "Command")]
    command: &'static str,
}

pub fn print_report(report: &AuditReport) {
    println!("{}", "Security Audit".cyan().bold());
    println!();

    let rows: Vec<ResultRow> = report
        .results
        .iter()
        .map(|r| ResultRow {
            status: status_label(r.passed),
            name: r.name.clone(),
            category: r.category.clone(),
            weight: r.weight,
            details: r.details.clone(),
        })
        .collect();
    println!("{}", Table::new(rows));
    println!();

    let categories: Vec<CategoryRow> = report
        .categories
        .iter()
        .map(|c| CategoryRow {
            category: c.category.clone(),
            passed: format!("{}/{}", c.passed, c.total),
            score: format_score(c.score),
        })
        .collect();
    println!("{}", "By category".cyan().bold());
    println!("{}", Table::new(categories));
    println!();

    println!(
        "  {} {}  ({} passed, {} failed)",
        "Score:".bold(),
        colorize_score(report.score),
        report.summary.passed,
        report.summary.failed
    );
}

pub fn print_registry(registry: &ProbeRegistry) {
    let rows: Vec<ProbeRow> = registry
        .iter()
        .map(|def| ProbeRow {
            id: def.id,
            name: def.name,
            category: def.category,
            weight: def.weight,
            command: def.command,
        })
        .collect();

    println!("{}", format!("{} registered probes", registry.len()).cyan().bold());
    println!("{}", Table::new(rows));
}

fn status_label(passed: bool) -> &'static str {
    if passed {
        "✓ PASS"
    } else {
        "✗ FAIL"
    }
}

fn format_score(score: f64) -> String {
    format!("{:.1}%", score)
}

fn colorize_score(score: f64) -> ColoredString {
    let text = format_score(score);
    if score >= 80.0 {
        text.green().bold()
    } else if score >= 50.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}
