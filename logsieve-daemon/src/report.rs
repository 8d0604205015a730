//! Human-readable rule source report for `--validate`.

use std::fmt::Write as _;

use logsieve_filter::LoadReport;
use logsieve_filter::rule::SourceOutcome;

/// Render a load report, one block per source in configured order.
pub fn render(report: &LoadReport) -> String {
    let mut out = String::new();

    for source in &report.sources {
        let path = source.path.display();
        match &source.outcome {
            SourceOutcome::Missing => {
                let _ = writeln!(out, "{path}: missing (no rules)");
            }
            SourceOutcome::Loaded { rules, rejected } => {
                let _ = writeln!(
                    out,
                    "{path}: {rules} rule(s), {} rejected",
                    rejected.len()
                );
                for reason in rejected {
                    let _ = writeln!(out, "  - {reason}");
                }
            }
            SourceOutcome::Failed { reason } => {
                let _ = writeln!(out, "{path}: FAILED: {reason}");
            }
        }
    }

    let _ = writeln!(
        out,
        "total: {} rule(s), {} failed source(s), {} rejected record(s)",
        report.rule_set.len(),
        report.failed_sources(),
        report.rejected_records()
    );

    out
}
