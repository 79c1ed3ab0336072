//! Human-readable run summary

use std::fmt::Write;

use switchsim_runtime::RunReport;

/// One line per switch, sorted by name, then the totals
pub fn render(report: &RunReport) -> String {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|outcome| format!("{}: {}", outcome.switch_name, outcome.result))
        .chain(
            report
                .registration_failures
                .iter()
                .map(|name| format!("{}: registration failed", name)),
        )
        .chain(
            report
                .establish_failures
                .iter()
                .map(|name| format!("{}: websocket not established", name)),
        )
        .collect();
    lines.sort();

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    let faults = report.faults().count()
        + report.registration_failures.len()
        + report.establish_failures.len();
    let _ = write!(
        out,
        "{} succeeded, {} closed by gateway, {} failed",
        report.successes(),
        report.graceful_closes(),
        faults
    );
    out
}
