use crate::{error::Error, scenarios::ScenarioResult, stability::StabilitySummary};
use chrono::Local;
use std::{fmt::Write as _, fs, path::Path, path::PathBuf};

/// Timestamp used in per-run artifact names, e.g. `20260830_141502`.
pub fn run_timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Render scenario results and the stability summary as the run report.
/// Formatting is a reporting concern only; nothing asserts on the layout
/// beyond a few stable markers.
pub fn render_summary(results: &[ScenarioResult], summary: &StabilitySummary) -> String {
    let passed = results.iter().filter(|result| result.passed).count();
    let failed = results.len() - passed;

    let mut out = String::new();
    let _ = writeln!(out, "Pet Store API test summary");
    let _ = writeln!(out, "generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out);
    let _ = writeln!(out, "scenarios: {} passed, {} failed, {} total", passed, failed, results.len());
    let _ = writeln!(out);

    for result in results {
        let marker = if result.passed { "PASS" } else { "FAIL" };
        let _ = writeln!(
            out,
            "[{}] {:9} {} ({:?})",
            marker,
            result.suite.to_string(),
            result.name,
            result.duration
        );
        if let Some(detail) = &result.detail {
            let _ = writeln!(out, "       {}", detail);
        }
    }

    let _ = writeln!(out);
    if summary.is_empty() {
        let _ = writeln!(out, "no calls recorded");
    } else {
        let _ = writeln!(out, "endpoint stability:");
        for (endpoint, stats) in summary.iter() {
            let _ = writeln!(
                out,
                "  {:22} {:3} calls  {:6.1}% success  avg {:.2} attempts  avg {:?}",
                endpoint,
                stats.calls,
                stats.success_rate(),
                stats.avg_attempts(),
                stats.avg_latency()
            );
        }
        let _ = writeln!(
            out,
            "overall: {}/{} successful ({:.1}%)",
            summary.total_successes(),
            summary.total_calls(),
            summary.overall_success_rate()
        );
    }

    out
}

/// Write the report under the given directory, creating it if needed.
/// Returns the path of the written file.
pub fn write_report(reports_dir: &Path, timestamp: &str, content: &str) -> Result<PathBuf, Error> {
    fs::create_dir_all(reports_dir)?;
    let path = reports_dir.join(format!("test_summary_{}.txt", timestamp));
    fs::write(&path, content)?;
    Ok(path)
}
