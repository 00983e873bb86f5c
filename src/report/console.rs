use crate::report::report_model::SuiteReport;
use crate::scenario::scenario_model::CleanupReport;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format a suite report for terminal output.
///
/// Produces output like:
/// ```text
/// === Suite: scenarios ===
///
/// ✓ PASS  Product API/UI reconciliation (4 steps, 3 checks)
/// ✗ FAIL  Price recalculation (5 steps, 1 checks)
///     [FAIL] Step 4: Reconcile: [data-test="main-price-container"]: money x3 (within tolerance): expected 37.50 ± 0.05, actual 37.75
///     [CLEANUP] cleared
///
/// === Results: 1 passed, 1 failed (2 total) ===
/// ```
pub fn format_console_report(report: &SuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Suite: {} ===\n\n", report.suite_name));

    for result in &report.scenario_results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };

        out.push_str(&format!(
            "{}  {} ({} steps, {} checks)\n",
            marker,
            result.scenario_name,
            result.steps_run,
            result.check_results.len()
        ));

        if let Some(ref failed) = result.failed_step {
            let at = failed
                .index
                .map(|i| format!("step {}", i))
                .unwrap_or_else(|| "setup".to_string());
            out.push_str(&format!("    [STOPPED] {}: {}\n", at, failed.label));
        }

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        if !result.passed {
            for cr in result.check_results.iter().filter(|cr| !cr.passed) {
                let detail = cr.message.as_deref().unwrap_or("check failed");
                out.push_str(&format!(
                    "    [FAIL] Step {}: {}: {}\n",
                    cr.step_index,
                    cr.check.name(),
                    detail
                ));
            }
        }

        match &result.cleanup {
            CleanupReport::Failed(e) => out.push_str(&format!("    [CLEANUP FAILED] {}\n", e)),
            CleanupReport::Done(outcome) if !result.passed => {
                out.push_str(&format!("    [CLEANUP] {}\n", outcome));
            }
            _ => {}
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        let secs = ms as f64 / 1000.0;
        out.push_str(&format!(" in {:.1}s", secs));
    }

    out.push_str(" ===\n");

    out
}
