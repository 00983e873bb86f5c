use crate::report::report_model::SuiteReport;
use crate::scenario::scenario_model::CleanupReport;

// ============================================================================
// JUnit XML reporter: standard CI integration format
// ============================================================================

const CLASSNAME: &str = "storefront-e2e";

/// Generate a JUnit XML report for CI systems.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <testsuite name="..." tests="2" failures="1" time="1.234">
///   <testcase name="Scenario 1" classname="storefront-e2e" time="0.500" />
///   <testcase name="Scenario 2" classname="storefront-e2e" time="0.734">
///     <failure message="1 check(s) failed" type="CheckFailure">
///       Step 3: expected 12.5 rendered 12.75
///     </failure>
///   </testcase>
/// </testsuite>
/// ```
pub fn generate_junit_xml(report: &SuiteReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cases = String::new();
    for result in &report.scenario_results {
        let case_time = result.duration_ms as f64 / 1000.0;

        if result.passed {
            cases.push_str(&format!(
                "  <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\" />\n",
                escape_xml(&result.scenario_name),
                CLASSNAME,
                case_time
            ));
            continue;
        }

        let failed_checks: Vec<String> = result
            .check_results
            .iter()
            .filter(|cr| !cr.passed)
            .map(|cr| {
                let msg = cr.message.as_deref().unwrap_or("check failed");
                format!("Step {}: {}", cr.step_index, msg)
            })
            .collect();

        let failure_count = failed_checks.len();
        let mut body_parts = failed_checks;
        if let Some(e) = &result.error {
            body_parts.push(format!("Error: {}", e));
        }
        if let CleanupReport::Failed(e) = &result.cleanup {
            body_parts.push(format!("Cleanup: {}", e));
        }
        let failure_body = body_parts.join("\n");

        let (failure_message, failure_type) = if failure_count > 0 {
            (format!("{} check(s) failed", failure_count), "CheckFailure")
        } else if result.error.is_some() {
            ("execution error".to_string(), "ExecutionError")
        } else {
            ("cleanup failed".to_string(), "CleanupFailure")
        };

        cases.push_str(&format!(
            "  <testcase name=\"{name}\" classname=\"{class}\" time=\"{time:.3}\">\n    <failure message=\"{message}\" type=\"{kind}\">{body}</failure>\n  </testcase>\n",
            name = escape_xml(&result.scenario_name),
            class = CLASSNAME,
            time = case_time,
            message = escape_xml(&failure_message),
            kind = failure_type,
            body = escape_xml(&failure_body),
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&report.suite_name),
        tests = report.total,
        failures = report.failed,
        time = time_attr,
        cases = cases,
    )
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
