use crate::error::{SuiteError, SuiteResult};
use crate::report::report_model::SuiteReport;

/// Pretty-printed JSON of the whole report, check outcomes included.
pub fn generate_json_report(report: &SuiteReport) -> SuiteResult<String> {
    serde_json::to_string_pretty(report).map_err(|e| SuiteError::JsonSerialize {
        context: "suite report".into(),
        source: e,
    })
}
