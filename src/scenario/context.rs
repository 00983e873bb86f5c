use std::collections::HashMap;

use crate::backend::product::ProductRecord;
use crate::browser::network::ExchangeWatch;
use crate::reconcile::model::BackendValue;
use crate::scenario::scenario_model::{CheckResult, Expected};

/// Execution state of one running scenario. Dropped when the scenario ends,
/// together with its record and captures.
#[derive(Debug, Default)]
pub struct ScenarioContext {
    pub check_results: Vec<CheckResult>,

    /// Backend record from the precondition, if any
    pub record: Option<ProductRecord>,

    captures: HashMap<String, String>,

    watches: HashMap<String, ExchangeWatch>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&mut self, result: CheckResult) {
        self.check_results.push(result);
    }

    pub fn capture(&mut self, alias: &str, value: String) {
        self.captures.insert(alias.to_string(), value);
    }

    pub fn captured(&self, alias: &str) -> Option<&str> {
        self.captures.get(alias).map(String::as_str)
    }

    pub fn add_watch(&mut self, alias: &str, watch: ExchangeWatch) {
        self.watches.insert(alias.to_string(), watch);
    }

    /// Watches are consumed by the step that awaits them.
    pub fn take_watch(&mut self, alias: &str) -> Option<ExchangeWatch> {
        self.watches.remove(alias)
    }

    /// Resolve the expected side of a check. Anything unavailable resolves
    /// to `Missing`, which reconciliation reports as a failure.
    pub fn resolve_expected(&self, expected: &Expected) -> BackendValue {
        match expected {
            Expected::Record { field } => self
                .record
                .as_ref()
                .map_or(BackendValue::Missing, |r| r.field(*field)),
            Expected::Literal { value } => BackendValue::Text(value.clone()),
            Expected::Captured { alias } => self
                .captured(alias)
                .map_or(BackendValue::Missing, BackendValue::text),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.check_results.iter().all(|r| r.passed)
    }

    pub fn pass_count(&self) -> usize {
        self.check_results.iter().filter(|r| r.passed).count()
    }

    pub fn fail_count(&self) -> usize {
        self.check_results.iter().filter(|r| !r.passed).count()
    }
}
