use serde::{Deserialize, Serialize};

use crate::backend::product::RecordField;
use crate::browser::network::{AwaitedExchange, RoutePattern};
use crate::browser::selector::Selector;
use crate::helpers::cart::CartClearOutcome;
use crate::reconcile::model::ComparisonOutcome;
use crate::reconcile::policy::FieldPolicy;

/// One isolated scenario, deserialized from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSpec {
    /// Human-readable name, unique within a suite
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Backend record fetched before any UI interaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precondition: Option<Precondition>,

    #[serde(default)]
    pub session: SessionMode,

    /// Ordered steps; the first failure aborts the rest
    pub steps: Vec<Step>,

    /// Runs whether or not the steps passed
    #[serde(default)]
    pub cleanup: Cleanup,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Precondition {
    /// SKU looked up through the product API
    pub product: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Reuse the run's cached login for this identity
    #[default]
    Cached,
    /// Always log in, then refresh the cache
    Fresh,
    /// No login
    #[serde(rename = "none")]
    Anonymous,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Cleanup {
    #[default]
    EmptyCart,
    None,
}

/// How a UI value is read.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadKind {
    #[default]
    Text,
    Value,
}

/// Applied to a captured value before storing it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    #[default]
    Trim,
    /// Keep ASCII digits only ("Available: 25" -> "25")
    Digits,
    Raw,
}

impl Transform {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Transform::Trim => raw.trim().to_string(),
            Transform::Digits => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
            Transform::Raw => raw.to_string(),
        }
    }
}

fn quantity_input() -> Selector {
    Selector::test_id("quantity")
}

/// A single scenario step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Search from the header and land on the product page
    SearchAndOpen { query: String },

    /// Visit the search-results URL directly and land on the product page
    OpenSearchResults { query: String },

    /// Visit a storefront path
    Visit {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        await_exchange: Option<AwaitedExchange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_location: Option<String>,
    },

    /// Click once the target is visible and enabled
    Click {
        target: Selector,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        await_exchange: Option<AwaitedExchange>,
    },

    /// Clear and type a quantity, then confirm the input holds it
    SetQuantity {
        #[serde(default = "quantity_input")]
        target: Selector,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        await_exchange: Option<AwaitedExchange>,
    },

    /// Assign a quantity directly (bypassing input limits) and dispatch
    /// input/change events
    ForceQuantity {
        #[serde(default = "quantity_input")]
        target: Selector,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        await_exchange: Option<AwaitedExchange>,
    },

    /// Set a free-text annotation through input/change/blur events
    SetInstructions { target: Selector, text: String },

    /// Record a UI value under `alias` for later checks
    Capture {
        alias: String,
        target: Selector,
        #[serde(default)]
        read: ReadKind,
        #[serde(default)]
        transform: Transform,
    },

    /// Start watching for an exchange that a later step will trigger
    Watch { alias: String, route: RoutePattern },

    /// Block until a watched exchange completes
    Await {
        alias: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },

    /// Evaluate checks against the live page
    Assert { checks: Vec<Check> },
}

impl Step {
    /// Short label for logs and reports.
    pub fn label(&self) -> String {
        match self {
            Step::SearchAndOpen { query } => format!("search_and_open {}", query),
            Step::OpenSearchResults { query } => format!("open_search_results {}", query),
            Step::Visit { path, .. } => format!("visit {}", path),
            Step::Click { target, .. } => format!("click {}", target),
            Step::SetQuantity { value, .. } => format!("set_quantity {}", value),
            Step::ForceQuantity { value, .. } => format!("force_quantity {}", value),
            Step::SetInstructions { .. } => "set_instructions".to_string(),
            Step::Capture { alias, .. } => format!("capture {}", alias),
            Step::Watch { alias, route } => format!("watch {} ({})", alias, route),
            Step::Await { alias, .. } => format!("await {}", alias),
            Step::Assert { checks } => format!("assert ({} checks)", checks.len()),
        }
    }
}

/// Where the expected side of a reconciliation comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum Expected {
    Record { field: RecordField },
    Literal { value: String },
    Captured { alias: String },
}

/// A single check evaluated against the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// Normalize both sides under `policy` and compare
    Reconcile {
        target: Selector,
        #[serde(default)]
        read: ReadKind,
        expected: Expected,
        policy: FieldPolicy,
    },

    Visible { target: Selector },

    /// Absent or not rendered
    Hidden { target: Selector },

    Enabled { target: Selector },

    /// Some visible element contains the text
    TextVisible { text: String },

    /// Text content is non-blank
    NotEmpty { target: Selector },

    /// Text content parses as money greater than zero
    PositiveMoney { target: Selector },

    LocationContains { fragment: String },
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::Reconcile { .. } => "Reconcile",
            Check::Visible { .. } => "Visible",
            Check::Hidden { .. } => "Hidden",
            Check::Enabled { .. } => "Enabled",
            Check::TextVisible { .. } => "TextVisible",
            Check::NotEmpty { .. } => "NotEmpty",
            Check::PositiveMoney { .. } => "PositiveMoney",
            Check::LocationContains { .. } => "LocationContains",
        }
    }
}

/// Result of evaluating a single check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// Which step this check belongs to (0-indexed)
    pub step_index: usize,

    pub check: Check,

    pub passed: bool,

    /// Raw value read from the page
    pub actual: Option<String>,

    /// Human-readable failure message
    pub message: Option<String>,

    /// Present for reconciliation checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ComparisonOutcome>,
}

/// The step that stopped a scenario. `index` is `None` for setup
/// (precondition fetch, login).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedStep {
    pub index: Option<usize>,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CleanupReport {
    Skipped,
    Done(CartClearOutcome),
    Failed(String),
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,

    /// Every step ran, every check passed, and cleanup succeeded
    pub passed: bool,

    pub steps_run: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<FailedStep>,

    pub check_results: Vec<CheckResult>,

    /// Error that aborted the scenario (not a check failure)
    pub error: Option<String>,

    pub cleanup: CleanupReport,

    pub duration_ms: u128,
}
