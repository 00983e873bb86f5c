use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reconcile::money::Money;

/// Expected side of a comparison, taken from the backend record, a literal,
/// or a value captured earlier in the scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendValue {
    Text(String),
    Decimal(f64),
    Missing,
}

impl BackendValue {
    pub fn text(value: impl Into<String>) -> Self {
        BackendValue::Text(value.into())
    }
}

/// Raw text read from the live UI. `None` when the element was not found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedField(Option<String>);

impl RenderedField {
    pub fn new(text: impl Into<String>) -> Self {
        RenderedField(Some(text.into()))
    }

    pub fn missing() -> Self {
        RenderedField(None)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for RenderedField {
    fn from(value: Option<String>) -> Self {
        RenderedField(value)
    }
}

/// A value after field-specific normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Money(Money),
    Text(String),
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Text(s) => write!(f, "\"{}\"", s),
            NormalizedValue::Money(m) => write!(f, "{}", m),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Expected,
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Expected => write!(f, "expected"),
            Side::Actual => write!(f, "rendered"),
        }
    }
}

/// Why a comparison failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    MissingExpected,
    MissingActual,
    Unparseable { side: Side, raw: String },
    NotEqual,
    NotContained,
    OutOfTolerance,
}

/// Result of one reconciliation, with everything needed for triage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub rule: String,
    pub passed: bool,
    pub expected: Option<NormalizedValue>,
    pub actual: Option<NormalizedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Mismatch>,
}

impl ComparisonOutcome {
    pub fn failure_kind(&self) -> Option<&Mismatch> {
        self.failure.as_ref()
    }
}

fn show(value: &Option<NormalizedValue>) -> String {
    value
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |v| v.to_string())
}

impl fmt::Display for ComparisonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = show(&self.expected);
        let actual = show(&self.actual);
        match &self.failure {
            None => write!(f, "{}: ok (expected {}, actual {})", self.rule, expected, actual),
            Some(Mismatch::MissingExpected) => {
                write!(f, "{}: expected value is missing", self.rule)
            }
            Some(Mismatch::MissingActual) => write!(
                f,
                "{}: rendered value is missing (expected {})",
                self.rule, expected
            ),
            Some(Mismatch::Unparseable { side, raw }) => {
                write!(f, "{}: {} value '{}' is not a number", self.rule, side, raw)
            }
            Some(Mismatch::NotEqual) => write!(
                f,
                "{}: expected {}, actual {}",
                self.rule, expected, actual
            ),
            Some(Mismatch::NotContained) => write!(
                f,
                "{}: actual {} does not contain expected {}",
                self.rule, actual, expected
            ),
            Some(Mismatch::OutOfTolerance) => {
                write!(f, "{}: expected {}", self.rule, expected)?;
                if let Some(t) = self.tolerance {
                    write!(f, " \u{b1} {}", t)?;
                }
                write!(f, ", actual {}", actual)?;
                if let Some(d) = self.difference {
                    write!(f, " (off by {})", d)?;
                }
                Ok(())
            }
        }
    }
}
