use crate::reconcile::model::{
    BackendValue, ComparisonOutcome, Mismatch, NormalizedValue, RenderedField, Side,
};
use crate::reconcile::money::{Money, MoneyParseError};
use crate::reconcile::policy::FieldPolicy;

// ============================================================================
// Normalization
// ============================================================================

/// Trim surrounding whitespace; empty text counts as absent.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn money_failure(side: Side, raw: &str, err: MoneyParseError) -> Mismatch {
    match (side, err) {
        (Side::Expected, MoneyParseError::Empty) => Mismatch::MissingExpected,
        (Side::Actual, MoneyParseError::Empty) => Mismatch::MissingActual,
        (side, _) => Mismatch::Unparseable {
            side,
            raw: raw.trim().to_string(),
        },
    }
}

/// Normalize the expected side. Quantity-scaled policies multiply here so
/// the comparison below is the same for both money rules.
pub fn normalize_expected(
    value: &BackendValue,
    policy: &FieldPolicy,
) -> Result<NormalizedValue, Mismatch> {
    if !policy.is_numeric() {
        return match value {
            BackendValue::Text(s) => normalize_text(s)
                .map(NormalizedValue::Text)
                .ok_or(Mismatch::MissingExpected),
            BackendValue::Decimal(d) => Ok(NormalizedValue::Text(d.to_string())),
            BackendValue::Missing => Err(Mismatch::MissingExpected),
        };
    }

    let unit = match value {
        BackendValue::Text(s) => {
            Money::parse_rendered(s).map_err(|e| money_failure(Side::Expected, s, e))?
        }
        BackendValue::Decimal(d) => {
            Money::from_f64(*d).map_err(|e| money_failure(Side::Expected, &d.to_string(), e))?
        }
        BackendValue::Missing => return Err(Mismatch::MissingExpected),
    };

    match policy {
        FieldPolicy::QuantityScaledMoney { quantity, .. } => unit
            .checked_mul_quantity(*quantity)
            .map(NormalizedValue::Money)
            .ok_or_else(|| Mismatch::Unparseable {
                side: Side::Expected,
                raw: format!("{} x {}", unit, quantity),
            }),
        _ => Ok(NormalizedValue::Money(unit)),
    }
}

pub fn normalize_actual(
    field: &RenderedField,
    policy: &FieldPolicy,
) -> Result<NormalizedValue, Mismatch> {
    let raw = field.as_deref().ok_or(Mismatch::MissingActual)?;
    if policy.is_numeric() {
        Money::parse_rendered(raw)
            .map(NormalizedValue::Money)
            .map_err(|e| money_failure(Side::Actual, raw, e))
    } else {
        normalize_text(raw)
            .map(NormalizedValue::Text)
            .ok_or(Mismatch::MissingActual)
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Decide whether a backend value and a rendered value are the same fact.
///
/// Both sides go through the policy's normalization first. An absent or
/// empty side fails and names which side was missing.
pub fn reconcile(
    expected: &BackendValue,
    actual: &RenderedField,
    policy: &FieldPolicy,
) -> ComparisonOutcome {
    let mut outcome = ComparisonOutcome {
        rule: policy.rule_name(),
        passed: false,
        expected: None,
        actual: None,
        tolerance: policy.tolerance(),
        difference: None,
        failure: None,
    };

    let expected = match normalize_expected(expected, policy) {
        Ok(v) => v,
        Err(m) => {
            outcome.failure = Some(m);
            return outcome;
        }
    };
    outcome.expected = Some(expected.clone());

    let actual = match normalize_actual(actual, policy) {
        Ok(v) => v,
        Err(m) => {
            outcome.failure = Some(m);
            return outcome;
        }
    };
    outcome.actual = Some(actual.clone());

    let failure = match (&expected, &actual) {
        (NormalizedValue::Money(e), NormalizedValue::Money(a)) => {
            let difference = e.abs_diff(*a);
            outcome.difference = Some(difference);
            let tolerance = outcome.tolerance.unwrap_or(Money::ZERO);
            (difference > tolerance).then_some(Mismatch::OutOfTolerance)
        }
        (NormalizedValue::Text(e), NormalizedValue::Text(a)) => match policy {
            FieldPolicy::FreeText => (!a.contains(e.as_str())).then_some(Mismatch::NotContained),
            _ => (a != e).then_some(Mismatch::NotEqual),
        },
        _ => Some(Mismatch::NotEqual),
    };

    outcome.passed = failure.is_none();
    outcome.failure = failure;
    outcome
}
