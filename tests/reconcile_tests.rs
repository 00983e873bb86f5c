use storefront_e2e::reconcile::money::{Money, MoneyParseError};
use storefront_e2e::reconcile::policy::FieldPolicy;
use storefront_e2e::reconcile::reconciler::{normalize_actual, normalize_expected, normalize_text};
use storefront_e2e::reconcile::{
    BackendValue, Mismatch, NormalizedValue, RenderedField, Side, reconcile,
};

fn money(tolerance_cents: i64) -> FieldPolicy {
    FieldPolicy::Money {
        tolerance: Money::from_cents(tolerance_cents),
    }
}

// ============================================================================
// Money parsing
// ============================================================================

#[test]
fn money_parses_currency_formatting() {
    assert_eq!(Money::parse_rendered("$1,234.50").unwrap(), Money::from_cents(123_450));
    assert_eq!(Money::parse_rendered("  $12.5 \n").unwrap(), Money::from_cents(1_250));
    assert_eq!(Money::parse_rendered("42").unwrap(), Money::from_cents(4_200));
    assert_eq!(Money::parse_rendered(".99").unwrap(), Money::from_cents(99));
}

#[test]
fn money_parses_negative_amounts() {
    assert_eq!(Money::parse_rendered("-$3.10").unwrap(), Money::from_cents(-310));
}

#[test]
fn money_rounds_beyond_four_fraction_digits() {
    assert_eq!(Money::parse_rendered("0.00005").unwrap(), Money::from_units(1));
    assert_eq!(Money::parse_rendered("0.00004").unwrap(), Money::from_units(0));
}

#[test]
fn money_rejects_garbage_instead_of_reading_zero() {
    assert_eq!(Money::parse_rendered("   "), Err(MoneyParseError::Empty));
    assert_eq!(Money::parse_rendered("$"), Err(MoneyParseError::Empty));
    assert!(matches!(
        Money::parse_rendered("Call for price"),
        Err(MoneyParseError::Invalid(_))
    ));
    assert!(matches!(Money::parse_rendered("1.2.3"), Err(MoneyParseError::Invalid(_))));
    assert!(matches!(Money::parse_rendered("."), Err(MoneyParseError::Invalid(_))));
}

#[test]
fn money_overflow_is_reported() {
    assert!(matches!(
        Money::parse_rendered("99999999999999999999"),
        Err(MoneyParseError::Overflow(_))
    ));
}

#[test]
fn money_from_f64_rounds_to_fixed_point() {
    assert_eq!(Money::from_f64(1234.5).unwrap(), Money::from_cents(123_450));
    assert_eq!(Money::from_f64(0.1 + 0.2).unwrap(), Money::from_units(3_000));
    assert!(Money::from_f64(f64::NAN).is_err());
    assert!(Money::from_f64(f64::INFINITY).is_err());
}

#[test]
fn money_display_keeps_two_decimals() {
    assert_eq!(Money::from_cents(123_450).to_string(), "1234.50");
    assert_eq!(Money::from_units(12_345).to_string(), "1.2345");
    assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    assert_eq!(Money::ZERO.to_string(), "0.00");
}

#[test]
fn money_serializes_as_a_json_number() {
    let json = serde_json::to_string(&Money::from_cents(5)).unwrap();
    assert_eq!(json, "0.05");
    let back: Money = serde_json::from_str("0.05").unwrap();
    assert_eq!(back, Money::from_cents(5));
}

// ============================================================================
// Policies
// ============================================================================

#[test]
fn policy_deserializes_from_tagged_yaml() {
    let p: FieldPolicy = serde_yaml::from_str("kind: money").unwrap();
    assert_eq!(p, FieldPolicy::money());

    let p: FieldPolicy =
        serde_yaml::from_str("{kind: quantity_scaled_money, quantity: 3, tolerance: 0.05}").unwrap();
    assert_eq!(
        p,
        FieldPolicy::QuantityScaledMoney {
            quantity: 3,
            tolerance: Some(Money::from_cents(5))
        }
    );

    let p: FieldPolicy = serde_yaml::from_str("kind: free_text").unwrap();
    assert_eq!(p, FieldPolicy::FreeText);
}

#[test]
fn line_total_tolerance_scales_with_quantity_with_floor() {
    assert_eq!(FieldPolicy::line_total(3).tolerance(), Some(Money::from_cents(5)));
    assert_eq!(FieldPolicy::line_total(20).tolerance(), Some(Money::from_cents(20)));
    assert_eq!(FieldPolicy::Identifier.tolerance(), None);
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn normalize_text_trims_and_treats_blank_as_absent() {
    assert_eq!(normalize_text("  In Stock\n"), Some("In Stock".to_string()));
    assert_eq!(normalize_text(" \t "), None);
}

#[test]
fn normalize_expected_scales_quantity_policies() {
    let v = normalize_expected(&BackendValue::Decimal(12.5), &FieldPolicy::line_total(3)).unwrap();
    assert_eq!(v, NormalizedValue::Money(Money::from_cents(3_750)));
}

#[test]
fn normalize_expected_reads_captured_currency_text() {
    let v = normalize_expected(&BackendValue::text("$12.50"), &FieldPolicy::money()).unwrap();
    assert_eq!(v, NormalizedValue::Money(Money::from_cents(1_250)));
}

#[test]
fn normalize_actual_reports_missing_element() {
    let err = normalize_actual(&RenderedField::missing(), &FieldPolicy::money()).unwrap_err();
    assert_eq!(err, Mismatch::MissingActual);
}

// ============================================================================
// Money reconciliation: tolerance boundaries
// ============================================================================

#[test]
fn money_within_tolerance_passes_at_exact_boundary() {
    let outcome = reconcile(
        &BackendValue::Decimal(1234.50),
        &RenderedField::new("$1,234.51"),
        &money(1),
    );
    assert!(outcome.passed, "difference equal to tolerance must pass: {}", outcome);
    assert_eq!(outcome.difference, Some(Money::from_cents(1)));
    assert_eq!(outcome.failure, None);
}

#[test]
fn money_just_outside_tolerance_fails() {
    let outcome = reconcile(
        &BackendValue::Decimal(1234.50),
        &RenderedField::new("$1,234.5101"),
        &money(1),
    );
    assert!(!outcome.passed);
    assert_eq!(outcome.failure, Some(Mismatch::OutOfTolerance));
    assert_eq!(outcome.difference, Some(Money::from_units(101)));
}

#[test]
fn money_exact_match_passes_with_zero_difference() {
    let outcome = reconcile(
        &BackendValue::Decimal(0.3),
        &RenderedField::new("$0.30"),
        &money(0),
    );
    assert!(outcome.passed, "fixed-point comparison must not suffer float drift");
    assert_eq!(outcome.difference, Some(Money::ZERO));
}

#[test]
fn money_unparseable_rendered_text_fails_closed() {
    let outcome = reconcile(
        &BackendValue::Decimal(10.0),
        &RenderedField::new("Call for price"),
        &FieldPolicy::money(),
    );
    assert!(!outcome.passed);
    assert_eq!(
        outcome.failure,
        Some(Mismatch::Unparseable {
            side: Side::Actual,
            raw: "Call for price".into()
        })
    );
}

#[test]
fn money_missing_expected_fails() {
    let outcome = reconcile(
        &BackendValue::Missing,
        &RenderedField::new("$10.00"),
        &FieldPolicy::money(),
    );
    assert!(!outcome.passed);
    assert_eq!(outcome.failure, Some(Mismatch::MissingExpected));
}

// ============================================================================
// Quantity-scaled totals
// ============================================================================

#[test]
fn quantity_scaled_total_within_tolerance_passes() {
    let policy = FieldPolicy::QuantityScaledMoney {
        quantity: 3,
        tolerance: Some(Money::from_cents(5)),
    };
    let outcome = reconcile(&BackendValue::text("$12.50"), &RenderedField::new("$37.55"), &policy);
    assert!(outcome.passed, "{}", outcome);
    assert_eq!(outcome.expected, Some(NormalizedValue::Money(Money::from_cents(3_750))));
}

#[test]
fn quantity_scaled_total_outside_tolerance_fails() {
    let policy = FieldPolicy::QuantityScaledMoney {
        quantity: 3,
        tolerance: Some(Money::from_cents(5)),
    };
    let outcome = reconcile(&BackendValue::text("$12.50"), &RenderedField::new("$37.56"), &policy);
    assert!(!outcome.passed);
    assert_eq!(outcome.failure, Some(Mismatch::OutOfTolerance));
    assert_eq!(outcome.difference, Some(Money::from_cents(6)));
}

#[test]
fn unscaled_price_is_not_mistaken_for_line_total() {
    let outcome = reconcile(
        &BackendValue::Decimal(12.5),
        &RenderedField::new("$12.50"),
        &FieldPolicy::line_total(3),
    );
    assert!(!outcome.passed);
}

// ============================================================================
// Identifier, status and free text
// ============================================================================

#[test]
fn identifier_passes_on_exact_match_after_trim() {
    let outcome = reconcile(
        &BackendValue::text("4196:4677:P"),
        &RenderedField::new("  4196:4677:P\n"),
        &FieldPolicy::Identifier,
    );
    assert!(outcome.passed);
}

#[test]
fn identifier_fails_on_any_difference() {
    let outcome = reconcile(
        &BackendValue::text("4196:4677:P"),
        &RenderedField::new("4196:4677:p"),
        &FieldPolicy::Identifier,
    );
    assert!(!outcome.passed);
    assert_eq!(outcome.failure, Some(Mismatch::NotEqual));
}

#[test]
fn status_compares_trimmed_values() {
    let ok = reconcile(
        &BackendValue::text(" In Stock "),
        &RenderedField::new("In Stock"),
        &FieldPolicy::Status,
    );
    assert!(ok.passed);

    let bad = reconcile(
        &BackendValue::text("In Stock"),
        &RenderedField::new("Backordered"),
        &FieldPolicy::Status,
    );
    assert!(!bad.passed);
}

#[test]
fn free_text_passes_when_expected_is_contained() {
    let outcome = reconcile(
        &BackendValue::text("14K Yellow Gold Ring Mounting"),
        &RenderedField::new("  14K Yellow Gold Ring Mounting, polished finish "),
        &FieldPolicy::FreeText,
    );
    assert!(outcome.passed);
}

#[test]
fn free_text_fails_when_not_contained() {
    let outcome = reconcile(
        &BackendValue::text("Platinum Band"),
        &RenderedField::new("14K Yellow Gold Ring Mounting"),
        &FieldPolicy::FreeText,
    );
    assert!(!outcome.passed);
    assert_eq!(outcome.failure, Some(Mismatch::NotContained));
}

#[test]
fn empty_rendered_text_is_missing_not_equal() {
    let outcome = reconcile(
        &BackendValue::text("4196:4677:P"),
        &RenderedField::new("   "),
        &FieldPolicy::Identifier,
    );
    assert!(!outcome.passed);
    assert_eq!(outcome.failure, Some(Mismatch::MissingActual));
}

// ============================================================================
// Triage output
// ============================================================================

#[test]
fn outcome_display_shows_both_values_and_tolerance() {
    let outcome = reconcile(
        &BackendValue::Decimal(10.0),
        &RenderedField::new("$10.50"),
        &money(1),
    );
    let text = outcome.to_string();
    assert!(text.contains("10.00"), "{}", text);
    assert!(text.contains("10.50"), "{}", text);
    assert!(text.contains("0.01"), "{}", text);
    assert!(text.contains("off by 0.50"), "{}", text);
}

#[test]
fn outcome_display_quotes_text_values() {
    let outcome = reconcile(
        &BackendValue::text("A"),
        &RenderedField::new("B"),
        &FieldPolicy::Identifier,
    );
    assert_eq!(outcome.to_string(), "identifier (exact): expected \"A\", actual \"B\"");
}

#[test]
fn outcome_serializes_for_reports() {
    let outcome = reconcile(
        &BackendValue::Decimal(10.0),
        &RenderedField::new("$10.50"),
        &money(1),
    );
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["passed"], false);
    assert_eq!(json["failure"]["kind"], "out_of_tolerance");
    assert_eq!(json["expected"], 10.0);
    assert_eq!(json["actual"], 10.5);
}
