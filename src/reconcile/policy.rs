use serde::{Deserialize, Serialize};

use crate::reconcile::money::Money;

/// Absolute tolerance for a single rendered price (one cent).
pub const DEFAULT_MONEY_TOLERANCE: Money = Money::from_cents(1);

/// Lower bound for line totals, which accumulate per-unit rounding.
pub const MIN_LINE_TOTAL_TOLERANCE: Money = Money::from_cents(5);

/// How a field is normalized and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldPolicy {
    /// Trimmed, byte-for-byte equality (SKU, item number, quantity value)
    Identifier,

    /// Trimmed, exact equality over a closed vocabulary
    Status,

    /// Currency text parsed to a decimal, equal within `tolerance`
    Money {
        #[serde(default = "default_money_tolerance")]
        tolerance: Money,
    },

    /// Trimmed; the rendered text must contain the expected text
    FreeText,

    /// Expected unit price scaled by `quantity`, equal within a wider tolerance
    QuantityScaledMoney {
        quantity: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tolerance: Option<Money>,
    },
}

fn default_money_tolerance() -> Money {
    DEFAULT_MONEY_TOLERANCE
}

impl FieldPolicy {
    pub fn money() -> Self {
        FieldPolicy::Money {
            tolerance: DEFAULT_MONEY_TOLERANCE,
        }
    }

    pub fn line_total(quantity: u32) -> Self {
        FieldPolicy::QuantityScaledMoney {
            quantity,
            tolerance: None,
        }
    }

    /// Tolerance applied by numeric policies; `None` for text policies.
    ///
    /// Line totals default to one cent per unit, never below five cents.
    pub fn tolerance(&self) -> Option<Money> {
        match self {
            FieldPolicy::Money { tolerance } => Some(*tolerance),
            FieldPolicy::QuantityScaledMoney {
                quantity,
                tolerance,
            } => Some(tolerance.unwrap_or_else(|| {
                DEFAULT_MONEY_TOLERANCE
                    .checked_mul_quantity(*quantity)
                    .map_or(Money::from_units(i64::MAX), |t| t.max(MIN_LINE_TOTAL_TOLERANCE))
            })),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldPolicy::Money { .. } | FieldPolicy::QuantityScaledMoney { .. }
        )
    }

    pub fn rule_name(&self) -> String {
        match self {
            FieldPolicy::Identifier => "identifier (exact)".into(),
            FieldPolicy::Status => "status (exact)".into(),
            FieldPolicy::Money { .. } => "money (within tolerance)".into(),
            FieldPolicy::FreeText => "free text (contains)".into(),
            FieldPolicy::QuantityScaledMoney { quantity, .. } => {
                format!("money x{} (within tolerance)", quantity)
            }
        }
    }
}
