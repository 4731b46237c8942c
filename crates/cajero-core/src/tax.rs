//! # Tax Apportionment
//!
//! Splits tax-inclusive line totals into the taxable bases and the IGV.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Line: S/ 118.00 × 1, TAXED                                            │
//! │                                                                         │
//! │    gross  = 118.00                (integer céntimos, exact)            │
//! │    base   = gross / 1.18 = 100.00 (exact decimal, NOT rounded)         │
//! │    igv    = gross − base =  18.00                                      │
//! │                                                                         │
//! │  Line: S/ 5.00 × 2, EXEMPT      → exempt_base     += 10.00             │
//! │  Line: S/ 3.00 × 1, UNAFFECTED  → unaffected_base +=  3.00             │
//! │                                                                         │
//! │  grand_total = taxed + exempt + unaffected + igv                       │
//! │  Rounding to 2 decimals happens only in `rounded()` / on output.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Taxed gross amounts are summed in céntimos and divided by 1.18 once, so
//! the breakdown does not depend on line order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{round_amount, Money};
use crate::types::{LineItem, TaxCategory};

/// 1 + IGV rate (18%).
pub const IGV_FACTOR: Decimal = Decimal::from_parts(118, 0, 0, false, 2);

/// IGV rate (18%).
pub const IGV_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

// =============================================================================
// Tax Breakdown
// =============================================================================

/// Fiscal totals of a set of lines.
///
/// Invariant: `grand_total == taxed_base + exempt_base + unaffected_base + tax_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub taxed_base: Decimal,
    pub exempt_base: Decimal,
    pub unaffected_base: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

impl TaxBreakdown {
    /// Sum of the three bases (UBL `LineExtensionAmount`).
    pub fn line_extension(&self) -> Decimal {
        self.taxed_base + self.exempt_base + self.unaffected_base
    }

    /// Two-decimal output view, half away from zero.
    pub fn rounded(&self) -> TaxBreakdown {
        TaxBreakdown {
            taxed_base: round_amount(self.taxed_base),
            exempt_base: round_amount(self.exempt_base),
            unaffected_base: round_amount(self.unaffected_base),
            tax_amount: round_amount(self.tax_amount),
            grand_total: round_amount(self.grand_total),
        }
    }
}

// =============================================================================
// Line Apportionment
// =============================================================================

/// Base and tax of a single tax-inclusive amount.
///
/// ## Example
/// ```rust
/// use cajero_core::money::Money;
/// use cajero_core::tax::apportion;
/// use cajero_core::types::TaxCategory;
/// use rust_decimal::Decimal;
///
/// let (base, tax) = apportion(Money::from_cents(11800), TaxCategory::Taxed);
/// assert_eq!(base, Decimal::new(100, 0));
/// assert_eq!(tax, Decimal::new(18, 0));
/// ```
pub fn apportion(gross: Money, category: TaxCategory) -> (Decimal, Decimal) {
    let gross = gross.to_decimal();
    match category {
        TaxCategory::Taxed => {
            let base = gross / IGV_FACTOR;
            (base, gross - base)
        }
        TaxCategory::Exempt | TaxCategory::Unaffected => (gross, Decimal::ZERO),
    }
}

/// Computes the fiscal breakdown of already-validated lines.
///
/// Pure and deterministic; empty input yields an all-zero breakdown.
/// Call [`crate::validation::validate_lines`] first.
pub fn compute_totals(lines: &[LineItem]) -> TaxBreakdown {
    let mut taxed_gross = Money::zero();
    let mut exempt = Money::zero();
    let mut unaffected = Money::zero();

    for line in lines {
        let total = line.line_total();
        match line.tax_category {
            TaxCategory::Taxed => taxed_gross += total,
            TaxCategory::Exempt => exempt += total,
            TaxCategory::Unaffected => unaffected += total,
        }
    }

    let (taxed_base, tax_amount) = apportion(taxed_gross, TaxCategory::Taxed);
    let exempt_base = exempt.to_decimal();
    let unaffected_base = unaffected.to_decimal();

    TaxBreakdown {
        taxed_base,
        exempt_base,
        unaffected_base,
        tax_amount,
        grand_total: taxed_base + exempt_base + unaffected_base + tax_amount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UnitCode;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(cents: i64, qty: i64, category: TaxCategory) -> LineItem {
        LineItem {
            product_id: format!("p-{cents}"),
            description: "Item".to_string(),
            unit_price: Money::from_cents(cents),
            quantity: qty,
            tax_category: category,
            unit_code: UnitCode::Niu,
        }
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(compute_totals(&[]), TaxBreakdown::default());
    }

    #[test]
    fn test_single_taxed_line() {
        let totals = compute_totals(&[line(11800, 1, TaxCategory::Taxed)]).rounded();
        assert_eq!(totals.taxed_base, dec!(100.00));
        assert_eq!(totals.tax_amount, dec!(18.00));
        assert_eq!(totals.grand_total, dec!(118.00));
    }

    #[test]
    fn test_mixed_categories() {
        let totals = compute_totals(&[
            line(1000, 2, TaxCategory::Taxed),
            line(500, 2, TaxCategory::Exempt),
            line(300, 1, TaxCategory::Unaffected),
        ]);

        assert_eq!(totals.exempt_base, dec!(10.00));
        assert_eq!(totals.unaffected_base, dec!(3.00));
        assert_eq!(totals.grand_total, dec!(33.00));

        let rounded = totals.rounded();
        assert_eq!(rounded.taxed_base, dec!(16.95));
        assert_eq!(rounded.tax_amount, dec!(3.05));
    }

    #[test]
    fn test_rounding_happens_once() {
        // Three lines of 0.10 each: per-line rounding would give 0.08 × 3 = 0.24
        // of base, the exact sum rounds to 0.25.
        let lines = vec![line(10, 1, TaxCategory::Taxed); 3];
        let totals = compute_totals(&lines).rounded();
        assert_eq!(totals.taxed_base, dec!(0.25));
        assert_eq!(totals.tax_amount, dec!(0.05));
        assert_eq!(totals.grand_total, dec!(0.30));
    }

    #[test]
    fn test_invariant_holds() {
        let totals = compute_totals(&[
            line(999, 3, TaxCategory::Taxed),
            line(1, 7, TaxCategory::Exempt),
        ]);
        assert_eq!(
            totals.grand_total,
            totals.taxed_base + totals.exempt_base + totals.unaffected_base + totals.tax_amount
        );
    }

    fn category() -> impl Strategy<Value = TaxCategory> {
        prop_oneof![
            Just(TaxCategory::Taxed),
            Just(TaxCategory::Exempt),
            Just(TaxCategory::Unaffected),
        ]
    }

    fn lines() -> impl Strategy<Value = Vec<LineItem>> {
        prop::collection::vec(
            (0i64..1_000_000, 1i64..100, category()).prop_map(|(c, q, t)| line(c, q, t)),
            0..20,
        )
    }

    proptest! {
        #[test]
        fn prop_permutation_invariant(lines in lines(), seed in any::<u64>()) {
            let mut shuffled = lines.clone();
            // Deterministic rotation + reversal driven by the seed
            if !shuffled.is_empty() {
                let k = (seed as usize) % shuffled.len();
                shuffled.rotate_left(k);
                if seed % 2 == 0 {
                    shuffled.reverse();
                }
            }
            prop_assert_eq!(compute_totals(&lines), compute_totals(&shuffled));
        }

        #[test]
        fn prop_taxed_only_tax_ratio(
            prices in prop::collection::vec((1i64..1_000_000, 1i64..50), 1..10)
        ) {
            let lines: Vec<LineItem> = prices
                .iter()
                .map(|(c, q)| line(*c, *q, TaxCategory::Taxed))
                .collect();
            let totals = compute_totals(&lines);
            let expected = totals.grand_total * IGV_RATE / IGV_FACTOR;
            let diff = (totals.tax_amount - expected).abs();
            prop_assert!(diff < dec!(0.000001), "tax {} expected {}", totals.tax_amount, expected);
            prop_assert_eq!(totals.rounded().tax_amount, round_amount(expected));
        }
    }
}
