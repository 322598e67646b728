//! Progressive bracket tax engine.
//!
//! Applies an ascending schedule of marginal-rate brackets to an income and
//! reports the total, the effective rate, and one breakdown line per bracket
//! that taxed any part of the income.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::compute_tax;
//! use tax_core::TaxBracket;
//!
//! let brackets = vec![
//!     TaxBracket::new(dec!(0), Some(dec!(47630)), dec!(0.15)),
//!     TaxBracket::new(dec!(47630), Some(dec!(95259)), dec!(0.205)),
//!     TaxBracket::new(dec!(95259), None, dec!(0.26)),
//! ];
//!
//! let result = compute_tax(dec!(50000), &brackets);
//!
//! assert_eq!(result.total_tax, dec!(7630.35));
//! assert_eq!(result.tax_details.len(), 2);
//! assert_eq!(result.tax_details[1].range, "$47630.00 - $95259.00");
//! ```

use rust_decimal::Decimal;

use crate::calculations::common::format_currency;
use crate::models::{TaxBracket, TaxCalculationResult, TaxDetail};

/// Computes the tax owed on `income` under `brackets`.
///
/// `brackets` must be ascending and contiguous with a single unbounded top
/// bracket; see [`TaxBracketSet::validate`](crate::TaxBracketSet::validate).
/// The schedule is not checked here.
///
/// A bracket applies only when `income` is strictly above its lower bound,
/// and its share is clamped to its upper bound, so income sitting exactly on
/// a bound is taxed entirely by the lower bracket. Zero and negative incomes
/// produce no tax and no breakdown lines, and neither does a bracket whose
/// share of the tax comes to exactly zero.
pub fn compute_tax(
    income: Decimal,
    brackets: &[TaxBracket],
) -> TaxCalculationResult {
    let mut total_tax = Decimal::ZERO;
    let mut tax_details = Vec::new();

    for bracket in brackets {
        // Bounds ascend, so nothing above this bracket can apply either.
        if income <= bracket.min_income {
            break;
        }

        let ceiling = bracket.max_income.map_or(income, |max| income.min(max));
        let taxable_amount = ceiling - bracket.min_income;
        let tax_amount = taxable_amount * bracket.tax_rate;
        // Zero-rate bands and sub-precision slivers add no line.
        if tax_amount.is_zero() {
            continue;
        }

        total_tax += tax_amount;
        tax_details.push(TaxDetail {
            range: range_label(bracket),
            rate: bracket.tax_rate * Decimal::ONE_HUNDRED,
            tax_amount,
        });
    }

    TaxCalculationResult {
        total_tax,
        effective_rate: compute_effective_rate(total_tax, income),
        tax_details,
    }
}

/// Returns `total_tax` as a percentage of `income`, or zero when `income` is zero.
///
/// The value is exact; round it with
/// [`round_half_up`](crate::calculations::common::round_half_up) for display.
pub fn compute_effective_rate(
    total_tax: Decimal,
    income: Decimal,
) -> Decimal {
    if income.is_zero() {
        return Decimal::ZERO;
    }
    total_tax / income * Decimal::ONE_HUNDRED
}

/// Label for a bracket's band, e.g. `"$0.00 - $47630.00"` or `"$210371.00 - above"`.
pub fn range_label(bracket: &TaxBracket) -> String {
    let upper = bracket
        .max_income
        .map_or_else(|| "above".to_string(), format_currency);
    format!("{} - {}", format_currency(bracket.min_income), upper)
}
