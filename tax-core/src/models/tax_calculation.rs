use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a bracket breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxDetail {
    /// Human-readable band, e.g. `"$0.00 - $47630.00"` or `"$210371.00 - above"`.
    pub range: String,
    /// Marginal rate as a percentage (`20.5` for 20.5%).
    pub rate: Decimal,
    /// Tax contributed by this band.
    pub tax_amount: Decimal,
}

/// Outcome of applying a bracket schedule to an income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    /// Sum of every `tax_details[*].tax_amount`.
    pub total_tax: Decimal,
    /// `total_tax / income * 100`, or zero when income is zero. Not rounded.
    pub effective_rate: Decimal,
    /// Contributing brackets in ascending order.
    pub tax_details: Vec<TaxDetail>,
}
