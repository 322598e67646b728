//! Presentation of calculation results.

use std::fmt::Write;

use tax_core::TaxCalculationResult;
use tax_core::calculations::common::{format_currency, format_two_places};

/// Renders a result as the breakdown shown to users:
///
/// ```text
/// Total tax: $7630.35
/// Income between $0.00 - $47630.00 taxed at 15.00%: $7144.50
/// Income between $47630.00 - $95259.00 taxed at 20.50%: $485.85
/// Effective tax rate: 15.26%
/// ```
pub fn render_text(result: &TaxCalculationResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "Total tax: {}", format_currency(result.total_tax));
    for detail in &result.tax_details {
        let _ = writeln!(
            out,
            "Income between {} taxed at {}%: {}",
            detail.range,
            format_two_places(detail.rate),
            format_currency(detail.tax_amount)
        );
    }
    let _ = writeln!(
        out,
        "Effective tax rate: {}%",
        format_two_places(result.effective_rate)
    );
    out
}

/// Renders a result as pretty-printed JSON. Amounts are unrounded strings.
pub fn render_json(result: &TaxCalculationResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tax_core::TaxDetail;

    use super::*;

    fn result_50000_in_2019() -> TaxCalculationResult {
        TaxCalculationResult {
            total_tax: dec!(7630.35),
            effective_rate: dec!(15.2607),
            tax_details: vec![
                TaxDetail {
                    range: "$0.00 - $47630.00".to_string(),
                    rate: dec!(15.00),
                    tax_amount: dec!(7144.500),
                },
                TaxDetail {
                    range: "$47630.00 - $95259.00".to_string(),
                    rate: dec!(20.500),
                    tax_amount: dec!(485.850),
                },
            ],
        }
    }

    #[test]
    fn text_lists_each_bracket() {
        assert_eq!(
            render_text(&result_50000_in_2019()),
            "Total tax: $7630.35\n\
             Income between $0.00 - $47630.00 taxed at 15.00%: $7144.50\n\
             Income between $47630.00 - $95259.00 taxed at 20.50%: $485.85\n\
             Effective tax rate: 15.26%\n"
        );
    }

    #[test]
    fn text_for_zero_tax_has_no_breakdown() {
        let result = TaxCalculationResult {
            total_tax: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            tax_details: Vec::new(),
        };

        assert_eq!(
            render_text(&result),
            "Total tax: $0.00\nEffective tax rate: 0.00%\n"
        );
    }

    #[test]
    fn json_carries_all_fields() {
        let json = render_json(&result_50000_in_2019()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_tax"], "7630.35");
        assert_eq!(value["tax_details"][1]["range"], "$47630.00 - $95259.00");
        assert_eq!(value["tax_details"].as_array().map(Vec::len), Some(2));
    }
}
