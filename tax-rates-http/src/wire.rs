use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tax_core::{TaxBracket, TaxBracketSet};

/// One bracket as served by `GET /tax-calculator/tax-year/{year}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracketPayload {
    pub min: Decimal,
    /// Omitted for the top bracket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

/// Response body of `GET /tax-calculator/tax-year/{year}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRatesResponse {
    pub tax_brackets: Vec<TaxBracketPayload>,
}

impl TaxRatesResponse {
    /// Converts the payload into a schedule for `tax_year`, in the order served.
    pub fn into_bracket_set(
        self,
        tax_year: i32,
    ) -> TaxBracketSet {
        let brackets = self
            .tax_brackets
            .into_iter()
            .map(|b| TaxBracket::new(b.min, b.max, b.rate))
            .collect();
        TaxBracketSet::new(tax_year, brackets)
    }
}
