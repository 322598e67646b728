//! Validation of user-entered income and tax year.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use tax_core::{MAX_TAX_YEAR, MIN_TAX_YEAR, is_supported_tax_year};
use thiserror::Error;

/// Plain digits or comma-grouped thousands, optional `$` and fraction.
static INCOME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$").expect("income pattern is valid")
});

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a valid annual income.")]
    InvalidIncome,

    #[error("Please select a tax year between {} and {}.", MIN_TAX_YEAR, MAX_TAX_YEAR)]
    InvalidYear,
}

/// A validated calculation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRequest {
    pub annual_income: Decimal,
    pub tax_year: i32,
}

/// Parses a positive income such as `85000`, `85,000.50` or `$85,000`.
pub fn parse_income(input: &str) -> Result<Decimal, FormError> {
    let trimmed = input.trim();
    if !INCOME_PATTERN.is_match(trimmed) {
        tracing::debug!(input = %input, "rejected income");
        return Err(FormError::InvalidIncome);
    }

    let income: Decimal = trimmed
        .trim_start_matches('$')
        .replace(',', "")
        .parse()
        .map_err(|_| FormError::InvalidIncome)?;

    if income <= Decimal::ZERO {
        return Err(FormError::InvalidIncome);
    }
    Ok(income)
}

/// Parses a tax year within the offered range.
pub fn parse_tax_year(input: &str) -> Result<i32, FormError> {
    input
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|year| is_supported_tax_year(*year))
        .ok_or(FormError::InvalidYear)
}

/// Validates both fields, reporting the income first as the form does.
pub fn validate(
    annual_income: &str,
    tax_year: &str,
) -> Result<TaxRequest, FormError> {
    Ok(TaxRequest {
        annual_income: parse_income(annual_income)?,
        tax_year: parse_tax_year(tax_year)?,
    })
}
