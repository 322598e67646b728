//! Common utility functions for tax calculations.
//!
//! This module provides shared functionality used wherever calculated
//! amounts cross into presentation, including rounding and fixed-point
//! formatting.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Arguments
///
/// * `value` - The decimal value to round
///
/// # Returns
///
/// The value rounded to two decimal places.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(123.456)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a value with exactly two decimal places, rounding half-up.
///
/// Whole numbers are padded, so `47630` renders as `"47630.00"`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::format_two_places;
///
/// assert_eq!(format_two_places(dec!(47630)), "47630.00");
/// assert_eq!(format_two_places(dec!(7144.5)), "7144.50");
/// assert_eq!(format_two_places(dec!(9763.945)), "9763.95");
/// ```
pub fn format_two_places(value: Decimal) -> String {
    let mut rounded = round_half_up(value);
    rounded.rescale(2);
    rounded.to_string()
}

/// Formats a value as a dollar amount with two decimal places.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::format_currency;
///
/// assert_eq!(format_currency(dec!(0)), "$0.00");
/// assert_eq!(format_currency(dec!(210371)), "$210371.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format!("${}", format_two_places(value))
}
