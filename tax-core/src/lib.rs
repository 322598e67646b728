pub mod calculations;
pub mod models;
pub mod rates;

pub use models::*;
pub use rates::{ProviderError, RateCache, RateLookupError, RateProvider};

/// Earliest tax year offered to users.
pub const MIN_TAX_YEAR: i32 = 2019;
/// Latest tax year offered to users.
pub const MAX_TAX_YEAR: i32 = 2022;

/// Every tax year offered to users, ascending.
pub fn tax_years() -> std::ops::RangeInclusive<i32> {
    MIN_TAX_YEAR..=MAX_TAX_YEAR
}

/// Whether `year` falls within [`MIN_TAX_YEAR`]..=[`MAX_TAX_YEAR`].
pub fn is_supported_tax_year(year: i32) -> bool {
    tax_years().contains(&year)
}
