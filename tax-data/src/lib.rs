//! File-backed tax bracket data.
//!
//! Parses bracket schedules from CSV and serves them through the
//! [`tax_core::RateProvider`] contract as the `csv` backend.

pub mod loader;
pub mod provider;

pub use loader::{TaxBracketLoader, TaxBracketLoaderError, TaxBracketRecord};
pub use provider::{CsvRateProvider, CsvRateProviderFactory};
