//! HTTP client for the remote tax rate service.
//!
//! Registers as the `http` backend of a [`tax_core::rates::ProviderRegistry`].

mod factory;
mod provider;
mod wire;

pub use factory::HttpRateProviderFactory;
pub use provider::HttpRateProvider;
pub use wire::{TaxBracketPayload, TaxRatesResponse};
