use async_trait::async_trait;
use thiserror::Error;

use crate::models::TaxBracketSet;

/// Message carried by [`ProviderError::Unavailable`].
pub const UNAVAILABLE_MESSAGE: &str = "Failed to fetch tax rates. Please try again later.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The remote service could not be reached or answered with an error.
    /// Details are logged by the provider, never surfaced.
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable,

    #[error("No tax brackets available for {0}")]
    NotFound(i32),

    #[error("Malformed tax bracket data: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Provider-specific failure, shown to the caller as-is.
    #[error("{0}")]
    Other(String),
}

/// Source of bracket schedules, one tax year at a time.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_brackets(&self, tax_year: i32) -> Result<TaxBracketSet, ProviderError>;
}
