pub mod cache;
pub mod factory;
pub mod provider;

pub use cache::{RateCache, RateLookupError, RateState, RateStatus};
pub use factory::{ProviderConfig, ProviderRegistry, RateProviderFactory};
pub use provider::{ProviderError, RateProvider};
