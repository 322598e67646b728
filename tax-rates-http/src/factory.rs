use std::time::Duration;

use async_trait::async_trait;
use tax_core::rates::{ProviderConfig, RateProviderFactory};
use tax_core::{ProviderError, RateProvider};
use url::Url;

use crate::provider::HttpRateProvider;

/// [`RateProviderFactory`] for the remote tax rate service.
///
/// `source` is the service base URL; `timeout_secs` bounds each request.
///
/// ```rust,no_run
/// use tax_core::rates::ProviderRegistry;
/// use tax_rates_http::HttpRateProviderFactory;
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(Box::new(HttpRateProviderFactory));
/// ```
pub struct HttpRateProviderFactory;

#[async_trait]
impl RateProviderFactory for HttpRateProviderFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn RateProvider>, ProviderError> {
        let base_url = Url::parse(config.source.trim()).map_err(|e| {
            ProviderError::Configuration(format!("invalid base URL '{}': {e}", config.source))
        })?;
        let provider = HttpRateProvider::new(base_url, Duration::from_secs(config.timeout_secs))?;
        Ok(Box::new(provider))
    }
}
