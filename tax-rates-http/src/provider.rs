use std::time::Duration;

use async_trait::async_trait;
use tax_core::{ProviderError, RateProvider, TaxBracketSet};
use tracing::{debug, warn};
use url::Url;

use crate::wire::TaxRatesResponse;

/// Path of the per-year endpoint, relative to the service base URL.
const ENDPOINT_PREFIX: &str = "tax-calculator/tax-year";

/// Client for the remote tax rate service.
///
/// Every failure to obtain a decodable response is reported as
/// [`ProviderError::Unavailable`]; the cause is logged, not returned.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpRateProvider {
    pub fn new(
        base_url: Url,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// `{base_url}/tax-calculator/tax-year/{tax_year}`
    pub fn endpoint(
        &self,
        tax_year: i32,
    ) -> Result<Url, ProviderError> {
        self.base_url
            .join(&format!("{ENDPOINT_PREFIX}/{tax_year}"))
            .map_err(|e| ProviderError::Configuration(format!("invalid endpoint URL: {e}")))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch_brackets(
        &self,
        tax_year: i32,
    ) -> Result<TaxBracketSet, ProviderError> {
        let url = self.endpoint(tax_year)?;
        debug!(%url, "requesting tax brackets");

        let resp = self.http.get(url.clone()).send().await.map_err(|error| {
            warn!(%url, %error, "tax rate request failed");
            ProviderError::Unavailable
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, status, %body, "tax rate service returned an error");
            return Err(ProviderError::Unavailable);
        }

        let payload: TaxRatesResponse = resp.json().await.map_err(|error| {
            warn!(%url, %error, "tax rate response could not be decoded");
            ProviderError::Unavailable
        })?;

        let set = payload.into_bracket_set(tax_year);
        set.validate()
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(set)
    }
}
