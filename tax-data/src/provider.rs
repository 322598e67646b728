use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use tax_core::rates::{ProviderConfig, RateProviderFactory};
use tax_core::{ProviderError, RateProvider, TaxBracketSet};
use tracing::debug;

use crate::loader::{TaxBracketLoader, TaxBracketLoaderError};

/// Federal schedules for 2019 through 2022, compiled into the binary.
const BUNDLED_BRACKETS: &str = include_str!("../data/federal_brackets.csv");

/// Serves bracket schedules parsed up front from a CSV source.
#[derive(Debug, Clone)]
pub struct CsvRateProvider {
    schedules: BTreeMap<i32, TaxBracketSet>,
}

impl CsvRateProvider {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TaxBracketLoaderError> {
        Ok(Self {
            schedules: TaxBracketLoader::load(reader)?,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, ProviderError> {
        let file = File::open(path)
            .map_err(|e| ProviderError::Io(format!("cannot open '{}': {e}", path.display())))?;
        Self::from_reader(file).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    /// The schedules shipped with the crate.
    pub fn bundled() -> Result<Self, TaxBracketLoaderError> {
        Self::from_reader(BUNDLED_BRACKETS.as_bytes())
    }

    /// Tax years present in the source, ascending.
    pub fn tax_years(&self) -> Vec<i32> {
        self.schedules.keys().copied().collect()
    }
}

#[async_trait]
impl RateProvider for CsvRateProvider {
    async fn fetch_brackets(
        &self,
        tax_year: i32,
    ) -> Result<TaxBracketSet, ProviderError> {
        debug!(tax_year, "looking up csv schedule");
        self.schedules
            .get(&tax_year)
            .cloned()
            .ok_or(ProviderError::NotFound(tax_year))
    }
}

/// [`RateProviderFactory`] for CSV bracket files.
///
/// `source` is a path to a CSV file, or empty / `"bundled"` for the
/// schedules compiled into the crate.
pub struct CsvRateProviderFactory;

#[async_trait]
impl RateProviderFactory for CsvRateProviderFactory {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    async fn create(
        &self,
        config: &ProviderConfig,
    ) -> Result<Box<dyn RateProvider>, ProviderError> {
        let source = config.source.trim();
        let provider = if source.is_empty() || source == "bundled" {
            CsvRateProvider::bundled().map_err(|e| ProviderError::Malformed(e.to_string()))?
        } else {
            CsvRateProvider::from_path(Path::new(source))?
        };
        debug!(years = ?provider.tax_years(), "csv rate provider ready");
        Ok(Box::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::{MAX_TAX_YEAR, tax_years};

    use super::*;

    fn csv_config(source: &str) -> ProviderConfig {
        ProviderConfig {
            backend: "csv".to_string(),
            source: source.to_string(),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn bundled_schedules_cover_every_offered_year() {
        let provider = CsvRateProvider::bundled().unwrap();

        assert_eq!(provider.tax_years(), tax_years().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn bundled_2022_schedule_has_five_brackets() {
        let provider = CsvRateProvider::bundled().unwrap();

        let set = provider.fetch_brackets(MAX_TAX_YEAR).await.unwrap();

        assert_eq!(set.tax_year(), 2022);
        assert_eq!(set.len(), 5);
        assert_eq!(set.brackets()[4].min_income, dec!(221708));
        assert_eq!(set.brackets()[4].max_income, None);
    }

    #[tokio::test]
    async fn missing_year_is_not_found() {
        let provider = CsvRateProvider::bundled().unwrap();

        assert_eq!(
            provider.fetch_brackets(2018).await,
            Err(ProviderError::NotFound(2018))
        );
    }

    #[test]
    fn backend_name_is_csv() {
        assert_eq!(CsvRateProviderFactory.backend_name(), "csv");
    }

    #[tokio::test]
    async fn factory_uses_bundled_data_for_empty_source() {
        let provider = CsvRateProviderFactory.create(&csv_config("")).await.unwrap();

        assert!(provider.fetch_brackets(2019).await.is_ok());
    }

    #[tokio::test]
    async fn factory_reports_missing_file() {
        let result = CsvRateProviderFactory
            .create(&csv_config("/this/path/does/not/exist.csv"))
            .await;

        assert!(matches!(result, Err(ProviderError::Io(_))));
    }
}
