use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{BracketSetError, TaxBracket, TaxBracketSet};
use thiserror::Error;

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error)]
pub enum TaxBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid brackets for tax year {tax_year}: {source}")]
    InvalidSchedule {
        tax_year: i32,
        #[source]
        source: BracketSetError,
    },
}

impl From<csv::Error> for TaxBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxBracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the tax brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2020)
/// - `min_income`: The inclusive lower bound of the bracket
/// - `max_income`: The upper bound of the bracket (empty for unlimited)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.205 for 20.5%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub tax_year: i32,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for tax bracket data from CSV files.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse tax bracket records from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file or
    /// a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxBracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: TaxBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Group records into one schedule per tax year.
    ///
    /// Rows may appear in any order; each year's rows are sorted by
    /// `min_income` and the resulting schedule is validated.
    pub fn group(
        records: &[TaxBracketRecord]
    ) -> Result<BTreeMap<i32, TaxBracketSet>, TaxBracketLoaderError> {
        let mut by_year: BTreeMap<i32, Vec<TaxBracket>> = BTreeMap::new();
        for record in records {
            by_year
                .entry(record.tax_year)
                .or_default()
                .push(TaxBracket::new(record.min_income, record.max_income, record.rate));
        }

        by_year
            .into_iter()
            .map(|(tax_year, mut brackets)| {
                brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
                let set = TaxBracketSet::new(tax_year, brackets);
                set.validate()
                    .map_err(|source| TaxBracketLoaderError::InvalidSchedule { tax_year, source })?;
                Ok((tax_year, set))
            })
            .collect()
    }

    /// Parse and group in one step.
    pub fn load<R: Read>(reader: R) -> Result<BTreeMap<i32, TaxBracketSet>, TaxBracketLoaderError> {
        let records = Self::parse(reader)?;
        Self::group(&records)
    }
}
