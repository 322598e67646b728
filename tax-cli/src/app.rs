use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tax_core::calculations::compute_tax;
use tax_core::rates::ProviderRegistry;
use tax_core::{RateCache, RateLookupError, RateProvider, TaxCalculationResult};
use tax_data::CsvRateProviderFactory;
use tax_rates_http::HttpRateProviderFactory;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::form::{self, FormError, TaxRequest};
use crate::render;

/// Every provider backend this binary knows about.
pub fn build_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(HttpRateProviderFactory));
    registry.register(Box::new(CsvRateProviderFactory));
    registry
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn render(
        self,
        result: &TaxCalculationResult,
    ) -> Result<String> {
        Ok(match self {
            Self::Text => render::render_text(result),
            Self::Json => render::render_json(result)? + "\n",
        })
    }
}

/// Why a submission produced no result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Lookup(#[from] RateLookupError),
}

/// Owns the rate cache for the lifetime of the process and turns form
/// submissions into results.
pub struct Estimator {
    cache: RateCache,
}

impl Estimator {
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self {
            cache: RateCache::new(provider),
        }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub async fn estimate(
        &self,
        request: &TaxRequest,
    ) -> Result<TaxCalculationResult, RateLookupError> {
        let brackets = self.cache.get_brackets(request.tax_year).await?;
        let result = compute_tax(request.annual_income, brackets.brackets());
        debug!(
            tax_year = request.tax_year,
            total_tax = %result.total_tax,
            "calculated tax"
        );
        Ok(result)
    }

    /// Validates raw form input, then estimates.
    pub async fn submit(
        &self,
        annual_income: &str,
        tax_year: &str,
    ) -> Result<TaxCalculationResult, SubmitError> {
        let request = form::validate(annual_income, tax_year)?;
        Ok(self.estimate(&request).await?)
    }
}

/// Prompt printed once at the start of an interactive session.
pub const SESSION_PROMPT: &str =
    "Enter annual income and tax year (e.g. `85000 2021`), or `quit` to exit.";

/// Counts reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub calculated: usize,
    pub rejected: usize,
}

/// Reads `<income> [year]` lines until EOF or `quit`, writing one result or
/// error message per line. The year defaults to `default_year`.
pub async fn run_session<R, W>(
    estimator: &Estimator,
    input: R,
    output: &mut W,
    default_year: &str,
    format: OutputFormat,
) -> Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary = SessionSummary::default();
    let mut lines = input.lines();

    writeln!(output, "{SESSION_PROMPT}")?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let mut fields = line.split_whitespace();
        let income = fields.next().unwrap_or_default();
        let year = fields.next().unwrap_or(default_year);

        match estimator.submit(income, year).await {
            Ok(result) => {
                summary.calculated += 1;
                write!(output, "{}", format.render(&result)?)?;
            }
            Err(error) => {
                summary.rejected += 1;
                writeln!(output, "{error}")?;
            }
        }
        output.flush()?;
    }

    info!(
        calculated = summary.calculated,
        rejected = summary.rejected,
        cached_years = ?estimator.cache().cached_years(),
        "session finished"
    );
    Ok(summary)
}
