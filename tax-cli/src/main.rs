use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tax_core::MAX_TAX_YEAR;
use tracing::debug;

use tax_cli::app::{self, Estimator, OutputFormat};
use tax_cli::config::AppConfig;
use tax_cli::logging;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Progressive income tax estimator.
///
/// Looks up the bracket schedule for the requested tax year, then prints the
/// total tax, the breakdown by bracket, and the effective rate. Without
/// `--income`, reads `<income> [year]` lines from stdin.
#[derive(Debug, Parser)]
#[command(name = "tax-estimator", version)]
struct Cli {
    /// Annual income, e.g. `85000` or `85,000.00`.
    #[arg(long, allow_hyphen_values = true)]
    income: Option<String>,

    /// Tax year to calculate for.
    #[arg(long, default_value_t = MAX_TAX_YEAR.to_string())]
    year: String,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rate provider backend (`http` or `csv`).
    #[arg(long)]
    backend: Option<String>,

    /// Provider source: service base URL, CSV path, or `bundled`.
    #[arg(long)]
    source: Option<String>,

    /// Request timeout for the `http` backend.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Log filter, e.g. `debug` or `tax_core=trace`. `RUST_LOG` takes precedence.
    #[arg(long)]
    log_level: Option<String>,

    /// Append logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Suppress log output on stderr.
    #[arg(long, short)]
    quiet: bool,
}

impl Cli {
    /// Flags win over the config file.
    fn apply_overrides(
        &self,
        config: &mut AppConfig,
    ) {
        if let Some(backend) = &self.backend {
            config.provider.backend = backend.clone();
        }
        if let Some(source) = &self.source {
            config.provider.source = source.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.provider.timeout_secs = timeout_secs;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }

    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init_default_logging();

    let cli = Cli::parse();
    if cli.quiet {
        logging::set_console_enabled(false);
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);

    if std::env::var_os("RUST_LOG").is_none() {
        logging::set_log_level(&config.logging.level)?;
    }
    if let Some(file) = &config.logging.file {
        logging::enable_file_logging(file)?;
    }

    let provider_config = config.provider_config();
    debug!("using {} rate provider", provider_config.backend);
    let provider = app::build_registry()
        .create(&provider_config)
        .await
        .with_context(|| format!("cannot create '{}' rate provider", provider_config.backend))?;
    let estimator = Estimator::new(Arc::from(provider));
    let format = cli.output_format();

    let Some(income) = &cli.income else {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout().lock();
        app::run_session(&estimator, stdin, &mut stdout, &cli.year, format).await?;
        return Ok(ExitCode::SUCCESS);
    };

    match estimator.submit(income, &cli.year).await {
        Ok(result) => {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{}", format.render(&result)?)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            eprintln!("{error}");
            Ok(ExitCode::FAILURE)
        }
    }
}
