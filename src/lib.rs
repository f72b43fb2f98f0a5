pub mod cli;
pub mod core;
pub mod providers;
pub mod registry;

use crate::core::FxRateService;
use crate::core::config::AppConfig;
use crate::providers::bundesbank::BundesbankFetcher;
use crate::providers::util::RetryPolicy;
use crate::registry::{CachingRegistry, MemoryRegistry};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Currencies,
    AddCurrencies {
        currencies: Vec<String>,
    },
    Rates {
        date: Option<NaiveDate>,
        currency: Option<String>,
        json: bool,
    },
    Convert {
        date: NaiveDate,
        currency: String,
        amount: Decimal,
        json: bool,
    },
}

/// Wires the registry, the upstream fetcher and the service from configuration.
pub fn build_service(config: &AppConfig) -> Result<FxRateService> {
    let registry = CachingRegistry::new(MemoryRegistry::with_currencies(
        config.currencies.iter().cloned(),
    ));
    let fetcher = BundesbankFetcher::new(
        config.providers.bundesbank.clone(),
        &config.http,
        RetryPolicy::from(&config.retry),
    )
    .context("Failed to create Bundesbank fetcher")?;

    Ok(
        FxRateService::new(Arc::new(registry), Arc::new(fetcher))
            .with_max_concurrent_fetches(config.max_concurrent_fetches),
    )
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxref starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_service(&config)?;

    match command {
        AppCommand::Currencies => cli::currencies::run(&service).await,
        AppCommand::AddCurrencies { currencies } => {
            let path = match config_path {
                Some(path) => PathBuf::from(path),
                None => AppConfig::default_config_path()?,
            };
            cli::currencies::run_add(&service, &config, &path, &currencies).await
        }
        AppCommand::Rates {
            date,
            currency,
            json,
        } => cli::rates::run(&service, date, currency.as_deref(), json).await,
        AppCommand::Convert {
            date,
            currency,
            amount,
            json,
        } => cli::convert::run(&service, date, &currency, amount, json).await,
    }
}
