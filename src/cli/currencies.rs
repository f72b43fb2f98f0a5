use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::core::FxRateService;
use crate::core::config::AppConfig;
use crate::core::currency::{BUILTIN_CURRENCIES, CurrencyCode};

/// Registered currencies, or the built-in list when none are registered.
pub async fn list_available_currencies(service: &FxRateService) -> Result<Vec<String>> {
    let registered = service.list_currencies().await?;
    if registered.is_empty() {
        return Ok(BUILTIN_CURRENCIES.iter().map(|c| c.to_string()).collect());
    }
    Ok(registered.into_iter().map(|c| c.to_string()).collect())
}

pub async fn run(service: &FxRateService) -> Result<()> {
    for code in list_available_currencies(service).await? {
        println!("{code}");
    }
    Ok(())
}

/// Registers `codes` with the service and writes the resulting set back to
/// the `currencies` list of the configuration file at `path`.
pub async fn add_currencies(
    service: &FxRateService,
    config: &AppConfig,
    path: &Path,
    codes: &[String],
) -> Result<Vec<String>> {
    let codes = codes.iter().map(|c| CurrencyCode::from(c.as_str())).collect();
    let registered = service.add_currencies(codes).await?;

    let mut updated = config.clone();
    updated.currencies = registered.iter().map(|c| c.to_string()).collect();
    updated.save_to_path(path)?;
    info!(
        count = updated.currencies.len(),
        "Saved currencies to {}",
        path.display()
    );
    Ok(updated.currencies)
}

pub async fn run_add(
    service: &FxRateService,
    config: &AppConfig,
    path: &Path,
    codes: &[String],
) -> Result<()> {
    for code in add_currencies(service, config, path, codes).await? {
        println!("{code}");
    }
    Ok(())
}
