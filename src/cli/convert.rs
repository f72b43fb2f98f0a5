use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::ui;
use crate::core::currency::BUILTIN_CURRENCIES;
use crate::core::{CurrencyCode, FxRateService};

/// Accepts only currencies from the built-in reference list.
pub fn parse_currency(s: &str) -> Result<String> {
    let code = s.trim();
    if !BUILTIN_CURRENCIES.contains(&code) {
        return Err(anyhow!(
            "Unsupported currency '{s}'. Expected one of: {}",
            BUILTIN_CURRENCIES.join(", ")
        ));
    }
    Ok(code.to_string())
}

/// Parses a strictly positive decimal amount.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(s.trim()).map_err(|e| anyhow!("Invalid amount '{s}': {e}"))?;
    if amount <= Decimal::ZERO {
        return Err(anyhow!("Amount must be a positive number"));
    }
    Ok(amount)
}

pub fn display_conversion(
    date: NaiveDate,
    currency: &CurrencyCode,
    amount: Decimal,
    converted: Decimal,
) -> String {
    format!(
        "{} {} = {} on {}",
        amount,
        ui::style_text(currency.as_str(), ui::StyleType::TotalLabel),
        ui::style_text(&format!("{converted} EUR"), ui::StyleType::TotalValue),
        date
    )
}

pub async fn run(
    service: &FxRateService,
    date: NaiveDate,
    currency: &str,
    amount: Decimal,
    json: bool,
) -> Result<()> {
    let currency = CurrencyCode::from(currency);
    let pb = ui::new_spinner("Fetching rate...");
    let result = service.convert(date, &currency, amount).await;
    pb.finish_and_clear();
    let converted = result?;

    if json {
        println!("{}", serde_json::to_string(&converted.to_string())?);
    } else {
        println!("{}", display_conversion(date, &currency, amount, converted));
    }
    Ok(())
}
