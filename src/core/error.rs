//! Error taxonomy for rate retrieval and conversion.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::currency::CurrencyCode;

#[derive(Debug, Error)]
pub enum FxError {
    /// The requested currency is not present in the registry.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// The upstream could not be reached, either after exhausting retries or
    /// on a non-transient transport failure.
    #[error("Unable to retrieve FX rate data for {currency} after {attempts} attempt(s)")]
    UpstreamUnavailable {
        currency: CurrencyCode,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered, but without a usable series.
    #[error("Rate data is unavailable for currency: {0}")]
    UpstreamDataUnavailable(CurrencyCode),

    /// No published rate exists for the date.
    #[error("Conversion rate not found for date {0}")]
    ConversionRateNotFound(NaiveDate),

    /// The upstream published a rate that cannot be used as a divisor.
    #[error("Invalid rate '{value}' published for {currency}")]
    InvalidRate { currency: CurrencyCode, value: String },

    /// The published rate is valid but `amount / rate` exceeds the decimal range.
    #[error("Converting {amount} {currency} at rate {rate} overflows")]
    ConversionOverflow {
        currency: CurrencyCode,
        amount: Decimal,
        rate: String,
    },

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

pub type FxResult<T> = Result<T, FxError>;
