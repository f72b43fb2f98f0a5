//! Currency codes and the registry abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::error::FxResult;

/// Daily reference-rate currencies published against EUR, used when the
/// registry has nothing configured.
pub const BUILTIN_CURRENCIES: &[&str] = &[
    "AUD", "BGN", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "GBP", "HKD", "HUF", "IDR", "ILS",
    "INR", "ISK", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PLN", "RON", "SEK", "SGD",
    "THB", "TRY", "USD", "ZAR",
];

/// A currency identifier such as `INR` or `GBP`. Comparison is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty and ASCII alphanumeric only, so the code can be placed in
    /// an upstream series key as-is.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_alphanumeric())
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Source of known currency codes.
#[async_trait]
pub trait CurrencyRegistry: Send + Sync {
    async fn list_currencies(&self) -> FxResult<Vec<CurrencyCode>>;

    async fn find_currency(&self, name: &str) -> FxResult<Option<CurrencyCode>>;

    /// Adds codes to the registry and returns the full set after the write.
    async fn add_currencies(&self, codes: Vec<CurrencyCode>) -> FxResult<Vec<CurrencyCode>>;
}
