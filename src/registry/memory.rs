use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::currency::{CurrencyCode, CurrencyRegistry};
use crate::core::error::FxResult;

/// Insertion-ordered, process-local currency registry.
#[derive(Default)]
pub struct MemoryRegistry {
    currencies: RwLock<Vec<CurrencyCode>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `codes`, dropping duplicates.
    pub fn with_currencies<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut currencies: Vec<CurrencyCode> = Vec::new();
        for code in codes.into_iter().map(CurrencyCode::new) {
            if !currencies.contains(&code) {
                currencies.push(code);
            }
        }
        Self {
            currencies: RwLock::new(currencies),
        }
    }
}

#[async_trait]
impl CurrencyRegistry for MemoryRegistry {
    async fn list_currencies(&self) -> FxResult<Vec<CurrencyCode>> {
        Ok(self.currencies.read().await.clone())
    }

    async fn find_currency(&self, name: &str) -> FxResult<Option<CurrencyCode>> {
        let currencies = self.currencies.read().await;
        Ok(currencies.iter().find(|c| c.as_str() == name).cloned())
    }

    async fn add_currencies(&self, codes: Vec<CurrencyCode>) -> FxResult<Vec<CurrencyCode>> {
        let mut currencies = self.currencies.write().await;
        for code in codes {
            if currencies.contains(&code) {
                debug!("Currency {} already registered", code);
                continue;
            }
            debug!("Registering currency {}", code);
            currencies.push(code);
        }
        Ok(currencies.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_currencies_keeps_order_and_drops_duplicates() {
        let registry = MemoryRegistry::with_currencies(["INR", "GBP", "INR"]);
        let listed = registry.list_currencies().await.unwrap();
        assert_eq!(listed, vec![CurrencyCode::from("INR"), CurrencyCode::from("GBP")]);
    }

    #[tokio::test]
    async fn test_find_currency_is_exact() {
        let registry = MemoryRegistry::with_currencies(["INR"]);
        assert_eq!(
            registry.find_currency("INR").await.unwrap(),
            Some(CurrencyCode::from("INR"))
        );
        assert!(registry.find_currency("inr").await.unwrap().is_none());
        assert!(registry.find_currency("USD").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_currencies_returns_full_set() {
        let registry = MemoryRegistry::new();
        registry
            .add_currencies(vec![CurrencyCode::from("AUD")])
            .await
            .unwrap();
        let all = registry
            .add_currencies(vec![CurrencyCode::from("BRL"), CurrencyCode::from("AUD")])
            .await
            .unwrap();
        assert_eq!(all, vec![CurrencyCode::from("AUD"), CurrencyCode::from("BRL")]);
    }
}
