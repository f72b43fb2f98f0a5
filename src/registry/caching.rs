use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::core::cache::Cache;
use crate::core::currency::{CurrencyCode, CurrencyRegistry};
use crate::core::error::FxResult;

/// Memoizes registry reads. Any write through [`CurrencyRegistry::add_currencies`]
/// clears both caches.
pub struct CachingRegistry<R: CurrencyRegistry> {
    inner: R,
    listing: Cache<(), Vec<CurrencyCode>>,
    lookups: Cache<String, Option<CurrencyCode>>,
    // Held shared while a miss is being filled and exclusively while writing,
    // so a fill that raced a write can never land after the invalidation.
    gate: RwLock<()>,
}

impl<R: CurrencyRegistry> CachingRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            listing: Cache::new(),
            lookups: Cache::new(),
            gate: RwLock::new(()),
        }
    }

    pub async fn invalidate_all(&self) {
        self.listing.clear().await;
        self.lookups.clear().await;
    }
}

#[async_trait]
impl<R: CurrencyRegistry> CurrencyRegistry for CachingRegistry<R> {
    async fn list_currencies(&self) -> FxResult<Vec<CurrencyCode>> {
        if let Some(cached) = self.listing.get(&()).await {
            return Ok(cached);
        }

        let _fill = self.gate.read().await;
        let currencies = self.inner.list_currencies().await?;
        self.listing.put((), currencies.clone()).await;
        Ok(currencies)
    }

    async fn find_currency(&self, name: &str) -> FxResult<Option<CurrencyCode>> {
        let key = name.to_string();
        if let Some(cached) = self.lookups.get(&key).await {
            return Ok(cached);
        }

        let _fill = self.gate.read().await;
        let found = self.inner.find_currency(name).await?;
        self.lookups.put(key, found.clone()).await;
        Ok(found)
    }

    async fn add_currencies(&self, codes: Vec<CurrencyCode>) -> FxResult<Vec<CurrencyCode>> {
        let _write = self.gate.write().await;
        let result = self.inner.add_currencies(codes).await;
        // Invalidate even on failure; the inner store may have partially applied it.
        self.invalidate_all().await;
        debug!("Currency caches invalidated");
        result
    }
}
