use std::sync::Arc;
use tracing::debug;

use super::currency::{CurrencyCode, CurrencyRegistry};
use super::error::{FxError, FxResult};

/// Decides which currencies a rate request covers.
pub struct CurrencySetResolver {
    registry: Arc<dyn CurrencyRegistry>,
}

impl CurrencySetResolver {
    pub fn new(registry: Arc<dyn CurrencyRegistry>) -> Self {
        Self { registry }
    }

    /// Without a filter (or with a blank one) every registered currency is
    /// returned. A filter must name a registered currency exactly.
    pub async fn resolve(&self, filter: Option<&str>) -> FxResult<Vec<CurrencyCode>> {
        match filter.filter(|f| !f.trim().is_empty()) {
            None => self.registry.list_currencies().await,
            Some(name) => match self.registry.find_currency(name).await? {
                Some(code) => Ok(vec![code]),
                None => {
                    debug!("Currency {} is not registered", name);
                    Err(FxError::UnknownCurrency(name.to_string()))
                }
            },
        }
    }
}
