use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, instrument};

use super::util::{RetryPolicy, is_transient, with_retry};
use crate::core::config::{BundesbankProviderConfig, HttpConfig};
use crate::core::currency::CurrencyCode;
use crate::core::error::{FxError, FxResult};
use crate::core::RateFetcher;

const CURRENCY_PLACEHOLDER: &str = "{currency}";

/// Fetches daily exchange-rate series from the Bundesbank statistics API.
pub struct BundesbankFetcher {
    client: Client,
    config: BundesbankProviderConfig,
    retry: RetryPolicy,
}

impl BundesbankFetcher {
    pub fn new(
        config: BundesbankProviderConfig,
        http: &HttpConfig,
        retry: RetryPolicy,
    ) -> FxResult<Self> {
        let client = Client::builder()
            .user_agent("fxref/1.0")
            .connect_timeout(http.connect_timeout())
            .timeout(http.read_timeout())
            .build()
            .map_err(FxError::Client)?;
        Ok(Self::with_client(client, config, retry))
    }

    pub fn with_client(client: Client, config: BundesbankProviderConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            config,
            retry,
        }
    }

    /// `{base_url}/{series_path}?format=..&lang=..` with the currency code
    /// substituted into the path. Codes that are not plain alphanumerics are
    /// rejected before they reach the request line.
    pub fn series_url(&self, currency: &CurrencyCode) -> FxResult<String> {
        if !currency.is_well_formed() {
            return Err(FxError::UnknownCurrency(currency.to_string()));
        }
        let base = self.config.base_url.trim_end_matches('/');
        let path = self
            .config
            .series_path
            .trim_start_matches('/')
            .replace(CURRENCY_PLACEHOLDER, currency.as_str());
        Ok(format!(
            "{}/{}?format={}&lang={}",
            base, path, self.config.format, self.config.lang
        ))
    }

    async fn get_document(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }
}

#[async_trait]
impl RateFetcher for BundesbankFetcher {
    #[instrument(name = "BundesbankFetch", skip(self), fields(currency = %currency))]
    async fn fetch(&self, currency: &CurrencyCode) -> FxResult<String> {
        let url = self.series_url(currency)?;
        debug!("Requesting rate series from {}", url);

        let document = with_retry(|| self.get_document(&url), &self.retry, is_transient)
            .await
            .map_err(|e| {
                error!(
                    error = ?e.error,
                    attempts = e.attempts,
                    url = %url,
                    "Unable to retrieve FX rate data"
                );
                FxError::UpstreamUnavailable {
                    currency: currency.clone(),
                    attempts: e.attempts,
                    source: e.error,
                }
            })?;

        debug!(bytes = document.len(), "Received rate series");
        Ok(document)
    }
}
