//! Rate-table retrieval and amount conversion

use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::currency::{CurrencyCode, CurrencyRegistry};
use super::error::{FxError, FxResult};
use super::rates::{RateFetcher, RateSeries, RateTable, convert_amount, parse_rate};
use super::resolver::CurrencySetResolver;
use crate::providers::sdmx;

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

pub struct FxRateService {
    registry: Arc<dyn CurrencyRegistry>,
    resolver: CurrencySetResolver,
    fetcher: Arc<dyn RateFetcher>,
    max_concurrent_fetches: usize,
}

impl FxRateService {
    pub fn new(registry: Arc<dyn CurrencyRegistry>, fetcher: Arc<dyn RateFetcher>) -> Self {
        Self {
            resolver: CurrencySetResolver::new(Arc::clone(&registry)),
            registry,
            fetcher,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    /// Upper bound on upstream requests in flight during [`Self::get_rates`].
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit.max(1);
        self
    }

    pub async fn list_currencies(&self) -> FxResult<Vec<CurrencyCode>> {
        self.registry.list_currencies().await
    }

    pub async fn add_currencies(&self, codes: Vec<CurrencyCode>) -> FxResult<Vec<CurrencyCode>> {
        self.registry.add_currencies(codes).await
    }

    /// Fetches and decodes one currency's series. `Ok(None)` means the
    /// upstream answered without usable data.
    async fn load_series(&self, currency: &CurrencyCode) -> FxResult<Option<RateSeries>> {
        let document = self.fetcher.fetch(currency).await?;
        match sdmx::parse(&document) {
            Ok(Some(series)) => {
                debug!(
                    currency = %currency,
                    observations = series.observations.len(),
                    "Parsed rate series"
                );
                Ok(Some(series))
            }
            Ok(None) => {
                warn!(currency = %currency, "Upstream returned no series");
                Ok(None)
            }
            Err(e) => {
                warn!(currency = %currency, error = %e, "Discarding unreadable rate document");
                Ok(None)
            }
        }
    }

    /// Builds the rate table for the requested currencies.
    ///
    /// Without `date`, every published rate is returned. With `date`, each
    /// currency carries at most that one date: its rate, or the holiday
    /// marker when the upstream lists the date without a value. A currency
    /// whose series does not mention the date at all is left out, as is one
    /// whose document had no usable series.
    pub async fn get_rates(
        &self,
        date: Option<NaiveDate>,
        currency: Option<&str>,
    ) -> FxResult<RateTable> {
        let currencies = self.resolver.resolve(currency).await?;
        info!(count = currencies.len(), ?date, "Fetching rates");

        let loaded: Vec<(CurrencyCode, Option<RateSeries>)> = stream::iter(currencies)
            .map(|code| async move {
                let series = self.load_series(&code).await?;
                Ok::<_, FxError>((code, series))
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .try_collect()
            .await?;

        let mut table = RateTable::new();
        for (code, series) in loaded {
            let Some(series) = series else {
                continue;
            };
            let rates = match date {
                None => series.published_rates(),
                Some(date) => match series.rate_on(date) {
                    Some(rate) => BTreeMap::from([(date.to_string(), rate)]),
                    None => {
                        debug!(currency = %code, %date, "Date not present in series");
                        continue;
                    }
                },
            };
            table.insert(code, rates);
        }

        Ok(table)
    }

    /// Converts `amount` using the rate published for `currency` on `date`.
    /// The result is `amount / rate` rounded half-up to four digits.
    pub async fn convert(
        &self,
        date: NaiveDate,
        currency: &CurrencyCode,
        amount: Decimal,
    ) -> FxResult<Decimal> {
        let series = self
            .load_series(currency)
            .await?
            .ok_or_else(|| FxError::UpstreamDataUnavailable(currency.clone()))?;

        let rate = series
            .published_rate_on(date)
            .ok_or(FxError::ConversionRateNotFound(date))?;

        let divisor = parse_rate(rate).ok_or_else(|| FxError::InvalidRate {
            currency: currency.clone(),
            value: rate.to_string(),
        })?;
        let converted =
            convert_amount(amount, divisor).ok_or_else(|| FxError::ConversionOverflow {
                currency: currency.clone(),
                amount,
                rate: rate.to_string(),
            })?;
        debug!(currency = %currency, %date, %rate, %amount, %converted, "Converted amount");
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::{DailyRate, HOLIDAY_SENTINEL, Observation};
    use crate::providers::sdmx::fixtures;
    use crate::registry::{CachingRegistry, MemoryRegistry};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned documents per currency and counts calls.
    #[derive(Default)]
    struct MockFetcher {
        documents: HashMap<String, String>,
        calls: AtomicUsize,
        requested: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn with_series(mut self, currency: &str, observations: &[Observation]) -> Self {
            self.documents
                .insert(currency.to_string(), fixtures::document(currency, observations));
            self
        }

        fn with_document(mut self, currency: &str, document: &str) -> Self {
            self.documents
                .insert(currency.to_string(), document.to_string());
            self
        }
    }

    #[async_trait]
    impl RateFetcher for MockFetcher {
        async fn fetch(&self, currency: &CurrencyCode) -> FxResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested
                .lock()
                .unwrap()
                .push(currency.as_str().to_string());
            Ok(self
                .documents
                .get(currency.as_str())
                .cloned()
                .unwrap_or_else(fixtures::empty_document))
        }
    }

    /// Fails every call the way an unreachable upstream does.
    struct UnreachableFetcher;

    #[async_trait]
    impl RateFetcher for UnreachableFetcher {
        async fn fetch(&self, currency: &CurrencyCode) -> FxResult<String> {
            let source = reqwest::Client::new()
                .get("http://[::1")
                .build()
                .unwrap_err();
            Err(FxError::UpstreamUnavailable {
                currency: currency.clone(),
                attempts: 3,
                source,
            })
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service(codes: &[&str], fetcher: Arc<dyn RateFetcher>) -> FxRateService {
        let registry = CachingRegistry::new(MemoryRegistry::with_currencies(codes.iter().copied()));
        FxRateService::new(Arc::new(registry), fetcher)
    }

    fn inr_gbp_fetcher() -> MockFetcher {
        MockFetcher::default()
            .with_series(
                "INR",
                &[
                    Observation::new("2025-05-15", Some("95.8201")),
                    Observation::new("2025-05-16", Some("95.8200")),
                    Observation::new("2025-05-17", None),
                ],
            )
            .with_series(
                "GBP",
                &[
                    Observation::new("2025-05-16", Some("0.8427")),
                    Observation::new("2025-05-17", None),
                ],
            )
    }

    #[tokio::test]
    async fn test_all_rates_for_all_currencies() {
        let fetcher = Arc::new(inr_gbp_fetcher());
        let service = service(&["INR", "GBP"], fetcher.clone());

        let table = service.get_rates(None, None).await.unwrap();

        assert_eq!(table.len(), 2);
        let inr = &table[&CurrencyCode::from("INR")];
        assert_eq!(inr.len(), 2);
        assert_eq!(inr["2025-05-15"].as_str(), "95.8201");
        assert_eq!(inr["2025-05-16"].as_str(), "95.8200");
        let gbp = &table[&CurrencyCode::from("GBP")];
        assert_eq!(gbp.len(), 1);
        assert_eq!(gbp["2025-05-16"].as_str(), "0.8427");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rates_for_date_across_currencies() {
        let service = service(&["INR", "GBP"], Arc::new(inr_gbp_fetcher()));

        let table = service.get_rates(Some(date("2025-05-16")), None).await.unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table[&CurrencyCode::from("INR")]["2025-05-16"],
            DailyRate::Published("95.8200".to_string())
        );
        assert_eq!(
            table[&CurrencyCode::from("GBP")]["2025-05-16"],
            DailyRate::Published("0.8427".to_string())
        );
    }

    #[tokio::test]
    async fn test_holiday_date_records_sentinel() {
        let fetcher =
            MockFetcher::default().with_series("INR", &[Observation::new("2025-05-16", None)]);
        let service = service(&["INR"], Arc::new(fetcher));

        let table = service
            .get_rates(Some(date("2025-05-16")), Some("INR"))
            .await
            .unwrap();

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "INR": { "2025-05-16": HOLIDAY_SENTINEL } })
        );
    }

    #[tokio::test]
    async fn test_unknown_currency_makes_no_upstream_call() {
        let fetcher = Arc::new(inr_gbp_fetcher());
        let service = service(&["INR"], fetcher.clone());

        let err = service.get_rates(None, Some("CHF")).await.unwrap_err();

        assert!(matches!(err, FxError::UnknownCurrency(ref c) if c == "CHF"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_filter_only_fetches_that_currency() {
        let fetcher = Arc::new(inr_gbp_fetcher());
        let service = service(&["INR", "GBP"], fetcher.clone());

        let table = service.get_rates(None, Some("GBP")).await.unwrap();

        assert_eq!(table.keys().collect::<Vec<_>>(), vec![&CurrencyCode::from("GBP")]);
        assert_eq!(*fetcher.requested.lock().unwrap(), vec!["GBP".to_string()]);
    }

    // Unlike `convert`, a date that the series never mentions is not an
    // error here; the currency is simply left out of the table.
    #[tokio::test]
    async fn test_date_missing_from_series_omits_currency() {
        let service = service(&["INR", "GBP"], Arc::new(inr_gbp_fetcher()));

        let table = service.get_rates(Some(date("2025-05-15")), None).await.unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.contains_key(&CurrencyCode::from("INR")));
        assert!(!table.contains_key(&CurrencyCode::from("GBP")));
    }

    #[tokio::test]
    async fn test_unusable_documents_are_skipped() {
        let fetcher = inr_gbp_fetcher()
            .with_document("USD", &fixtures::empty_document())
            .with_document("JPY", "<html>Bad Gateway");
        let service = service(&["INR", "USD", "JPY", "GBP"], Arc::new(fetcher));

        let table = service.get_rates(None, None).await.unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table.contains_key(&CurrencyCode::from("USD")));
        assert!(!table.contains_key(&CurrencyCode::from("JPY")));
    }

    #[tokio::test]
    async fn test_upstream_failure_fails_the_request() {
        let service = service(&["INR", "GBP"], Arc::new(UnreachableFetcher));

        let err = service.get_rates(None, None).await.unwrap_err();

        assert!(matches!(err, FxError::UpstreamUnavailable { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_get_rates_is_idempotent() {
        let service = service(&["INR", "GBP"], Arc::new(inr_gbp_fetcher()))
            .with_max_concurrent_fetches(1);

        let first = service.get_rates(None, None).await.unwrap();
        let second = service.get_rates(None, None).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_added_currency_is_queried_next_time() {
        let fetcher = Arc::new(inr_gbp_fetcher());
        let service = service(&["INR"], fetcher.clone());

        assert_eq!(service.get_rates(None, None).await.unwrap().len(), 1);
        service
            .add_currencies(vec![CurrencyCode::from("GBP")])
            .await
            .unwrap();

        let table = service.get_rates(None, None).await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(service.list_currencies().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_convert_divides_and_rounds() {
        let service = service(&[], Arc::new(inr_gbp_fetcher()));

        let result = service
            .convert(date("2025-05-16"), &CurrencyCode::from("INR"), dec!(500.0))
            .await
            .unwrap();

        assert_eq!(result, dec!(5.2181));
    }

    #[tokio::test]
    async fn test_convert_does_not_consult_registry() {
        let fetcher =
            MockFetcher::default().with_series("CAD", &[Observation::new("2025-05-16", Some("1.5"))]);
        let service = service(&["INR"], Arc::new(fetcher));

        let result = service
            .convert(date("2025-05-16"), &CurrencyCode::from("CAD"), dec!(3))
            .await
            .unwrap();

        assert_eq!(result, dec!(2));
    }

    #[tokio::test]
    async fn test_convert_missing_date() {
        let service = service(&[], Arc::new(inr_gbp_fetcher()));

        let err = service
            .convert(date("2025-06-02"), &CurrencyCode::from("INR"), dec!(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FxError::ConversionRateNotFound(d) if d == date("2025-06-02")));
        assert_eq!(err.to_string(), "Conversion rate not found for date 2025-06-02");
    }

    #[tokio::test]
    async fn test_convert_holiday_has_no_rate() {
        let service = service(&[], Arc::new(inr_gbp_fetcher()));

        let err = service
            .convert(date("2025-05-17"), &CurrencyCode::from("INR"), dec!(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FxError::ConversionRateNotFound(_)));
    }

    #[tokio::test]
    async fn test_convert_without_series() {
        let service = service(&[], Arc::new(MockFetcher::default()));

        let err = service
            .convert(date("2025-05-16"), &CurrencyCode::from("INR"), dec!(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FxError::UpstreamDataUnavailable(ref c) if c.as_str() == "INR"));
        assert_eq!(err.to_string(), "Rate data is unavailable for currency: INR");
    }

    #[tokio::test]
    async fn test_convert_zero_rate_is_rejected() {
        let fetcher =
            MockFetcher::default().with_series("INR", &[Observation::new("2025-05-16", Some("0"))]);
        let service = service(&[], Arc::new(fetcher));

        let err = service
            .convert(date("2025-05-16"), &CurrencyCode::from("INR"), dec!(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FxError::InvalidRate { ref value, .. } if value == "0"));
    }

    #[tokio::test]
    async fn test_convert_overflow_keeps_valid_rate() {
        let fetcher = MockFetcher::default()
            .with_series("INR", &[Observation::new("2025-05-16", Some("0.5"))]);
        let service = service(&[], Arc::new(fetcher));

        let err = service
            .convert(date("2025-05-16"), &CurrencyCode::from("INR"), Decimal::MAX)
            .await
            .unwrap_err();

        match err {
            FxError::ConversionOverflow {
                currency,
                amount,
                rate,
            } => {
                assert_eq!(currency.as_str(), "INR");
                assert_eq!(amount, Decimal::MAX);
                assert_eq!(rate, "0.5");
            }
            other => panic!("Expected ConversionOverflow, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_convert_unparseable_rate_is_rejected() {
        let fetcher = MockFetcher::default()
            .with_series("INR", &[Observation::new("2025-05-16", Some("n/a"))]);
        let service = service(&[], Arc::new(fetcher));

        let err = service
            .convert(date("2025-05-16"), &CurrencyCode::from("INR"), dec!(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FxError::InvalidRate { ref value, .. } if value == "n/a"));
    }

    #[tokio::test]
    async fn test_convert_propagates_upstream_failure() {
        let service = service(&[], Arc::new(UnreachableFetcher));

        let err = service
            .convert(date("2025-05-16"), &CurrencyCode::from("INR"), dec!(500))
            .await
            .unwrap_err();

        assert!(matches!(err, FxError::UpstreamUnavailable { .. }));
    }
}
