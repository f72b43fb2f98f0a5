//! Rate series and the per-request rate table

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use super::currency::CurrencyCode;
use super::error::FxResult;

pub const HOLIDAY_SENTINEL: &str = "Rate cannot be fetched as it is weekend or public holiday";

/// Fractional digits kept on converted amounts.
pub const CONVERSION_SCALE: u32 = 4;

/// A single upstream data point. `rate` is `None` when nothing was published
/// for the date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub date: String,
    pub rate: Option<String>,
}

impl Observation {
    pub fn new(date: impl Into<String>, rate: Option<&str>) -> Self {
        Self {
            date: date.into(),
            rate: rate.map(str::to_string),
        }
    }
}

/// Observations for one currency in upstream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSeries {
    pub observations: Vec<Observation>,
}

impl RateSeries {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Every published rate keyed by date. Unpublished dates are skipped.
    pub fn published_rates(&self) -> BTreeMap<String, DailyRate> {
        self.observations
            .iter()
            .filter_map(|obs| {
                obs.rate
                    .as_ref()
                    .map(|rate| (obs.date.clone(), DailyRate::Published(rate.clone())))
            })
            .collect()
    }

    /// Entry for the first observation on `date`, if the series has one.
    pub fn rate_on(&self, date: NaiveDate) -> Option<DailyRate> {
        let date = date.to_string();
        self.observations
            .iter()
            .find(|obs| obs.date == date)
            .map(|obs| match &obs.rate {
                Some(rate) => DailyRate::Published(rate.clone()),
                None => DailyRate::Unavailable,
            })
    }

    /// First published rate on `date`. Unpublished entries for the date are
    /// passed over.
    pub fn published_rate_on(&self, date: NaiveDate) -> Option<&str> {
        let date = date.to_string();
        self.observations
            .iter()
            .filter(|obs| obs.date == date)
            .find_map(|obs| obs.rate.as_deref())
    }
}

/// Rate recorded for a date: the published value or the holiday marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyRate {
    Published(String),
    Unavailable,
}

impl DailyRate {
    pub fn as_str(&self) -> &str {
        match self {
            DailyRate::Published(rate) => rate,
            DailyRate::Unavailable => HOLIDAY_SENTINEL,
        }
    }
}

impl Display for DailyRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DailyRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub type RateTable = BTreeMap<CurrencyCode, BTreeMap<String, DailyRate>>;

/// Retrieves the raw upstream rate document for one currency.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self, currency: &CurrencyCode) -> FxResult<String>;
}

/// Parses published rate text into a usable divisor. `None` for text that is
/// not a decimal and for zero.
pub fn parse_rate(rate: &str) -> Option<Decimal> {
    Decimal::from_str(rate.trim())
        .ok()
        .filter(|rate| !rate.is_zero())
}

/// Divides `amount` by `rate`, rounding half-up to [`CONVERSION_SCALE`]
/// digits. `None` when the quotient does not fit in a `Decimal`.
pub fn convert_amount(amount: Decimal, rate: Decimal) -> Option<Decimal> {
    amount
        .checked_div(rate)
        .map(|v| v.round_dp_with_strategy(CONVERSION_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_series() -> RateSeries {
        RateSeries::new(vec![
            Observation::new("2025-05-15", Some("95.8201")),
            Observation::new("2025-05-16", Some("95.8200")),
            Observation::new("2025-05-17", None),
            Observation::new("2025-05-18", None),
            Observation::new("2025-05-19", Some("96.0100")),
        ])
    }

    #[test]
    fn test_published_rates_skip_missing_values() {
        let rates = sample_series().published_rates();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates["2025-05-16"].as_str(), "95.8200");
        assert!(!rates.contains_key("2025-05-17"));
        let dates: Vec<_> = rates.keys().cloned().collect();
        assert_eq!(dates, vec!["2025-05-15", "2025-05-16", "2025-05-19"]);
    }

    #[test]
    fn test_rate_on_distinguishes_holiday_from_missing_date() {
        let series = sample_series();
        assert_eq!(
            series.rate_on(date("2025-05-16")),
            Some(DailyRate::Published("95.8200".to_string()))
        );
        assert_eq!(series.rate_on(date("2025-05-17")), Some(DailyRate::Unavailable));
        assert_eq!(series.rate_on(date("2025-06-01")), None);
    }

    #[test]
    fn test_rate_on_uses_first_match() {
        let series = RateSeries::new(vec![
            Observation::new("2025-05-16", None),
            Observation::new("2025-05-16", Some("1.0")),
        ]);
        assert_eq!(series.rate_on(date("2025-05-16")), Some(DailyRate::Unavailable));
        assert_eq!(series.published_rate_on(date("2025-05-16")), Some("1.0"));
    }

    #[test]
    fn test_zero_text_rate_is_not_absent() {
        let series = RateSeries::new(vec![Observation::new("2025-05-16", Some("0"))]);
        assert_eq!(
            series.rate_on(date("2025-05-16")),
            Some(DailyRate::Published("0".to_string()))
        );
    }

    #[test]
    fn test_unavailable_renders_sentinel() {
        assert_eq!(DailyRate::Unavailable.to_string(), HOLIDAY_SENTINEL);
        let json = serde_json::to_string(&DailyRate::Unavailable).unwrap();
        assert_eq!(json, format!("\"{HOLIDAY_SENTINEL}\""));
    }

    #[test]
    fn test_convert_amount_rounds_half_up() {
        assert_eq!(convert_amount(dec!(500), dec!(95.8200)), Some(dec!(5.2181)));
        // midpoints round up
        assert_eq!(convert_amount(dec!(0.0001), dec!(2)), Some(dec!(0.0001)));
        assert_eq!(convert_amount(dec!(0.00025), dec!(1)), Some(dec!(0.0003)));
        assert_eq!(convert_amount(dec!(1), dec!(3)), Some(dec!(0.3333)));
        assert_eq!(convert_amount(dec!(2), dec!(3)), Some(dec!(0.6667)));
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate(" 95.8200 "), Some(dec!(95.8200)));
        assert_eq!(parse_rate("0"), None);
        assert_eq!(parse_rate("0.0000"), None);
        assert_eq!(parse_rate("n/a"), None);
        assert_eq!(parse_rate(""), None);
    }

    #[test]
    fn test_convert_amount_overflow_is_not_a_bad_rate() {
        let rate = parse_rate("0.5").unwrap();
        assert_eq!(convert_amount(Decimal::MAX, rate), None);
        assert_eq!(convert_amount(Decimal::MAX, dec!(1)), Some(Decimal::MAX));
    }
}
