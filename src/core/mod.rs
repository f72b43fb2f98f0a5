//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod rates;
pub mod resolver;
pub mod service;

// Re-export main types for cleaner imports
pub use currency::{CurrencyCode, CurrencyRegistry};
pub use error::{FxError, FxResult};
pub use rates::{DailyRate, RateFetcher, RateSeries, RateTable};
pub use service::FxRateService;
