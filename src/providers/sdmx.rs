//! Decoder for SDMX 2.1 generic time-series messages.
//!
//! Only the data part of the message is read:
//!
//! ```text
//! GenericData
//! └── DataSet
//!     └── Series
//!         └── Obs*
//!             ├── ObsDimension @value  (date)
//!             └── ObsValue     @value  (rate, absent on holidays)
//! ```
//!
//! Namespace prefixes (`message:`, `generic:`) are ignored; elements are
//! matched on their local names.

use serde::Deserialize;
use thiserror::Error;

use crate::core::rates::{Observation, RateSeries};

#[derive(Debug, Error)]
pub enum SdmxError {
    #[error("Malformed SDMX document: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct GenericData {
    #[serde(rename = "DataSet", default)]
    data_set: Option<DataSet>,
}

#[derive(Debug, Deserialize)]
struct DataSet {
    #[serde(rename = "Series", default)]
    series: Option<Series>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(rename = "Obs", default)]
    observations: Vec<Obs>,
}

#[derive(Debug, Deserialize)]
struct Obs {
    #[serde(rename = "ObsDimension")]
    dimension: ObsDimension,
    #[serde(rename = "ObsValue", default)]
    value: Option<ObsValue>,
}

#[derive(Debug, Deserialize)]
struct ObsDimension {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ObsValue {
    value: String,
}

/// Parses a generic-data message into the series it carries.
///
/// A message without a data set or series yields `Ok(None)`: the upstream
/// answered but has nothing for the currency.
pub fn parse(document: &str) -> Result<Option<RateSeries>, SdmxError> {
    let document = document.trim_start_matches('\u{feff}').trim();
    if document.is_empty() {
        return Err(SdmxError::Malformed("empty document".to_string()));
    }

    let data: GenericData =
        serde_xml_rs::from_str(document).map_err(|e| SdmxError::Malformed(e.to_string()))?;

    let Some(series) = data.data_set.and_then(|ds| ds.series) else {
        return Ok(None);
    };

    let observations = series
        .observations
        .into_iter()
        .map(|obs| Observation {
            date: obs.dimension.value,
            rate: obs.value.map(|v| v.value),
        })
        .collect();

    Ok(Some(RateSeries::new(observations)))
}
