//! Reshaping of daily forecast records into chart-ready parallel series
//!
//! Both the dashboard charts and the bot report consume the same six
//! sequences, so the truncation and date normalization live here and
//! nowhere else.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::models::{DailyForecast, ForecastWindow};

/// Six parallel sequences over the selected forecast window
///
/// Invariant: all six vectors have the same length, the window size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    /// Dates normalized to `YYYY-MM-DD`
    pub dates: Vec<String>,
    /// Minimum temperatures in °C
    pub min_temps: Vec<f64>,
    /// Maximum temperatures in °C
    pub max_temps: Vec<f64>,
    /// Average relative humidity in percent
    pub humidity: Vec<u8>,
    /// Average wind speed in km/h
    pub wind_speed: Vec<f64>,
    /// Precipitation probability in percent
    pub precipitation: Vec<u8>,
}

impl ForecastSeries {
    /// Number of days covered by the series
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Truncate the 5-day records to the window and split them into parallel
/// sequences, normalizing each provider timestamp to a plain date
///
/// Pure: the only failure mode is a date string the provider sent that is
/// not ISO-8601, which surfaces as `MalformedResponse`.
pub fn to_series(
    records: &[DailyForecast],
    window: ForecastWindow,
) -> Result<ForecastSeries, ForecastError> {
    let days = window.days();

    let mut series = ForecastSeries {
        dates: Vec::with_capacity(days),
        min_temps: Vec::with_capacity(days),
        max_temps: Vec::with_capacity(days),
        humidity: Vec::with_capacity(days),
        wind_speed: Vec::with_capacity(days),
        precipitation: Vec::with_capacity(days),
    };

    for record in records.iter().take(days) {
        series.dates.push(normalize_date(&record.date)?);
        series.min_temps.push(record.min_temperature);
        series.max_temps.push(record.max_temperature);
        series.humidity.push(record.humidity);
        series.wind_speed.push(record.wind_speed);
        series.precipitation.push(record.precipitation_probability);
    }

    Ok(series)
}

/// Reformat an ISO-8601 timestamp to `YYYY-MM-DD`, discarding time and zone
fn normalize_date(timestamp: &str) -> Result<String, ForecastError> {
    let parsed = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| ForecastError::malformed(format!("unparsable forecast date '{timestamp}': {e}")))?;
    Ok(parsed.date_naive().format("%Y-%m-%d").to_string())
}
