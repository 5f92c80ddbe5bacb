//! Weather provider client: geoposition lookup and 5-day forecast retrieval
//!
//! HTTP status interpretation lives in pure per-endpoint classification
//! tables consumed by exhaustive matching. Payload shape violations surface
//! as `MalformedResponse` instead of leaking raw lookup failures, and the
//! upstream contract of exactly 5 daily entries is validated rather than
//! trusted.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::ForecastError;
use crate::models::{Coordinate, DailyForecast, LocationKey};

/// Outcome of classifying an upstream HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    BadRequest,
    ApiKey,
    Unclassified,
}

/// Classification table for the geoposition-search endpoint
#[must_use]
pub fn classify_geoposition_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        return StatusClass::Ok;
    }
    match status.as_u16() {
        400 => StatusClass::BadRequest,
        401 | 503 => StatusClass::ApiKey,
        _ => StatusClass::Unclassified,
    }
}

/// Classification table for the forecast endpoint
///
/// Unlike the geoposition endpoint, a 503 here is not a credential signal.
#[must_use]
pub fn classify_forecast_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        return StatusClass::Ok;
    }
    match status.as_u16() {
        400 => StatusClass::BadRequest,
        401 => StatusClass::ApiKey,
        _ => StatusClass::Unclassified,
    }
}

/// HTTP client for the weather provider
pub struct ProviderClient {
    client: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a new provider client
    pub fn new(config: ProviderConfig) -> Result<Self, ForecastError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("routecast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Resolve a coordinate pair to the provider's opaque location key
    ///
    /// A 400, or a success body without a usable `Key` field, means the
    /// coordinate was not recognized. 401 and 503 both mean the credential
    /// was rejected.
    #[instrument(skip(self), fields(point = %point.to_query()))]
    pub async fn resolve_location(&self, point: &Coordinate) -> Result<LocationKey, ForecastError> {
        let url = format!("{}{}", self.config.base_url, self.config.geo_search_path);
        debug!("Geoposition lookup for {}", point.to_query());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("q", point.to_query().as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        match classify_geoposition_status(status) {
            StatusClass::Ok => {}
            StatusClass::BadRequest => {
                warn!("Geoposition lookup rejected (HTTP {})", status.as_u16());
                return Err(ForecastError::bad_request(format!(
                    "geoposition lookup rejected coordinates {}",
                    point.to_query()
                )));
            }
            StatusClass::ApiKey => {
                warn!("Geoposition lookup rejected the API key (HTTP {})", status.as_u16());
                return Err(ForecastError::api_key(
                    "geoposition lookup rejected the API key",
                ));
            }
            StatusClass::Unclassified => {
                return Err(ForecastError::UpstreamStatus {
                    status: status.as_u16(),
                });
            }
        }

        // An unreadable body or a missing Key field counts as a coordinate
        // the provider does not recognize, same as an explicit 400.
        let body: accuweather::GeopositionResponse = match response.json().await {
            Ok(body) => body,
            Err(_) => {
                return Err(ForecastError::bad_request(format!(
                    "geoposition lookup returned no usable body for {}",
                    point.to_query()
                )));
            }
        };

        let key = body.key.filter(|key| !key.is_empty()).ok_or_else(|| {
            ForecastError::bad_request(format!(
                "geoposition lookup returned no location key for {}",
                point.to_query()
            ))
        })?;

        info!("Resolved {} to a location key", point.to_query());
        Ok(LocationKey::new(key))
    }

    /// Fetch the 5-day forecast for a resolved location key
    #[instrument(skip(self, key))]
    pub async fn fetch_forecast(&self, key: &LocationKey) -> Result<Vec<DailyForecast>, ForecastError> {
        let url = format!(
            "{}{}{}",
            self.config.base_url, self.config.forecast_path, key.as_str()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("language", self.config.language.as_str()),
                ("details", "true"),
                ("metric", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        match classify_forecast_status(status) {
            StatusClass::Ok => {}
            StatusClass::BadRequest => {
                warn!("Forecast request rejected (HTTP {})", status.as_u16());
                return Err(ForecastError::bad_request(
                    "forecast request rejected for the resolved location",
                ));
            }
            StatusClass::ApiKey => {
                warn!("Forecast request rejected the API key (HTTP 401)");
                return Err(ForecastError::api_key("forecast request rejected the API key"));
            }
            StatusClass::Unclassified => {
                return Err(ForecastError::UpstreamStatus {
                    status: status.as_u16(),
                });
            }
        }

        let body: accuweather::ForecastResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::malformed(format!("undecodable forecast payload: {e}")))?;

        let records = accuweather::to_daily_records(body)?;
        info!("Retrieved {} daily forecast entries", records.len());
        Ok(records)
    }
}

/// Provider API response structures and conversion into domain records
mod accuweather {
    use serde::Deserialize;

    use crate::error::ForecastError;
    use crate::models::DailyForecast;

    /// The provider contract fixes the daily array at exactly this length
    pub const DAILY_ENTRIES: usize = 5;

    /// Geoposition-search response; only the key is of interest
    #[derive(Debug, Deserialize)]
    pub struct GeopositionResponse {
        #[serde(rename = "Key")]
        pub key: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        #[serde(rename = "DailyForecasts")]
        pub daily_forecasts: Option<Vec<DailyEntry>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyEntry {
        #[serde(rename = "Date")]
        pub date: Option<String>,
        #[serde(rename = "Temperature")]
        pub temperature: Option<TemperatureRange>,
        #[serde(rename = "Day")]
        pub day: Option<DayConditions>,
    }

    #[derive(Debug, Deserialize)]
    pub struct TemperatureRange {
        #[serde(rename = "Minimum")]
        pub minimum: Option<UnitValue>,
        #[serde(rename = "Maximum")]
        pub maximum: Option<UnitValue>,
    }

    #[derive(Debug, Deserialize)]
    pub struct UnitValue {
        #[serde(rename = "Value")]
        pub value: Option<f64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DayConditions {
        #[serde(rename = "RelativeHumidity")]
        pub relative_humidity: Option<HumidityAverage>,
        #[serde(rename = "Wind")]
        pub wind: Option<Wind>,
        #[serde(rename = "PrecipitationProbability")]
        pub precipitation_probability: Option<u8>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HumidityAverage {
        #[serde(rename = "Average")]
        pub average: Option<u8>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Wind {
        #[serde(rename = "Speed")]
        pub speed: Option<UnitValue>,
    }

    /// Convert the raw response into domain records, rejecting any shape
    /// violation with a `MalformedResponse`
    pub fn to_daily_records(response: ForecastResponse) -> Result<Vec<DailyForecast>, ForecastError> {
        let entries = response
            .daily_forecasts
            .ok_or_else(|| ForecastError::malformed("missing DailyForecasts array"))?;

        if entries.len() != DAILY_ENTRIES {
            return Err(ForecastError::malformed(format!(
                "expected {DAILY_ENTRIES} daily entries, got {}",
                entries.len()
            )));
        }

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| convert_entry(index, entry))
            .collect()
    }

    fn convert_entry(index: usize, entry: DailyEntry) -> Result<DailyForecast, ForecastError> {
        let date = entry.date.ok_or_else(|| missing(index, "Date"))?;

        let temperature = entry
            .temperature
            .ok_or_else(|| missing(index, "Temperature"))?;
        let min_temperature = temperature
            .minimum
            .and_then(|v| v.value)
            .ok_or_else(|| missing(index, "Temperature.Minimum.Value"))?;
        let max_temperature = temperature
            .maximum
            .and_then(|v| v.value)
            .ok_or_else(|| missing(index, "Temperature.Maximum.Value"))?;

        let day = entry.day.ok_or_else(|| missing(index, "Day"))?;
        let humidity = day
            .relative_humidity
            .and_then(|h| h.average)
            .ok_or_else(|| missing(index, "Day.RelativeHumidity.Average"))?;
        let wind_speed = day
            .wind
            .and_then(|w| w.speed)
            .and_then(|s| s.value)
            .ok_or_else(|| missing(index, "Day.Wind.Speed.Value"))?;
        let precipitation_probability = day
            .precipitation_probability
            .ok_or_else(|| missing(index, "Day.PrecipitationProbability"))?;

        Ok(DailyForecast {
            date,
            min_temperature,
            max_temperature,
            humidity,
            wind_speed,
            precipitation_probability,
        })
    }

    fn missing(index: usize, field: &str) -> ForecastError {
        ForecastError::malformed(format!("daily entry {index} missing {field}"))
    }
}
