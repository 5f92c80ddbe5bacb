//! Core domain models: coordinates, location keys, daily forecast records

use crate::error::ForecastError;
use serde::{Deserialize, Serialize};

/// A validated geographic coordinate pair
///
/// Components are kept as the decimal strings the user submitted so the
/// provider query carries them verbatim. Construction enforces the
/// `-?digits.digits` shape; anything else is rejected before a network call
/// is ever made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: String,
    longitude: String,
}

impl Coordinate {
    /// Build a coordinate from separate latitude/longitude fields
    pub fn new(latitude: &str, longitude: &str) -> Result<Self, ForecastError> {
        let latitude = latitude.trim();
        let longitude = longitude.trim();

        if !is_decimal(latitude) || !is_decimal(longitude) {
            return Err(ForecastError::validation(
                "coordinate components must be decimals like 1.1234",
            ));
        }

        Ok(Self {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        })
    }

    /// Parse free text in the `lat,lon` shape the bot asks for
    pub fn parse(text: &str) -> Result<Self, ForecastError> {
        let (latitude, longitude) = text
            .trim()
            .split_once(',')
            .ok_or_else(|| ForecastError::validation("expected coordinates as lat,lon"))?;
        Self::new(latitude, longitude)
    }

    #[must_use]
    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> &str {
        &self.longitude
    }

    /// `q` parameter value for the geoposition-search endpoint
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Check the `-?digits.digits` decimal shape
fn is_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    match unsigned.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Opaque provider token identifying a resolved geographic point
///
/// Owned by the caller for the duration of one forecast request; never
/// cached or reused across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationKey(String);

impl LocationKey {
    #[must_use]
    pub fn new(key: String) -> Self {
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One normalized day of the provider's 5-day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Provider timestamp for the day, ISO-8601 with offset
    pub date: String,
    /// Minimum temperature in °C
    pub min_temperature: f64,
    /// Maximum temperature in °C
    pub max_temperature: f64,
    /// Average relative humidity in percent (0-100)
    pub humidity: u8,
    /// Average wind speed in km/h
    pub wind_speed: f64,
    /// Precipitation probability in percent (0-100)
    pub precipitation_probability: u8,
}

/// User-selected forecast window, always a prefix of the 5-day forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastWindow {
    Three,
    Five,
}

impl ForecastWindow {
    /// Number of days in the window
    #[must_use]
    pub const fn days(self) -> usize {
        match self {
            ForecastWindow::Three => 3,
            ForecastWindow::Five => 5,
        }
    }

    /// Map a raw day count to a window; only 3 and 5 are representable
    #[must_use]
    pub fn from_days(days: usize) -> Option<Self> {
        match days {
            3 => Some(ForecastWindow::Three),
            5 => Some(ForecastWindow::Five),
            _ => None,
        }
    }
}
