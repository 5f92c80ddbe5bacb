//! Coordinate-to-forecast composition and the error-normalization boundary

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ForecastError;
use crate::models::{Coordinate, DailyForecast};
use crate::provider::ProviderClient;

/// User-facing message for coordinates the provider cannot serve
pub const UNAVAILABLE_MESSAGE: &str = "Forecast is unavailable for these coordinates.";

/// User-facing message for a rejected provider credential
pub const CREDENTIAL_MESSAGE: &str = "There is a problem with the weather service credentials.";

/// Source of 5-day forecasts keyed by coordinates
///
/// The seam between the retrieval pipeline and the two front-ends; tests
/// substitute a stub here so conversation and dashboard logic run without a
/// live provider.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(&self, point: &Coordinate) -> Result<Vec<DailyForecast>, ForecastError>;
}

/// Composes the geoposition lookup and the forecast fetch into a single
/// coordinate-to-forecast operation
pub struct WeatherService {
    provider: ProviderClient,
}

impl WeatherService {
    #[must_use]
    pub fn new(provider: ProviderClient) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ForecastProvider for WeatherService {
    /// Resolve the coordinate to a location key, then fetch its 5-day
    /// forecast; no retry on either stage
    ///
    /// This is the single error-normalization boundary: front-ends receive
    /// `BadRequest` and `ApiKey` with their fixed user-facing messages and
    /// never need to distinguish which stage failed.
    #[instrument(skip(self), fields(point = %point.to_query()))]
    async fn forecast(&self, point: &Coordinate) -> Result<Vec<DailyForecast>, ForecastError> {
        let key = match self.provider.resolve_location(point).await {
            Ok(key) => key,
            Err(error) => return Err(normalize(error)),
        };

        self.provider.fetch_forecast(&key).await.map_err(normalize)
    }
}

/// Rewrite stage-specific failures into the messages both front-ends render,
/// preserving the error kind
fn normalize(error: ForecastError) -> ForecastError {
    match error {
        ForecastError::BadRequest { .. } => ForecastError::bad_request(UNAVAILABLE_MESSAGE),
        ForecastError::ApiKey { .. } => ForecastError::api_key(CREDENTIAL_MESSAGE),
        other => other,
    }
}
