//! Dashboard HTTP API
//!
//! Stateless per-request recomputation: the handler validates the submitted
//! coordinate fields before any network call, fetches both route points, and
//! returns the prepared series for the selected tab. Failures come back as a
//! JSON error message the front-end renders in place of the charts; nothing
//! here can take the server down.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ForecastError;
use crate::models::{Coordinate, ForecastWindow};
use crate::series::{self, ForecastSeries};
use crate::service::ForecastProvider;

pub const INVALID_COORDINATES_MESSAGE: &str =
    "Please enter valid coordinates in the 1.1234 format.";

pub const INVALID_WINDOW_MESSAGE: &str = "Forecast window must be 3 or 5 days.";

pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error while fetching the forecast.";

type SharedProvider = Arc<dyn ForecastProvider>;

/// Which point's series the dashboard is currently charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Start,
    End,
}

/// One dashboard submission: four coordinate fields, the day count, the tab
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub start_lat: String,
    pub start_lon: String,
    pub end_lat: String,
    pub end_lon: String,
    pub days: usize,
    pub tab: Tab,
}

/// Either the series feeding the four chart widgets, or an error message
/// rendered in their place
#[derive(Debug, Serialize)]
pub struct ForecastReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<ForecastSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecastReply {
    fn series(series: ForecastSeries) -> Self {
        Self {
            series: Some(series),
            error: None,
        }
    }

    fn error<S: Into<String>>(message: S) -> Self {
        Self {
            series: None,
            error: Some(message.into()),
        }
    }
}

pub fn router(provider: SharedProvider) -> Router {
    Router::new()
        .route("/forecast", get(get_forecast))
        .with_state(provider)
}

async fn get_forecast(
    State(provider): State<SharedProvider>,
    Query(query): Query<ForecastQuery>,
) -> Json<ForecastReply> {
    Json(handle_forecast(provider.as_ref(), query).await)
}

async fn handle_forecast(provider: &dyn ForecastProvider, query: ForecastQuery) -> ForecastReply {
    let Some(window) = ForecastWindow::from_days(query.days) else {
        return ForecastReply::error(INVALID_WINDOW_MESSAGE);
    };

    let start = Coordinate::new(&query.start_lat, &query.start_lon);
    let end = Coordinate::new(&query.end_lat, &query.end_lon);
    let (Ok(start), Ok(end)) = (start, end) else {
        return ForecastReply::error(INVALID_COORDINATES_MESSAGE);
    };

    match fetch_tab(provider, window, &start, &end, query.tab).await {
        Ok(series) => ForecastReply::series(series),
        Err(e @ (ForecastError::BadRequest { .. } | ForecastError::ApiKey { .. })) => {
            ForecastReply::error(e.user_message())
        }
        Err(e) => {
            warn!("Dashboard forecast failed: {e}");
            ForecastReply::error(UNEXPECTED_ERROR_MESSAGE)
        }
    }
}

/// Both points are fetched per submission, start first; a failure on the
/// start point suppresses the end-point request
async fn fetch_tab(
    provider: &dyn ForecastProvider,
    window: ForecastWindow,
    start: &Coordinate,
    end: &Coordinate,
    tab: Tab,
) -> Result<ForecastSeries, ForecastError> {
    let start_series = series::to_series(&provider.forecast(start).await?, window)?;
    let end_series = series::to_series(&provider.forecast(end).await?, window)?;

    Ok(match tab {
        Tab::Start => start_series,
        Tab::End => end_series,
    })
}
