//! Routecast - route weather comparison through a dashboard and a chat bot
//!
//! This library provides the forecast retrieval pipeline (geoposition
//! lookup, 5-day forecast fetch, series preparation) and the per-chat
//! conversation state machine that compares the forecast at two route
//! points.

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod series;
pub mod service;
pub mod web;

// Re-export core types for public API
pub use config::RoutecastConfig;
pub use error::ForecastError;
pub use models::{Coordinate, DailyForecast, ForecastWindow, LocationKey};
pub use provider::ProviderClient;
pub use series::{ForecastSeries, to_series};
pub use service::{ForecastProvider, WeatherService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ForecastError>;
