//! Error types for the forecast pipeline and its front-ends

use thiserror::Error;

/// Main error type for the routecast application
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Coordinates the provider cannot resolve, or a forecast request it rejects
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Provider credential invalid or rejected upstream
    #[error("API key error: {message}")]
    ApiKey { message: String },

    /// Well-formed HTTP success carrying an unusable payload shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// User input rejected before any network call
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Transport-level failure from the HTTP client
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// Non-success status that matches no classification table
    #[error("Upstream returned status {status}")]
    UpstreamStatus { status: u16 },
}

impl ForecastError {
    /// Create a new bad-request error
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a new API-key error
    pub fn api_key<S: Into<String>>(message: S) -> Self {
        Self::ApiKey {
            message: message.into(),
        }
    }

    /// Create a new malformed-response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new input-validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    ///
    /// For `BadRequest` and `ApiKey` the service layer already rewrote the
    /// message into its user-facing form, so both front-ends render it
    /// verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ForecastError::BadRequest { message }
            | ForecastError::ApiKey { message }
            | ForecastError::Validation { message } => message.clone(),
            ForecastError::MalformedResponse { .. } => {
                "The weather provider returned unusable data. Please try again later.".to_string()
            }
            ForecastError::Http { .. } | ForecastError::UpstreamStatus { .. } => {
                "Unable to reach the weather provider. Please try again later.".to_string()
            }
        }
    }
}
