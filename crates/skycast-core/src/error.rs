//! Errors as the user sees them.
//!
//! Library crates keep their own precise error enums and convert into
//! [`AppError`] at the display boundary, where `user_message()` supplies the
//! text to show.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather lookup failed: {0}")]
    Weather(#[from] WeatherError),

    #[error("Preference storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Io(_) => "Could not access a local file.",
            AppError::Other(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Failures below HTTP semantics, or a status the weather layer did not map
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Host unreachable: {0}")]
    Offline(String),

    #[error("Request timed out")]
    TimedOut,

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Offline(_) => "You appear to be offline. Check your connection.",
            NetworkError::TimedOut => "The weather service took too long to answer.",
            NetworkError::Upstream { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Try again in a few minutes."
            }
            NetworkError::Upstream { .. } => "The weather service rejected the request.",
            NetworkError::UnexpectedBody(_) => "The weather service sent something unreadable.",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {message}")]
    ReadFailed { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("Failed to encode value for {key}: {message}")]
    EncodeFailed { key: String, message: String },
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::ReadFailed { .. } => "Saved preferences could not be read.",
            StorageError::WriteFailed { .. } => "Preferences could not be saved.",
            StorageError::EncodeFailed { .. } => "A preference could not be saved.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("No API key configured")]
    MissingApiKey,
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::InvalidEndpoint(_) => "A weather service URL in the config is invalid.",
            ConfigError::MissingApiKey => {
                "No OpenWeatherMap API key is set. Add one to the config or SKYCAST_API_KEY."
            }
        }
    }
}

/// Outcome of a weather lookup, in terms the user can act on
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Malformed weather data: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found. Check and try again.",
            WeatherError::LocationUnavailable(_) => {
                "Your location is unavailable. Try searching for a city."
            }
            WeatherError::ApiError(_) => "Weather service error. Please try again.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check settings.",
            WeatherError::ServiceUnavailable => {
                "Weather service unavailable. Please try again later."
            }
            WeatherError::MalformedResponse(_) => {
                "The weather service sent incomplete data. Please try again."
            }
        }
    }
}

/// Classify a `reqwest` failure
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        let detail = self.to_string();
        match self.status() {
            _ if self.is_timeout() => NetworkError::TimedOut,
            Some(status) => NetworkError::Upstream {
                status: status.as_u16(),
                message: detail,
            },
            None if self.is_decode() || self.is_body() => NetworkError::UnexpectedBody(detail),
            None => NetworkError::Offline(detail),
        }
    }
}
