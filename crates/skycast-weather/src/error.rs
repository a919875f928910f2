//! Weather lookup error types.

use skycast_core::{AppError, ConfigError, NetworkError, ReqwestErrorExt};
use thiserror::Error;

/// Failure retrieving a payload over HTTP
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Weather API error: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Response body is not valid JSON: {0}")]
    InvalidBody(String),
}

impl TransportError {
    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            TransportError::InvalidBody(_) => None,
        }
    }
}

/// Weather gateway errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unexpected payload shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Malformed forecast data: {0}")]
    Malformed(String),
}

/// Location lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this system")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Error getting location: {0}")]
    Other(String),
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        use skycast_core::WeatherError as Core;

        match e {
            WeatherError::Transport(TransportError::Status { status, reason }) => match status {
                401 => AppError::Weather(Core::InvalidApiKey),
                404 => AppError::Weather(Core::LocationNotFound(reason)),
                s if s >= 500 => AppError::Weather(Core::ServiceUnavailable),
                _ => AppError::Weather(Core::ApiError(format!("{status} {reason}"))),
            },
            WeatherError::Transport(TransportError::Network(e)) => {
                AppError::Network(e.into_network_error())
            }
            WeatherError::Transport(TransportError::InvalidBody(msg)) => {
                AppError::Network(NetworkError::UnexpectedBody(msg))
            }
            WeatherError::Decode(e) => AppError::Weather(Core::MalformedResponse(e.to_string())),
            WeatherError::Malformed(msg) => AppError::Weather(Core::MalformedResponse(msg)),
            WeatherError::InvalidUrl(e) => {
                AppError::Config(ConfigError::InvalidEndpoint(e.to_string()))
            }
        }
    }
}

impl From<LocationError> for AppError {
    fn from(e: LocationError) -> Self {
        AppError::Weather(skycast_core::WeatherError::LocationUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> WeatherError {
        WeatherError::Transport(TransportError::Status {
            status,
            reason: "reason".into(),
        })
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            AppError::from(status(401)),
            AppError::Weather(skycast_core::WeatherError::InvalidApiKey)
        ));
        assert!(matches!(
            AppError::from(status(404)),
            AppError::Weather(skycast_core::WeatherError::LocationNotFound(_))
        ));
        assert!(matches!(
            AppError::from(status(502)),
            AppError::Weather(skycast_core::WeatherError::ServiceUnavailable)
        ));
        assert!(matches!(
            AppError::from(status(429)),
            AppError::Weather(skycast_core::WeatherError::ApiError(_))
        ));
    }

    #[test]
    fn test_location_error_message() {
        let app: AppError = LocationError::Timeout.into();
        assert!(app.to_string().contains("timed out"));
        assert!(app.user_message().contains("location"));
    }

    #[test]
    fn test_transport_status_accessor() {
        assert_eq!(
            TransportError::Status { status: 404, reason: "Not Found".into() }.status(),
            Some(404)
        );
        assert_eq!(TransportError::InvalidBody("x".into()).status(), None);
    }
}
