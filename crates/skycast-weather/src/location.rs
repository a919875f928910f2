//! One-shot location lookup.
//!
//! Platform geolocation sits behind [`LocationProvider`]; every lookup is a
//! fresh request bounded by a timeout, with no reuse of an earlier position.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LocationError;
use crate::types::Coordinates;

/// Default bound on a single lookup
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Run one lookup, failing with [`LocationError::Timeout`] once `timeout` elapses
pub async fn locate_with_timeout(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinates, LocationError> {
    match tokio::time::timeout(timeout, provider.locate()).await {
        Ok(Ok(coords)) => {
            tracing::info!("Got location: {}, {}", coords.lat, coords.lon);
            Ok(coords)
        }
        Ok(Err(e)) => {
            tracing::warn!("Location lookup failed: {}", e);
            Err(e)
        }
        Err(_) => {
            tracing::warn!("Location lookup timed out after {:?}", timeout);
            Err(LocationError::Timeout)
        }
    }
}

/// Always reports the same position, e.g. one set in configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Used when no position source exists
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocation;

#[async_trait]
impl LocationProvider for UnavailableLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}
