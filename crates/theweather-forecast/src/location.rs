//! One-shot device location.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Coordinate, LocationError};

/// Whether the user has allowed location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationPermission {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Resolve the current position once.
    async fn current_location(&self) -> Result<Coordinate, LocationError>;

    /// Whether any positioning backend is switched on.
    fn is_service_enabled(&self) -> bool {
        true
    }
}

/// Ask `provider` for a single coordinate, giving up after `timeout`.
pub async fn request_location(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinate, LocationError> {
    if !provider.is_service_enabled() {
        return Err(LocationError::ServiceDisabled);
    }

    tracing::debug!("Location request started");
    match tokio::time::timeout(timeout, provider.current_location()).await {
        Ok(Ok(coordinate)) => {
            tracing::info!("Got location: {}", coordinate);
            Ok(coordinate)
        }
        Ok(Err(e)) => {
            tracing::warn!("Location request failed: {}", e);
            Err(e)
        }
        Err(_) => {
            tracing::warn!("Location request timed out after {:?}", timeout);
            Err(LocationError::Timeout)
        }
    }
}

/// Always reports the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}
