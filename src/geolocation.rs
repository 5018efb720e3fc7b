//! Device position acquisition.
//!
//! The platform location API lives outside this crate; it is plugged in through
//! [`Geolocator`] and reports failures with platform codes that
//! [`GeolocationError::from_platform`](../error/struct.GeolocationError.html#method.from_platform)
//! classifies.
use async_trait::async_trait;
use log::warn;
use std::time::Duration;

use crate::coordinate::Coordinate;
use crate::error::{GeolocationError, GeolocationErrorKind};

/// How long to wait for a position fix by default
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of the device's current position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// Ask `geolocator` for a fix, giving up with a `Timeout` error after `timeout`.
pub async fn locate<L>(geolocator: &L, timeout: Duration) -> Result<Coordinate, GeolocationError>
where
    L: Geolocator + ?Sized,
{
    match tokio::time::timeout(timeout, geolocator.current_position()).await {
        Ok(position) => position,
        Err(_) => {
            warn!("No position fix within {:?}", timeout);
            Err(GeolocationError::new(
                GeolocationErrorKind::Timeout,
                format!("No position fix within {:?}", timeout),
            ))
        }
    }
}
