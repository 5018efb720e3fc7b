use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::coordinate::Coordinate;
use crate::error::{GeocodingError, RoutingError, TransportError};
use crate::geocoding::{GeocodeOptions, PlaceResult};
use crate::retry::{retry_with_backoff, RetryOptions};
use crate::routing::{RouteResult, TravelProfile};
use crate::transport::Transport;

pub mod geocoding;
pub mod routing;

pub use self::geocoding::GeocodingClient;
pub use self::routing::RoutingClient;

/// Forward-geocode a free-text query.
///
/// An empty `Vec` is a successful lookup that matched nothing; failures are errors.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(
        &self,
        query: &str,
        options: &GeocodeOptions,
    ) -> Result<Vec<PlaceResult>, GeocodingError>;
}

/// Reverse-geocode a coordinate to the place at that position.
#[async_trait]
pub trait Reverse: Send + Sync {
    async fn reverse(&self, coordinate: &Coordinate) -> Result<PlaceResult, GeocodingError>;
}

/// Distance and duration between two coordinates.
#[async_trait]
pub trait Directions: Send + Sync {
    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        profile: TravelProfile,
    ) -> Result<RouteResult, RoutingError>;
}

/// Everything a lookup needs once it is detached from the client that built it.
pub(crate) struct Request {
    pub transport: Arc<dyn Transport>,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub timeout: Duration,
    pub retry: RetryOptions<TransportError>,
    pub cache_key: String,
}

impl Request {
    /// One logical GET: each attempt is raced against the timeout, failures go
    /// through the retry policy.
    pub async fn send(&self) -> Result<String, TransportError> {
        let transport = &*self.transport;
        let url = self.url.as_str();
        let params = self.params.as_slice();
        let timeout = self.timeout;
        retry_with_backoff(
            move || async move {
                match tokio::time::timeout(timeout, transport.get(url, params)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout(timeout)),
                }
            },
            &self.retry,
        )
        .await
    }
}
