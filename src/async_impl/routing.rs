use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::async_impl::{Directions, Request};
use crate::cache::TtlCache;
use crate::config::ClientConfig;
use crate::coordinate::Coordinate;
use crate::dedup::RequestDeduplicator;
use crate::error::{RoutingError, TransportError};
use crate::retry::RetryOptions;
use crate::routing::{classify_failure, parse_route_body, RouteResult, TravelProfile};
use crate::signature::RequestSignature;
use crate::transport::{HttpTransport, Transport};

/// Routes between points within ~111m of each other are interchangeable.
const ROUTE_KEY_DECIMALS: usize = 3;

type RouteOutcome = Result<RouteResult, RoutingError>;

/// An OSRM routing client with request de-duplication, retries and an optional short-lived cache.
pub struct RoutingClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    request_timeout: Duration,
    retry: RetryOptions<TransportError>,
    cache: Option<TtlCache<RouteResult>>,
    requests: RequestDeduplicator<RouteOutcome>,
}

impl RoutingClient {
    /// Create a client for the public OSRM demo server with default settings
    pub fn new() -> Result<Self, RoutingError> {
        Self::with_config(&ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Result<Self, RoutingError> {
        let transport = HttpTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        RoutingClient {
            transport,
            endpoint: config.routing_endpoint.clone(),
            request_timeout: config.request_timeout,
            retry: config.retry.clone(),
            cache: config.route_ttl.map(TtlCache::new),
            requests: RequestDeduplicator::new(config.effective_pending_ceiling()),
        }
    }

    /// Distance and duration of the best route from `origin` to `destination`.
    ///
    /// A provider answer that no route exists (e.g. the points are separated by
    /// open ocean) is a `NoRoute` error, distinct from transport failures.
    pub async fn calculate_route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        profile: TravelProfile,
    ) -> RouteOutcome {
        let url = format!(
            "{}route/v1/{}/{},{};{},{}",
            self.endpoint,
            profile,
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude()
        );
        let signature = RequestSignature::builder("GET", &format!("{}route/v1", self.endpoint))
            .param("profile", profile.as_str())
            .param("from", origin.rounded_key(ROUTE_KEY_DECIMALS))
            .param("to", destination.rounded_key(ROUTE_KEY_DECIMALS))
            .build();

        if let Some(route) = self.cache.as_ref().and_then(|c| c.get(signature.as_str())) {
            return Ok(route);
        }

        let request = Request {
            transport: Arc::clone(&self.transport),
            url,
            params: vec![("overview".to_string(), "false".to_string())],
            timeout: self.request_timeout,
            retry: self.retry.clone(),
            cache_key: signature.to_string(),
        };
        let cache = self.cache.clone();
        self.requests
            .deduplicate(signature.as_str(), move || fetch_route(request, cache))
            .await
    }

    /// Like [`calculate_route`](#method.calculate_route) for raw degrees, rejecting invalid
    /// values with `InvalidCoordinates` before any request.
    pub async fn calculate_route_degrees(
        &self,
        origin: (f64, f64),
        destination: (f64, f64),
        profile: TravelProfile,
    ) -> RouteOutcome {
        let origin = Coordinate::new(origin.0, origin.1)?;
        let destination = Coordinate::new(destination.0, destination.1)?;
        self.calculate_route(&origin, &destination, profile).await
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

async fn fetch_route(request: Request, cache: Option<TtlCache<RouteResult>>) -> RouteOutcome {
    let body = request.send().await.map_err(classify_failure)?;
    let route = parse_route_body(&body)?;
    debug!(
        "{}: {} in {}",
        request.cache_key, route.formatted_distance, route.formatted_duration
    );
    if let Some(cache) = cache {
        cache.set(request.cache_key, route.clone());
    }
    Ok(route)
}

#[async_trait]
impl Directions for RoutingClient {
    async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        profile: TravelProfile,
    ) -> RouteOutcome {
        self.calculate_route(origin, destination, profile).await
    }
}
