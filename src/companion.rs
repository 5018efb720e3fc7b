//! The single entry point a presentation layer talks to.
//!
//! ```no_run
//! use std::time::Duration;
//! use wayfarer::{ClientConfig, GeocodingClient, RoutingClient, TravelCompanion, TravelProfile};
//!
//! # async fn run() -> Result<(), wayfarer::CompanionError> {
//! let config = ClientConfig::default();
//! let companion = TravelCompanion::new(
//!     GeocodingClient::with_config(&config)?,
//!     RoutingClient::with_config(&config)?,
//! )
//! .with_countrycodes(vec!["au".to_string()]);
//!
//! let destinations = companion.search("Opera House").await?;
//! if let Some(place) = destinations.first() {
//!     println!("{}", place.primary_name);
//! }
//! # Ok(())
//! # }
//! ```
use std::time::Duration;
use thiserror::Error;

use crate::async_impl::{Directions, Forward, Reverse};
use crate::coordinate::Coordinate;
use crate::error::{GeocodingError, GeolocationError, RoutingError, UserNotice};
use crate::geocoding::PlaceResult;
use crate::geolocation::{locate, Geolocator};
use crate::routing::{RouteResult, TravelProfile};
use crate::search::search_destination;

/// Any failure surfaced by [`TravelCompanion`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompanionError {
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}

impl CompanionError {
    pub fn notice(&self) -> UserNotice {
        match self {
            CompanionError::Geocoding(e) => e.notice(),
            CompanionError::Routing(e) => e.notice(),
            CompanionError::Geolocation(e) => e.notice(),
        }
    }

    /// Whether the user should be offered a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompanionError::Geocoding(e) => e.kind.is_retryable(),
            CompanionError::Routing(e) => e.kind.is_retryable(),
            CompanionError::Geolocation(e) => e.kind.is_retryable(),
        }
    }
}

/// Where am I, where do I want to go, and how far is it.
pub struct TravelCompanion<G, R> {
    geocoder: G,
    router: R,
    countrycodes: Vec<String>,
}

impl<G, R> TravelCompanion<G, R>
where
    G: Forward + Reverse,
    R: Directions,
{
    pub fn new(geocoder: G, router: R) -> Self {
        TravelCompanion {
            geocoder,
            router,
            countrycodes: Vec::new(),
        }
    }

    /// Country codes searches are biased to when the query names no country.
    pub fn with_countrycodes(mut self, countrycodes: Vec<String>) -> Self {
        self.countrycodes = countrycodes;
        self
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Locate the device and resolve its position to a place.
    pub async fn current_place<L>(
        &self,
        geolocator: &L,
        timeout: Duration,
    ) -> Result<PlaceResult, CompanionError>
    where
        L: Geolocator + ?Sized,
    {
        let position = locate(geolocator, timeout).await?;
        Ok(self.geocoder.reverse(&position).await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<PlaceResult>, CompanionError> {
        Ok(search_destination(&self.geocoder, query, &self.countrycodes).await?)
    }

    pub async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
        profile: TravelProfile,
    ) -> Result<RouteResult, CompanionError> {
        Ok(self.router.route(origin, destination, profile).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::async_impl::{GeocodingClient, RoutingClient};
    use crate::config::ClientConfig;
    use crate::error::{GeocodingErrorKind, GeolocationErrorKind, RoutingErrorKind, TransportError};
    use crate::geocoding::fixtures::{search_body, CALATRAVA, OPERA_HOUSE};
    use crate::geolocation::fake::FixedGeolocator;
    use crate::routing::fixtures::{CITY_ROUTE, NO_ROUTE};
    use crate::transport::scripted::ScriptedTransport;
    use std::sync::Arc;

    fn companion(
        geocoding: &ScriptedTransport,
        routing: &ScriptedTransport,
    ) -> TravelCompanion<GeocodingClient, RoutingClient> {
        let config = ClientConfig::default()
            .with_geocoding_endpoint("https://nominatim.test")
            .with_routing_endpoint("https://osrm.test");
        TravelCompanion::new(
            GeocodingClient::with_transport(&config, Arc::new(geocoding.clone())),
            RoutingClient::with_transport(&config, Arc::new(routing.clone())),
        )
        .with_countrycodes(vec!["au".to_string()])
    }

    #[tokio::test(start_paused = true)]
    async fn where_am_i() {
        let geocoding = ScriptedTransport::ok(CALATRAVA);
        let routing = ScriptedTransport::ok(CITY_ROUTE);
        let app = companion(&geocoding, &routing);

        let here = app
            .current_place(&FixedGeolocator::at(41.40139, 2.12870), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(here.primary_name, "68 Carrer de Calatrava");
        assert_eq!(geocoding.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn denied_location_skips_the_lookup() {
        let geocoding = ScriptedTransport::ok(CALATRAVA);
        let routing = ScriptedTransport::ok(CITY_ROUTE);
        let app = companion(&geocoding, &routing);

        let err = app
            .current_place(&FixedGeolocator::failing(1), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(
            &err,
            CompanionError::Geolocation(e) if e.kind == GeolocationErrorKind::PermissionDenied
        ));
        assert_eq!(err.notice(), UserNotice::LocationDenied);
        assert_eq!(geocoding.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn search_then_route() {
        let geocoding = ScriptedTransport::ok(&search_body(&[OPERA_HOUSE]));
        let routing = ScriptedTransport::ok(CITY_ROUTE);
        let app = companion(&geocoding, &routing);

        let places = app.search("opera house").await.unwrap();
        assert_eq!(geocoding.last_param("countrycodes").as_deref(), Some("au"));

        let origin = Coordinate::new(-33.8150, 151.0011).unwrap();
        let route = app
            .route(&origin, &places[0].coordinate, TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(route.formatted_distance, "12.5 km");
    }

    #[tokio::test(start_paused = true)]
    async fn failures_map_to_distinct_notices() {
        let geocoding = ScriptedTransport::new(vec![Err(TransportError::Network(
            "connection refused".into(),
        ))]);
        let routing = ScriptedTransport::ok(NO_ROUTE);
        let app = companion(&geocoding, &routing);

        let offline = app.search("opera house").await.unwrap_err();
        assert!(matches!(
            &offline,
            CompanionError::Geocoding(e) if e.kind == GeocodingErrorKind::Network
        ));
        assert_eq!(offline.notice(), UserNotice::Offline);
        assert!(offline.is_retryable());

        let origin = Coordinate::new(-33.8568, 151.2153).unwrap();
        let honolulu = Coordinate::new(21.3069, -157.8583).unwrap();
        let no_route = app
            .route(&origin, &honolulu, TravelProfile::Driving)
            .await
            .unwrap_err();
        assert!(matches!(
            &no_route,
            CompanionError::Routing(e) if e.kind == RoutingErrorKind::NoRoute
        ));
        assert_eq!(no_route.notice(), UserNotice::NoRoute);
        assert!(!no_route.is_retryable());

        let empty = app.search("x").await.unwrap_err();
        assert_eq!(empty.notice(), UserNotice::CheckInput);
    }
}
