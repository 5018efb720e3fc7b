//! This crate provides the location core of a travel companion: forward– and reverse-geocoding
//! against a [Nominatim](https://nominatim.org/) compatible service, and driving distance and
//! time from an [OSRM](http://project-osrm.org/) compatible router.
//!
//! Every lookup goes through the same pipeline: a short-lived cache, then de-duplication of
//! identical in-flight requests, then retries with exponential backoff around a time-bounded
//! HTTP attempt. Providers are reached through the `Forward`, `Reverse` and `Directions` traits,
//! so callers such as [`TravelCompanion`](companion/struct.TravelCompanion.html) can be tested
//! against fakes.
//!
//! Failures are classified into a small taxonomy (see [`error`](error/index.html)); each kind
//! maps to exactly one [`UserNotice`](error/enum.UserNotice.html) a UI can show.
//!
//! ### A note on Coordinate Order
//! Nominatim takes `lat`/`lon` parameters while OSRM takes `lon,lat` pairs in the path.
//! [`Coordinate`](coordinate/struct.Coordinate.html) only exposes named accessors, and
//! converts to `geo_types::Point` in `(x, y)` = `(lon, lat)` order.
//!
//! ### Usage of rustls
//!
//! If you like to use [rustls](https://github.com/ctz/rustls) instead of OpenSSL
//! you can enable the `rustls-tls` feature in your `Cargo.toml`:
//!
//!```toml
//![dependencies]
//!wayfarer = { version = "*", default-features = false, features = ["rustls-tls"] }
//!```

/// Default `User-Agent`; public Nominatim and OSRM instances reject anonymous clients.
pub static UA_STRING: &str = "Wayfarer-Rust";

pub use geo_types::Point;

pub mod cache;
pub mod config;
pub mod coordinate;
pub mod dedup;
pub mod error;
pub mod retry;
pub mod signature;
pub mod transport;

mod shared;

// Result types, parsing and formatting for each service
pub mod geocoding;
pub mod routing;

pub mod async_impl;
pub use crate::async_impl::{Directions, Forward, GeocodingClient, Reverse, RoutingClient};

pub mod companion;
pub mod geolocation;
pub mod search;

pub use crate::cache::TtlCache;
pub use crate::companion::{CompanionError, TravelCompanion};
pub use crate::config::{ClientConfig, ConfigError};
pub use crate::coordinate::{validate_coordinates, Coordinate, InvalidCoordinate};
pub use crate::dedup::RequestDeduplicator;
pub use crate::error::{
    FailureKind, GeocodingError, GeocodingErrorKind, GeolocationError, GeolocationErrorKind,
    RoutingError, RoutingErrorKind, TransportError, UserNotice,
};
pub use crate::geocoding::{AddressComponents, GeocodeOptions, PlaceResult};
pub use crate::geolocation::Geolocator;
pub use crate::retry::{retry_with_backoff, RetryOptions};
pub use crate::routing::{RouteResult, TravelProfile};
pub use crate::signature::RequestSignature;
pub use crate::transport::{HttpTransport, Transport};
