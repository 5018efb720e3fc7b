use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::coordinate::InvalidCoordinate;

/// Coarse classification of every failure the client can produce.
///
/// Retry decisions are made on this taxonomy, never on message strings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection failed, DNS failure, TLS failure
    Network,
    /// A single attempt exceeded its time bound
    Timeout,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
    /// HTTP 4xx other than 429; never transient
    ClientError,
    /// Valid response with an empty/negative geocoding result
    NotFound,
    /// Valid response stating that no route exists
    NoRoute,
    /// Malformed or unexpected payload
    InvalidResponse,
    /// Precondition violated before any network call
    InvalidInput,
}

impl FailureKind {
    /// Whether another attempt at the same request could plausibly succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::Network | FailureKind::Timeout | FailureKind::ServerError
        )
    }
}

/// What the presentation layer should tell the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserNotice {
    NoResults,
    NoRoute,
    Offline,
    TryAgain,
    CheckInput,
    LocationDenied,
    LocationUnavailable,
    LocationUnsupported,
}

impl UserNotice {
    pub fn message(self) -> &'static str {
        match self {
            UserNotice::NoResults => "No results found for that search.",
            UserNotice::NoRoute => "No driving route exists between these places.",
            UserNotice::Offline => "You appear to be offline. Check your connection.",
            UserNotice::TryAgain => "Something went wrong. Please try again.",
            UserNotice::CheckInput => "Please check what you entered and try again.",
            UserNotice::LocationDenied => "Location access was denied.",
            UserNotice::LocationUnavailable => "Your location could not be determined.",
            UserNotice::LocationUnsupported => "Location is not supported on this device.",
        }
    }
}

impl fmt::Display for UserNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors raised by a single outbound HTTP attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network request failed: {0}")]
    Network(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider returned HTTP {status}")]
    Status { status: u16, body: String },
    #[error("Could not read response body: {0}")]
    Body(String),
}

impl TransportError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TransportError::Network(_) => FailureKind::Network,
            TransportError::Timeout(_) => FailureKind::Timeout,
            TransportError::Status { status, .. } => match *status {
                404 => FailureKind::NotFound,
                429 => FailureKind::RateLimited,
                500..=599 => FailureKind::ServerError,
                _ => FailureKind::ClientError,
            },
            TransportError::Body(_) => FailureKind::InvalidResponse,
        }
    }

    /// The default retry policy: network failures, timeouts and 5xx.
    pub fn is_transient(&self) -> bool {
        self.failure_kind().is_transient()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeocodingErrorKind {
    NotFound,
    ServiceUnavailable,
    InvalidResponse,
    Network,
    InvalidInput,
}

impl GeocodingErrorKind {
    pub fn notice(self) -> UserNotice {
        match self {
            GeocodingErrorKind::NotFound => UserNotice::NoResults,
            GeocodingErrorKind::ServiceUnavailable => UserNotice::TryAgain,
            GeocodingErrorKind::InvalidResponse => UserNotice::TryAgain,
            GeocodingErrorKind::Network => UserNotice::Offline,
            GeocodingErrorKind::InvalidInput => UserNotice::CheckInput,
        }
    }

    /// Whether the user should be offered a retry.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            GeocodingErrorKind::ServiceUnavailable | GeocodingErrorKind::Network
        )
    }
}

/// Errors that can occur during geocoding operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GeocodingError {
    pub kind: GeocodingErrorKind,
    pub failure: FailureKind,
    pub message: String,
}

impl GeocodingError {
    pub fn new(kind: GeocodingErrorKind, failure: FailureKind, message: impl Into<String>) -> Self {
        GeocodingError {
            kind,
            failure,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(
            GeocodingErrorKind::InvalidInput,
            FailureKind::InvalidInput,
            message,
        )
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(
            GeocodingErrorKind::InvalidResponse,
            FailureKind::InvalidResponse,
            message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(GeocodingErrorKind::NotFound, FailureKind::NotFound, message)
    }

    pub fn notice(&self) -> UserNotice {
        self.kind.notice()
    }
}

impl From<TransportError> for GeocodingError {
    fn from(err: TransportError) -> Self {
        let failure = err.failure_kind();
        let kind = match failure {
            FailureKind::Network | FailureKind::Timeout => GeocodingErrorKind::Network,
            FailureKind::NotFound => GeocodingErrorKind::NotFound,
            FailureKind::InvalidResponse => GeocodingErrorKind::InvalidResponse,
            _ => GeocodingErrorKind::ServiceUnavailable,
        };
        GeocodingError::new(kind, failure, format!("Geocoding request failed: {}", err))
    }
}

impl From<InvalidCoordinate> for GeocodingError {
    fn from(err: InvalidCoordinate) -> Self {
        GeocodingError::invalid_input(err.to_string())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoutingErrorKind {
    NoRoute,
    InvalidCoordinates,
    ServiceUnavailable,
    InvalidResponse,
    Network,
}

impl RoutingErrorKind {
    pub fn notice(self) -> UserNotice {
        match self {
            RoutingErrorKind::NoRoute => UserNotice::NoRoute,
            RoutingErrorKind::InvalidCoordinates => UserNotice::CheckInput,
            RoutingErrorKind::ServiceUnavailable => UserNotice::TryAgain,
            RoutingErrorKind::InvalidResponse => UserNotice::TryAgain,
            RoutingErrorKind::Network => UserNotice::Offline,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            RoutingErrorKind::ServiceUnavailable | RoutingErrorKind::Network
        )
    }
}

/// Errors that can occur while calculating a route
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RoutingError {
    pub kind: RoutingErrorKind,
    pub failure: FailureKind,
    pub message: String,
}

impl RoutingError {
    pub fn new(kind: RoutingErrorKind, failure: FailureKind, message: impl Into<String>) -> Self {
        RoutingError {
            kind,
            failure,
            message: message.into(),
        }
    }

    pub fn no_route(message: impl Into<String>) -> Self {
        Self::new(RoutingErrorKind::NoRoute, FailureKind::NoRoute, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(
            RoutingErrorKind::InvalidResponse,
            FailureKind::InvalidResponse,
            message,
        )
    }

    pub fn notice(&self) -> UserNotice {
        self.kind.notice()
    }
}

impl From<TransportError> for RoutingError {
    fn from(err: TransportError) -> Self {
        let failure = err.failure_kind();
        let kind = match failure {
            FailureKind::Network | FailureKind::Timeout => RoutingErrorKind::Network,
            FailureKind::InvalidResponse => RoutingErrorKind::InvalidResponse,
            _ => RoutingErrorKind::ServiceUnavailable,
        };
        RoutingError::new(kind, failure, format!("Routing request failed: {}", err))
    }
}

impl From<InvalidCoordinate> for RoutingError {
    fn from(err: InvalidCoordinate) -> Self {
        RoutingError::new(
            RoutingErrorKind::InvalidCoordinates,
            FailureKind::InvalidInput,
            err.to_string(),
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeolocationErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unsupported,
}

impl GeolocationErrorKind {
    /// Classify a platform position-error code (1, 2, 3 as reported by device location APIs).
    pub fn from_platform_code(code: u16) -> Self {
        match code {
            1 => GeolocationErrorKind::PermissionDenied,
            3 => GeolocationErrorKind::Timeout,
            _ => GeolocationErrorKind::PositionUnavailable,
        }
    }

    pub fn notice(self) -> UserNotice {
        match self {
            GeolocationErrorKind::PermissionDenied => UserNotice::LocationDenied,
            GeolocationErrorKind::PositionUnavailable => UserNotice::LocationUnavailable,
            GeolocationErrorKind::Timeout => UserNotice::TryAgain,
            GeolocationErrorKind::Unsupported => UserNotice::LocationUnsupported,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            GeolocationErrorKind::PositionUnavailable | GeolocationErrorKind::Timeout
        )
    }
}

/// Errors reported while obtaining the device position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GeolocationError {
    pub kind: GeolocationErrorKind,
    pub message: String,
}

impl GeolocationError {
    pub fn new(kind: GeolocationErrorKind, message: impl Into<String>) -> Self {
        GeolocationError {
            kind,
            message: message.into(),
        }
    }

    /// Build from a platform error code and the platform's own message.
    pub fn from_platform(code: u16, message: impl Into<String>) -> Self {
        Self::new(GeolocationErrorKind::from_platform_code(code), message)
    }

    pub fn notice(&self) -> UserNotice {
        self.kind.notice()
    }
}
