//! Driving distance and time from an [OSRM](http://project-osrm.org/) compatible routing service.
//!
//! Requests are performed by [`RoutingClient`](../async_impl/struct.RoutingClient.html);
//! this module holds the result type, travel profiles, formatting and response parsing.
pub use crate::shared::osrm::{OsrmResponse, OsrmRoute};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{FailureKind, RoutingError, RoutingErrorKind, TransportError};
use crate::shared::osrm::{INVALID_INPUT_CODES, NO_ROUTE_CODES};

/// Distance and travel time of the best route
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    /// e.g. `"12.5 km"`
    pub formatted_distance: String,
    /// e.g. `"1 hour 30 min"`
    pub formatted_duration: String,
}

impl RouteResult {
    pub fn new(distance_meters: f64, duration_seconds: f64) -> Self {
        RouteResult {
            distance_meters,
            duration_seconds,
            formatted_distance: format_distance(distance_meters),
            formatted_duration: format_duration(duration_seconds),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelProfile {
    Driving,
    Walking,
    Cycling,
}

impl Default for TravelProfile {
    fn default() -> Self {
        TravelProfile::Driving
    }
}

impl TravelProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelProfile::Driving => "driving",
            TravelProfile::Walking => "walking",
            TravelProfile::Cycling => "cycling",
        }
    }
}

impl fmt::Display for TravelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelProfile {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" | "car" => Ok(TravelProfile::Driving),
            "walking" | "foot" => Ok(TravelProfile::Walking),
            "cycling" | "bike" => Ok(TravelProfile::Cycling),
            other => Err(RoutingError::new(
                RoutingErrorKind::InvalidCoordinates,
                FailureKind::InvalidInput,
                format!("Unknown travel profile {:?}", other),
            )),
        }
    }
}

/// Kilometers to one decimal place.
///
/// ```
/// assert_eq!(wayfarer::routing::format_distance(12_456.0), "12.5 km");
/// ```
pub fn format_distance(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

/// `"N minutes"` under an hour, otherwise `"H hour(s)"` with `" M min"` appended when non-zero.
///
/// ```
/// use wayfarer::routing::format_duration;
///
/// assert_eq!(format_duration(45.0 * 60.0), "45 minutes");
/// assert_eq!(format_duration(90.0 * 60.0), "1 hour 30 min");
/// assert_eq!(format_duration(120.0 * 60.0), "2 hours");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let total_minutes = (seconds.max(0.0) / 60.0).round() as u64;
    if total_minutes < 60 {
        return format!("{} minutes", total_minutes);
    }
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    let unit = if hours == 1 { "hour" } else { "hours" };
    if minutes == 0 {
        format!("{} {}", hours, unit)
    } else {
        format!("{} {} {} min", hours, unit, minutes)
    }
}

fn decode(body: &str) -> Result<OsrmResponse, RoutingError> {
    serde_json::from_str(body).map_err(|e| {
        RoutingError::invalid_response(format!("Failed to parse routing response: {}", e))
    })
}

fn from_provider_code(response: &OsrmResponse) -> Option<RoutingError> {
    let message = response
        .message
        .clone()
        .unwrap_or_else(|| response.code.clone());
    if NO_ROUTE_CODES.iter().any(|c| *c == response.code) {
        Some(RoutingError::no_route(message))
    } else if INVALID_INPUT_CODES.iter().any(|c| *c == response.code) {
        Some(RoutingError::new(
            RoutingErrorKind::InvalidCoordinates,
            FailureKind::ClientError,
            message,
        ))
    } else if response.code != "Ok" {
        Some(RoutingError::new(
            RoutingErrorKind::ServiceUnavailable,
            FailureKind::ClientError,
            message,
        ))
    } else {
        None
    }
}

/// Turn a successful body into the first (best) route.
pub fn parse_route_body(body: &str) -> Result<RouteResult, RoutingError> {
    let response = decode(body)?;
    if let Some(err) = from_provider_code(&response) {
        return Err(err);
    }
    let route = response
        .routes
        .first()
        .ok_or_else(|| RoutingError::no_route("Provider returned no routes"))?;
    if !route.distance.is_finite()
        || !route.duration.is_finite()
        || route.distance < 0.0
        || route.duration < 0.0
    {
        return Err(RoutingError::invalid_response(
            "Provider returned a route with invalid totals",
        ));
    }
    Ok(RouteResult::new(route.distance, route.duration))
}

/// Classify a failed request, reading the provider's status code from a 4xx body when present.
pub fn classify_failure(err: TransportError) -> RoutingError {
    if let TransportError::Status { status, body } = &err {
        if (400..500).contains(status) && *status != 429 {
            if let Some(provider_err) = decode(body).ok().as_ref().and_then(from_provider_code) {
                return provider_err;
            }
        }
    }
    RoutingError::from(err)
}
