use serde::{Deserialize, Serialize};

/// The top-level response of an OSRM `route` service call
///
/// See [the documentation](http://project-osrm.org/docs/v5.24.0/api/#route-service) for more details
///
///```json
///{
///  "code": "Ok",
///  "routes": [
///    {
///      "distance": 12456.3,
///      "duration": 1534.9,
///      "weight": 1534.9,
///      "weight_name": "routability",
///      "legs": []
///    }
///  ],
///  "waypoints": []
///}
///```
///
/// Failures carry a non-`Ok` code and a message, e.g. `{"code": "NoRoute", "message": "Impossible route between points"}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OsrmResponse {
    pub code: String,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

/// A single route; only the totals are used
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OsrmRoute {
    /// meters
    pub distance: f64,
    /// seconds
    pub duration: f64,
}

/// Status codes meaning the request was understood but no route exists
pub const NO_ROUTE_CODES: &[&str] = &["NoRoute", "NoSegment"];
/// Status codes meaning the coordinates themselves were rejected
pub const INVALID_INPUT_CODES: &[&str] = &["InvalidValue", "InvalidQuery"];
