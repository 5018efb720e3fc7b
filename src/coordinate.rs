use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use thiserror::Error;

/// Reasons a latitude/longitude pair is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidCoordinate {
    #[error("Latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("Longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("Coordinates must be finite numbers")]
    NotFinite,
}

/// Check that a latitude/longitude pair describes a point on the globe.
///
/// ```
/// use wayfarer::validate_coordinates;
///
/// assert!(validate_coordinates(-33.8568, 151.2153).is_ok());
/// assert!(validate_coordinates(91.0, 0.0).is_err());
/// ```
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), InvalidCoordinate> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(InvalidCoordinate::NotFinite);
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(InvalidCoordinate::Latitude(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(InvalidCoordinate::Longitude(longitude));
    }
    Ok(())
}

/// A validated WGS84 position.
///
/// Unlike `geo_types::Point`, which is `(x, y)` = `(lon, lat)`, the accessors here are
/// named, so the order never matters to callers.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        validate_coordinates(latitude, longitude)?;
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// `lat,lon` rounded to `decimals` places, used as a cache/dedup key fragment.
    ///
    /// 4 decimals is roughly 11m, 3 decimals roughly 111m.
    pub fn rounded_key(&self, decimals: usize) -> String {
        format!(
            "{},{}",
            format_rounded(self.latitude, decimals),
            format_rounded(self.longitude, decimals)
        )
    }
}

pub(crate) fn format_rounded(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    // adding 0.0 folds -0.0 into 0.0 so both sides of the equator share a key
    let rounded = (value * scale).round() / scale + 0.0;
    format!("{:.*}", decimals, rounded)
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Point<f64> {
        // Point is lon, lat (x, y)
        Point::new(c.longitude, c.latitude)
    }
}

impl TryFrom<Point<f64>> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(p: Point<f64>) -> Result<Self, Self::Error> {
        Coordinate::new(p.y(), p.x())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            validate_coordinates(91.0, 0.0),
            Err(InvalidCoordinate::Latitude(91.0))
        );
        assert_eq!(
            validate_coordinates(0.0, 181.0),
            Err(InvalidCoordinate::Longitude(181.0))
        );
        assert_eq!(
            validate_coordinates(f64::NAN, 0.0),
            Err(InvalidCoordinate::NotFinite)
        );
        assert!(validate_coordinates(-33.8568, 151.2153).is_ok());
        assert!(validate_coordinates(90.0, -180.0).is_ok());
    }

    #[test]
    fn nearby_points_share_a_rounded_key() {
        let a = Coordinate::new(-33.85681, 151.21532).unwrap();
        let b = Coordinate::new(-33.85684, 151.21528).unwrap();
        assert_eq!(a.rounded_key(4), "-33.8568,151.2153");
        assert_eq!(a.rounded_key(4), b.rounded_key(4));
        assert_ne!(a.rounded_key(4), Coordinate::new(-33.8570, 151.2153).unwrap().rounded_key(4));
    }

    #[test]
    fn negative_zero_is_normalised() {
        let c = Coordinate::new(-0.00001, 0.00001).unwrap();
        assert_eq!(c.rounded_key(3), "0.000,0.000");
    }

    #[test]
    fn converts_to_and_from_points() {
        let c = Coordinate::new(41.40139, 2.12870).unwrap();
        let p: Point<f64> = c.into();
        assert_eq!(p, Point::new(2.12870, 41.40139));
        assert_eq!(Coordinate::try_from(p).unwrap(), c);
        assert!(Coordinate::try_from(Point::new(200.0, 0.0)).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Coordinate =
            serde_json::from_str(r#"{"latitude": 48.17, "longitude": 11.58}"#).unwrap();
        assert_eq!(ok.latitude(), 48.17);
        assert!(serde_json::from_str::<Coordinate>(r#"{"latitude": 95, "longitude": 0}"#).is_err());
    }
}
