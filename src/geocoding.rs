//! Place lookup against an [OpenStreetMap Nominatim](https://nominatim.org/) compatible service.
//!
//! Lookups are performed by [`GeocodingClient`](../async_impl/struct.GeocodingClient.html).
//! This module holds the result types and the pure mapping from provider records to
//! [`PlaceResult`](struct.PlaceResult.html), shared by the forward and reverse paths.
//!
//! While Nominatim is free, see the [Nominatim Usage Policy](https://operations.osmfoundation.org/policies/nominatim/)
//! for details on usage requirements, including a maximum of 1 request per second and an
//! identifying User-Agent.
pub use crate::shared::nominatim::{AddressDetails, NominatimPlace, ReverseResponse, SearchParams};

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::GeocodingError;

/// Queries shorter than this (after trimming) are rejected before any lookup.
pub const MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_LIMIT: usize = 5;

/// Structured address parts; every field is optional
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub street: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
}

/// A resolved place
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResult {
    /// Opaque provider id
    pub id: String,
    /// Full formatted name, e.g. `"Sydney Opera House, Bennelong Point, Sydney, NSW 2000, Australia"`
    pub display_name: String,
    /// Best short label, e.g. `"Sydney Opera House"`
    pub primary_name: String,
    pub coordinate: Coordinate,
    pub address: Option<AddressComponents>,
}

/// Options for a forward lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeocodeOptions {
    pub limit: usize,
    pub addressdetails: bool,
    /// ISO 3166-1 alpha-2 codes to restrict results to
    pub countrycodes: Vec<String>,
}

impl Default for GeocodeOptions {
    fn default() -> Self {
        GeocodeOptions {
            limit: DEFAULT_LIMIT,
            addressdetails: true,
            countrycodes: Vec::new(),
        }
    }
}

impl GeocodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_addressdetails(mut self, addressdetails: bool) -> Self {
        self.addressdetails = addressdetails;
        self
    }

    /// Codes are lower-cased, sorted and de-duplicated.
    pub fn with_countrycodes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.countrycodes = normalize_countrycodes(codes);
        self
    }
}

/// Lower-case, sort and de-duplicate ISO country codes, dropping blanks.
pub fn normalize_countrycodes<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut codes: Vec<String> = codes
        .into_iter()
        .map(|c| c.as_ref().trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    codes.sort();
    codes.dedup();
    codes
}

/// Trim a query and enforce the minimum length.
pub fn normalize_query(query: &str) -> Result<String, GeocodingError> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_LEN {
        return Err(GeocodingError::invalid_input(format!(
            "Search query must be at least {} characters",
            MIN_QUERY_LEN
        )));
    }
    Ok(trimmed.to_string())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn street_line(address: &AddressDetails) -> Option<String> {
    let road = non_empty(&address.road)?;
    Some(match non_empty(&address.house_number) {
        Some(number) => format!("{} {}", number, road),
        None => road.to_string(),
    })
}

/// The best human label for a place.
///
/// Named feature (attraction, amenity, tourism, building, leisure, shop) first,
/// then the street address, then the first segment of the display name.
pub fn primary_name(display_name: &str, address: Option<&AddressDetails>) -> String {
    if let Some(address) = address {
        let named = [
            &address.attraction,
            &address.amenity,
            &address.tourism,
            &address.building,
            &address.leisure,
            &address.shop,
        ]
        .into_iter()
        .find_map(non_empty);
        if let Some(name) = named {
            return name.to_string();
        }
        if let Some(street) = street_line(address) {
            return street;
        }
    }
    display_name
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(display_name)
        .to_string()
}

fn address_components(address: &AddressDetails) -> AddressComponents {
    let owned = |v: Option<&str>| v.map(str::to_string);
    AddressComponents {
        street: street_line(address),
        suburb: owned(non_empty(&address.suburb).or_else(|| non_empty(&address.neighbourhood))),
        city: owned(
            non_empty(&address.city)
                .or_else(|| non_empty(&address.town))
                .or_else(|| non_empty(&address.village)),
        ),
        county: owned(non_empty(&address.county)),
        state: owned(non_empty(&address.state)),
        country: owned(non_empty(&address.country)),
        postcode: owned(non_empty(&address.postcode)),
    }
}

fn parse_degrees(value: &str, axis: &str) -> Result<f64, GeocodingError> {
    value.trim().parse::<f64>().map_err(|_| {
        GeocodingError::invalid_response(format!("Provider returned invalid {} {:?}", axis, value))
    })
}

/// Validate a provider record and convert it into a [`PlaceResult`](struct.PlaceResult.html).
pub fn place_from_nominatim(place: &NominatimPlace) -> Result<PlaceResult, GeocodingError> {
    let latitude = parse_degrees(&place.lat, "latitude")?;
    let longitude = parse_degrees(&place.lon, "longitude")?;
    let coordinate = Coordinate::new(latitude, longitude).map_err(|e| {
        GeocodingError::invalid_response(format!("Provider returned {}", e))
    })?;
    if place.display_name.trim().is_empty() {
        return Err(GeocodingError::invalid_response(
            "Provider returned a place without a display name",
        ));
    }
    Ok(PlaceResult {
        id: place.place_id.clone(),
        display_name: place.display_name.clone(),
        primary_name: primary_name(&place.display_name, place.address.as_ref()),
        coordinate,
        address: place.address.as_ref().map(address_components),
    })
}

/// Parse the body of a `/search` call. An empty array is a valid, empty result.
pub fn parse_search_body(body: &str) -> Result<Vec<PlaceResult>, GeocodingError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body).map_err(|e| {
        GeocodingError::invalid_response(format!("Failed to parse geocoding response: {}", e))
    })?;
    places.iter().map(place_from_nominatim).collect()
}

/// Parse the body of a `/reverse` call. A provider error object means nothing is there.
pub fn parse_reverse_body(body: &str) -> Result<PlaceResult, GeocodingError> {
    let response: ReverseResponse = serde_json::from_str(body).map_err(|e| {
        GeocodingError::invalid_response(format!(
            "Failed to parse reverse geocoding response: {}",
            e
        ))
    })?;
    match response {
        ReverseResponse::Place(place) => place_from_nominatim(&place),
        ReverseResponse::Error { error } => Err(GeocodingError::not_found(format!(
            "No place found at this location: {}",
            error
        ))),
    }
}
