use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters for a Nominatim forward search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams<'a> {
    pub query: &'a str,
    pub limit: usize,
    pub addressdetails: bool,
    pub countrycodes: &'a [String],
}

impl<'a> SearchParams<'a> {
    pub fn as_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("q".to_string(), self.query.to_string()),
            ("format".to_string(), "json".to_string()),
            ("limit".to_string(), self.limit.to_string()),
            (
                "addressdetails".to_string(),
                String::from(if self.addressdetails { "1" } else { "0" }),
            ),
        ];
        if !self.countrycodes.is_empty() {
            query.push(("countrycodes".to_string(), self.countrycodes.join(",")));
        }
        query
    }
}

/// Query parameters for a Nominatim reverse lookup
pub fn reverse_query(latitude: f64, longitude: f64) -> Vec<(String, String)> {
    vec![
        ("lat".to_string(), latitude.to_string()),
        ("lon".to_string(), longitude.to_string()),
        ("format".to_string(), "json".to_string()),
        ("addressdetails".to_string(), "1".to_string()),
    ]
}

pub fn deserialize_string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(u64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => Ok(s),
        StringOrInt::Int(i) => Ok(i.to_string()),
    }
}

/// A single place as returned by `/search` (in an array) and `/reverse`
///
/// See [the documentation](https://nominatim.org/release-docs/develop/api/Output/#json) for more details
///
///```json
///{
///  "place_id": 159153408,
///  "licence": "Data © OpenStreetMap contributors, ODbL 1.0. https://osm.org/copyright",
///  "osm_type": "way",
///  "osm_id": 4591080,
///  "lat": "-33.85719805",
///  "lon": "151.21512338473752",
///  "class": "tourism",
///  "type": "attraction",
///  "display_name": "Sydney Opera House, Bennelong Point, Sydney, NSW 2000, Australia",
///  "address": {
///    "attraction": "Sydney Opera House",
///    "road": "Bennelong Point",
///    "suburb": "Sydney",
///    "city": "Sydney",
///    "state": "NSW",
///    "postcode": "2000",
///    "country": "Australia",
///    "country_code": "au"
///  }
///}
///```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NominatimPlace {
    #[serde(deserialize_with = "deserialize_string_or_int")]
    pub place_id: String,
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    pub address: Option<AddressDetails>,
}

/// Address details in the result object
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddressDetails {
    pub attraction: Option<String>,
    pub amenity: Option<String>,
    pub tourism: Option<String>,
    pub building: Option<String>,
    pub leisure: Option<String>,
    pub shop: Option<String>,
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// The body of a `/reverse` call: a place, or an error object when nothing is there
/// (e.g. a point in the open ocean).
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ReverseResponse {
    Error { error: String },
    Place(NominatimPlace),
}
