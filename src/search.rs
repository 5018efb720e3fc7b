//! Free-text destination search on top of any [`Forward`](../async_impl/trait.Forward.html) geocoder.
//!
//! A caller usually wants results biased to the user's own country, unless the
//! query already names one ("Lisbon, Portugal"). Deciding that is a heuristic:
//! it matches country names as substrings and treats any `", "` as a qualified
//! place, so it can be wrong in both directions.
use log::debug;

use crate::async_impl::Forward;
use crate::error::GeocodingError;
use crate::geocoding::{normalize_query, GeocodeOptions, PlaceResult, DEFAULT_LIMIT};

/// Lower-case country names checked by [`mentions_country`].
pub const COUNTRY_NAMES: &[&str] = &[
    "argentina",
    "australia",
    "austria",
    "belgium",
    "brazil",
    "canada",
    "chile",
    "china",
    "colombia",
    "croatia",
    "czech republic",
    "denmark",
    "egypt",
    "england",
    "finland",
    "france",
    "germany",
    "greece",
    "hungary",
    "iceland",
    "india",
    "indonesia",
    "ireland",
    "israel",
    "italy",
    "japan",
    "kenya",
    "malaysia",
    "mexico",
    "morocco",
    "netherlands",
    "new zealand",
    "norway",
    "peru",
    "philippines",
    "poland",
    "portugal",
    "russia",
    "scotland",
    "singapore",
    "south africa",
    "south korea",
    "spain",
    "sweden",
    "switzerland",
    "thailand",
    "turkey",
    "united kingdom",
    "united states",
    "usa",
    "vietnam",
    "wales",
];

/// Whether `query` appears to name its country already.
///
/// ```
/// use wayfarer::search::mentions_country;
///
/// assert!(mentions_country("Valencia, Spain"));
/// assert!(mentions_country("Springfield, IL"));
/// assert!(!mentions_country("Opera House"));
/// ```
pub fn mentions_country(query: &str) -> bool {
    let query = query.to_lowercase();
    query.contains(", ") || COUNTRY_NAMES.iter().any(|name| query.contains(name))
}

/// Search for a destination, biasing to `default_countrycodes` unless the query names a country.
///
/// Queries shorter than two characters after trimming are rejected before any request.
pub async fn search_destination<G>(
    geocoder: &G,
    query: &str,
    default_countrycodes: &[String],
) -> Result<Vec<PlaceResult>, GeocodingError>
where
    G: Forward + ?Sized,
{
    let query = normalize_query(query)?;
    let mut options = GeocodeOptions::new()
        .with_limit(DEFAULT_LIMIT)
        .with_addressdetails(true);
    if !default_countrycodes.is_empty() {
        if mentions_country(&query) {
            debug!("Query {:?} names a country, searching worldwide", query);
        } else {
            options = options.with_countrycodes(default_countrycodes);
        }
    }
    geocoder.forward(&query, &options).await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::GeocodingErrorKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGeocoder {
        seen: Mutex<Vec<(String, GeocodeOptions)>>,
    }

    #[async_trait]
    impl Forward for RecordingGeocoder {
        async fn forward(
            &self,
            query: &str,
            options: &GeocodeOptions,
        ) -> Result<Vec<PlaceResult>, GeocodingError> {
            self.seen
                .lock()
                .unwrap()
                .push((query.to_string(), options.clone()));
            Ok(Vec::new())
        }
    }

    fn home() -> Vec<String> {
        vec!["AU".to_string()]
    }

    #[test]
    fn country_heuristic() {
        assert!(mentions_country("Eiffel Tower FRANCE"));
        assert!(mentions_country("Christchurch New Zealand"));
        assert!(!mentions_country("bondi beach"));
        // Substring matching is knowingly loose.
        assert!(mentions_country("Spainhour Road"));
    }

    #[tokio::test]
    async fn local_queries_are_biased() {
        let geocoder = RecordingGeocoder::default();
        search_destination(&geocoder, "  Bondi Beach ", &home())
            .await
            .unwrap();

        let seen = geocoder.seen.lock().unwrap();
        let (query, options) = &seen[0];
        assert_eq!(query, "Bondi Beach");
        assert_eq!(options.countrycodes, vec!["au".to_string()]);
        assert_eq!(options.limit, 5);
        assert!(options.addressdetails);
    }

    #[tokio::test]
    async fn queries_naming_a_country_are_not_biased() {
        let geocoder = RecordingGeocoder::default();
        search_destination(&geocoder, "Lisbon, Portugal", &home())
            .await
            .unwrap();
        search_destination(&geocoder, "Tokyo Japan", &home())
            .await
            .unwrap();

        let seen = geocoder.seen.lock().unwrap();
        assert!(seen.iter().all(|(_, options)| options.countrycodes.is_empty()));
    }

    #[tokio::test]
    async fn short_queries_are_rejected() {
        let geocoder = RecordingGeocoder::default();
        let err = search_destination(&geocoder, " a ", &home())
            .await
            .unwrap_err();

        assert_eq!(err.kind, GeocodingErrorKind::InvalidInput);
        assert!(geocoder.seen.lock().unwrap().is_empty());
    }
}
