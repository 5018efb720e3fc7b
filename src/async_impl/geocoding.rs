use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use crate::async_impl::{Forward, Request, Reverse};
use crate::cache::TtlCache;
use crate::config::ClientConfig;
use crate::coordinate::{format_rounded, Coordinate};
use crate::dedup::RequestDeduplicator;
use crate::error::{GeocodingError, TransportError};
use crate::geocoding::{
    normalize_countrycodes, normalize_query, parse_reverse_body, parse_search_body,
    GeocodeOptions, PlaceResult, SearchParams,
};
use crate::retry::RetryOptions;
use crate::shared::nominatim::reverse_query;
use crate::signature::RequestSignature;
use crate::transport::{HttpTransport, Transport};

/// Reverse lookups within ~11m share a cache entry and an in-flight request.
const REVERSE_KEY_DECIMALS: usize = 4;

type SearchOutcome = Result<Vec<PlaceResult>, GeocodingError>;
type ReverseOutcome = Result<PlaceResult, GeocodingError>;

/// A Nominatim geocoding client with caching, request de-duplication and retries.
///
/// Construct one per application and share it; each instance owns its own cache
/// and pending-request map.
pub struct GeocodingClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    request_timeout: Duration,
    retry: RetryOptions<TransportError>,
    search_cache: TtlCache<Vec<PlaceResult>>,
    reverse_cache: TtlCache<PlaceResult>,
    search_requests: RequestDeduplicator<SearchOutcome>,
    reverse_requests: RequestDeduplicator<ReverseOutcome>,
}

impl GeocodingClient {
    /// Create a client for the public Nominatim endpoint with default settings
    pub fn new() -> Result<Self, GeocodingError> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a client over HTTP using `config`
    pub fn with_config(config: &ClientConfig) -> Result<Self, GeocodingError> {
        let transport = HttpTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any [`Transport`](../transport/trait.Transport.html)
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        GeocodingClient {
            transport,
            endpoint: config.geocoding_endpoint.clone(),
            request_timeout: config.request_timeout,
            retry: config.retry.clone(),
            search_cache: TtlCache::new(config.geocode_ttl),
            reverse_cache: TtlCache::new(config.geocode_ttl),
            search_requests: RequestDeduplicator::new(config.effective_pending_ceiling()),
            reverse_requests: RequestDeduplicator::new(config.effective_pending_ceiling()),
        }
    }

    /// Search for places matching `query`.
    ///
    /// The query must have at least 2 characters after trimming. An empty result
    /// list means nothing matched; it is not an error.
    pub async fn geocode(
        &self,
        query: &str,
        options: &GeocodeOptions,
    ) -> Result<Vec<PlaceResult>, GeocodingError> {
        let query = normalize_query(query)?;
        if options.limit == 0 {
            return Err(GeocodingError::invalid_input(
                "Result limit must be at least 1",
            ));
        }

        // the field is public, so codes set directly may not be normalised yet
        let countrycodes = normalize_countrycodes(&options.countrycodes);
        let url = format!("{}search", self.endpoint);
        let signature = RequestSignature::builder("GET", &url)
            .param("q", query.to_lowercase())
            .param("limit", options.limit.to_string())
            .param(
                "addressdetails",
                if options.addressdetails { "1" } else { "0" },
            )
            .param("countrycodes", countrycodes.join(","))
            .build();

        if let Some(places) = self.search_cache.get(signature.as_str()) {
            return Ok(places);
        }

        let params = SearchParams {
            query: &query,
            limit: options.limit,
            addressdetails: options.addressdetails,
            countrycodes: &countrycodes,
        }
        .as_query();
        let request = Request {
            transport: Arc::clone(&self.transport),
            url,
            params,
            timeout: self.request_timeout,
            retry: self.retry.clone(),
            cache_key: signature.to_string(),
        };
        let cache = self.search_cache.clone();
        self.search_requests
            .deduplicate(signature.as_str(), move || fetch_search(request, cache))
            .await
    }

    /// Resolve a coordinate to the place at that position.
    ///
    /// Points with nothing nearby (open ocean) yield a `NotFound` error.
    pub async fn reverse_geocode(&self, coordinate: &Coordinate) -> ReverseOutcome {
        let url = format!("{}reverse", self.endpoint);
        let signature = RequestSignature::builder("GET", &url)
            .param(
                "lat",
                format_rounded(coordinate.latitude(), REVERSE_KEY_DECIMALS),
            )
            .param(
                "lon",
                format_rounded(coordinate.longitude(), REVERSE_KEY_DECIMALS),
            )
            .build();

        if let Some(place) = self.reverse_cache.get(signature.as_str()) {
            return Ok(place);
        }

        let request = Request {
            transport: Arc::clone(&self.transport),
            url,
            params: reverse_query(coordinate.latitude(), coordinate.longitude()),
            timeout: self.request_timeout,
            retry: self.retry.clone(),
            cache_key: signature.to_string(),
        };
        let cache = self.reverse_cache.clone();
        self.reverse_requests
            .deduplicate(signature.as_str(), move || fetch_reverse(request, cache))
            .await
    }

    /// Like [`reverse_geocode`](#method.reverse_geocode) for raw degrees, rejecting invalid
    /// values before any lookup.
    pub async fn reverse_geocode_degrees(&self, latitude: f64, longitude: f64) -> ReverseOutcome {
        let coordinate = Coordinate::new(latitude, longitude)?;
        self.reverse_geocode(&coordinate).await
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.search_cache.clear();
        self.reverse_cache.clear();
    }
}

async fn fetch_search(request: Request, cache: TtlCache<Vec<PlaceResult>>) -> SearchOutcome {
    let body = request.send().await?;
    let places = parse_search_body(&body)?;
    debug!("{} matched {} places", request.cache_key, places.len());
    cache.set(request.cache_key, places.clone());
    Ok(places)
}

async fn fetch_reverse(request: Request, cache: TtlCache<PlaceResult>) -> ReverseOutcome {
    let body = request.send().await?;
    let place = parse_reverse_body(&body)?;
    cache.set(request.cache_key, place.clone());
    Ok(place)
}

#[async_trait]
impl Forward for GeocodingClient {
    async fn forward(
        &self,
        query: &str,
        options: &GeocodeOptions,
    ) -> Result<Vec<PlaceResult>, GeocodingError> {
        self.geocode(query, options).await
    }
}

#[async_trait]
impl Reverse for GeocodingClient {
    async fn reverse(&self, coordinate: &Coordinate) -> Result<PlaceResult, GeocodingError> {
        self.reverse_geocode(coordinate).await
    }
}

#[cfg(test)]
mod async_test {
    use super::*;
    use crate::error::GeocodingErrorKind;
    use crate::geocoding::fixtures::{search_body, CALATRAVA, OPERA_HOUSE};
    use crate::transport::scripted::ScriptedTransport;
    use futures::future::join_all;

    fn client(transport: &ScriptedTransport) -> GeocodingClient {
        let config = ClientConfig::default().with_geocoding_endpoint("https://geo.test");
        GeocodingClient::with_transport(&config, Arc::new(transport.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn forward_returns_primary_names() {
        let transport = ScriptedTransport::ok(&search_body(&[OPERA_HOUSE]));
        let osm = client(&transport);

        let res = osm
            .geocode("Sydney Opera House", &GeocodeOptions::default())
            .await
            .unwrap();

        assert_eq!(res.len(), 1);
        assert_eq!(res[0].primary_name, "Sydney Opera House");
        assert_eq!(
            res[0].display_name,
            "Sydney Opera House, Bennelong Point, Sydney, NSW 2000, Australia"
        );
        let (url, _) = transport.last_request().unwrap();
        assert_eq!(url, "https://geo.test/search");
        assert_eq!(transport.last_param("q").as_deref(), Some("Sydney Opera House"));
        assert_eq!(transport.last_param("limit").as_deref(), Some("5"));
        assert_eq!(transport.last_param("addressdetails").as_deref(), Some("1"));
        assert_eq!(transport.last_param("countrycodes"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_serves_repeats_until_ttl() {
        let transport = ScriptedTransport::ok(&search_body(&[OPERA_HOUSE]));
        let osm = client(&transport);
        let options = GeocodeOptions::default();

        osm.geocode("Sydney Opera House", &options).await.unwrap();
        osm.geocode("  sydney opera house ", &options).await.unwrap();
        assert_eq!(transport.calls(), 1);

        tokio::time::advance(Duration::from_secs(299)).await;
        osm.geocode("Sydney Opera House", &options).await.unwrap();
        assert_eq!(transport.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        osm.geocode("Sydney Opera House", &options).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn options_are_part_of_the_signature() {
        let transport = ScriptedTransport::ok("[]");
        let osm = client(&transport);

        osm.geocode("Springfield", &GeocodeOptions::default())
            .await
            .unwrap();
        osm.geocode(
            "Springfield",
            &GeocodeOptions::default().with_countrycodes(vec!["au"]),
        )
        .await
        .unwrap();

        assert_eq!(transport.calls(), 2);
        assert_eq!(transport.last_param("countrycodes").as_deref(), Some("au"));
    }

    #[tokio::test(start_paused = true)]
    async fn countrycodes_set_directly_are_normalised() {
        let transport = ScriptedTransport::ok("[]");
        let osm = client(&transport);
        let literal = GeocodeOptions {
            countrycodes: vec!["NZ".to_string(), " au".to_string(), "nz".to_string()],
            ..GeocodeOptions::default()
        };

        osm.geocode("Springfield", &literal).await.unwrap();
        assert_eq!(transport.last_param("countrycodes").as_deref(), Some("au,nz"));

        osm.geocode(
            "Springfield",
            &GeocodeOptions::default().with_countrycodes(vec!["au", "nz"]),
        )
        .await
        .unwrap();
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_results_are_not_errors() {
        let transport = ScriptedTransport::ok("[]");
        let osm = client(&transport);
        let res = osm
            .geocode("qwzxv", &GeocodeOptions::default())
            .await
            .unwrap();
        assert!(res.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn short_queries_fail_before_the_network() {
        let transport = ScriptedTransport::ok("[]");
        let osm = client(&transport);
        let err = osm
            .geocode(" s ", &GeocodeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, GeocodingErrorKind::InvalidInput);

        let err = osm.reverse_geocode_degrees(91.0, 0.0).await.unwrap_err();
        assert_eq!(err.kind, GeocodingErrorKind::InvalidInput);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_searches_share_one_request() {
        let transport = ScriptedTransport::ok(&search_body(&[OPERA_HOUSE]))
            .with_latency(Duration::from_millis(200));
        let osm = client(&transport);
        let options = GeocodeOptions::default();

        let results =
            join_all((0..4).map(|_| osm.geocode("Sydney Opera House", &options))).await;

        assert_eq!(transport.calls(), 1);
        assert!(results.iter().all(|r| r == &results[0]));
        assert!(results[0].is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn nearby_reverse_lookups_share_one_request() {
        let transport = ScriptedTransport::ok(CALATRAVA);
        let osm = client(&transport);

        let a = Coordinate::new(41.401401, 2.128701).unwrap();
        let b = Coordinate::new(41.401398, 2.128698).unwrap();
        let first = osm.reverse_geocode(&a).await.unwrap();
        let second = osm.reverse_geocode(&b).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.primary_name, "68 Carrer de Calatrava");
        assert_eq!(transport.last_param("lat").as_deref(), Some("41.401401"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Status {
                status: 503,
                body: String::new(),
            }),
            Err(TransportError::Network("connection reset".into())),
            Ok(search_body(&[OPERA_HOUSE])),
        ]);
        let osm = client(&transport);

        let res = osm
            .geocode("Sydney Opera House", &GeocodeOptions::default())
            .await
            .unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(res[0].primary_name, "Sydney Opera House");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_a_typed_error_and_are_not_cached() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Network(
            "dns failure".into(),
        ))]);
        let osm = client(&transport);
        let options = GeocodeOptions::default();

        let err = osm.geocode("Sydney", &options).await.unwrap_err();
        assert_eq!(err.kind, GeocodingErrorKind::Network);
        assert_eq!(transport.calls(), 3);

        osm.geocode("Sydney", &options).await.unwrap_err();
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Status {
            status: 404,
            body: String::new(),
        })]);
        let osm = client(&transport);

        let err = osm
            .geocode("Sydney", &GeocodeOptions::default())
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert_eq!(err.kind, GeocodingErrorKind::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out_and_retry() {
        let transport = ScriptedTransport::ok("[]").with_latency(Duration::from_secs(60));
        let config = ClientConfig::default()
            .with_request_timeout(Duration::from_secs(2))
            .with_retry(RetryOptions::<TransportError>::default().with_max_attempts(2));
        let osm = GeocodingClient::with_transport(&config, Arc::new(transport.clone()));

        let err = osm
            .geocode("Sydney", &GeocodeOptions::default())
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 2);
        assert_eq!(err.kind, GeocodingErrorKind::Network);
        assert_eq!(err.failure, crate::error::FailureKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn default_requests_settle_before_the_pending_ceiling() {
        let transport = ScriptedTransport::ok("[]").with_latency(Duration::from_secs(60));
        let osm = Arc::new(client(&transport));

        let first = tokio::spawn({
            let osm = Arc::clone(&osm);
            async move { osm.geocode("Sydney", &GeocodeOptions::default()).await }
        });
        tokio::time::sleep(Duration::from_secs(20)).await;
        let joined = osm.geocode("Sydney", &GeocodeOptions::default()).await;
        let first = first.await.unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(joined, first);
        assert_eq!(
            first.unwrap_err().failure,
            crate::error::FailureKind::Timeout
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_retries_are_not_evicted_as_stuck() {
        let transport = ScriptedTransport::ok("[]").with_latency(Duration::from_secs(60));
        let config = ClientConfig::default()
            .with_geocoding_endpoint("https://geo.test")
            .with_request_timeout(Duration::from_secs(20));
        let osm = Arc::new(GeocodingClient::with_transport(
            &config,
            Arc::new(transport.clone()),
        ));

        let first = tokio::spawn({
            let osm = Arc::clone(&osm);
            async move { osm.geocode("Sydney", &GeocodeOptions::default()).await }
        });
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(transport.calls(), 2);

        let joined = osm.geocode("Sydney", &GeocodeOptions::default()).await;
        let first = first.await.unwrap();

        assert_eq!(transport.calls(), 3);
        assert_eq!(joined, first);
    }

    #[tokio::test(start_paused = true)]
    async fn reverse_in_the_ocean_is_not_found() {
        let transport = ScriptedTransport::ok(r#"{"error": "Unable to geocode"}"#);
        let osm = client(&transport);
        let err = osm
            .reverse(&Coordinate::new(-30.0, -140.0).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, GeocodingErrorKind::NotFound);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cache_forces_a_refetch() {
        let transport = ScriptedTransport::ok(CALATRAVA);
        let osm = client(&transport);
        let here = Coordinate::new(41.40139, 2.12870).unwrap();

        osm.reverse_geocode(&here).await.unwrap();
        osm.clear_cache();
        osm.reverse_geocode(&here).await.unwrap();

        assert_eq!(transport.calls(), 2);
    }
}
