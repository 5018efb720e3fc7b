use log::warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{GEOCODE_TTL, ROUTE_TTL};
use crate::dedup::PENDING_CEILING;
use crate::error::TransportError;
use crate::retry::RetryOptions;
use crate::UA_STRING;

pub const DEFAULT_GEOCODING_ENDPOINT: &str = "https://nominatim.openstreetmap.org/";
pub const DEFAULT_ROUTING_ENDPOINT: &str = "https://router.project-osrm.org/";
/// Three attempts of this length plus backoff finish well inside the pending ceiling.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

/// Errors raised while reading configuration from the environment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable {name} has invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("A request may run for {longest:?}, which exceeds the pending ceiling of {ceiling:?}")]
    CeilingTooShort { longest: Duration, ceiling: Duration },
}

/// Settings shared by the geocoding and routing clients
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub geocoding_endpoint: String,
    pub routing_endpoint: String,
    pub user_agent: String,
    /// Bound on a single attempt, including reading the body
    pub request_timeout: Duration,
    pub geocode_ttl: Duration,
    /// `None` disables route caching
    pub route_ttl: Option<Duration>,
    pub pending_ceiling: Duration,
    pub retry: RetryOptions<TransportError>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            geocoding_endpoint: DEFAULT_GEOCODING_ENDPOINT.to_string(),
            routing_endpoint: DEFAULT_ROUTING_ENDPOINT.to_string(),
            user_agent: UA_STRING.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            geocode_ttl: GEOCODE_TTL,
            route_ttl: Some(ROUTE_TTL),
            pending_ceiling: PENDING_CEILING,
            retry: RetryOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with any `WAYFARER_*` environment variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();
        if let Some(endpoint) = lookup("WAYFARER_GEOCODING_ENDPOINT") {
            config = config.with_geocoding_endpoint(&endpoint);
        }
        if let Some(endpoint) = lookup("WAYFARER_ROUTING_ENDPOINT") {
            config = config.with_routing_endpoint(&endpoint);
        }
        if let Some(ua) = lookup("WAYFARER_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "WAYFARER_REQUEST_TIMEOUT_MS")? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "WAYFARER_GEOCODE_TTL_SECS")? {
            config.geocode_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "WAYFARER_ROUTE_TTL_SECS")? {
            config.route_ttl = match secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "WAYFARER_MAX_ATTEMPTS")? {
            config.retry = config.retry.with_max_attempts(attempts);
        }
        config.validate()?;
        Ok(config)
    }

    /// Upper bound on how long one logical request stays in flight: every attempt
    /// running into the timeout, plus the longest possible backoff between them.
    pub fn max_request_duration(&self) -> Duration {
        self.request_timeout * self.retry.max_attempts.max(1) + self.retry.max_total_backoff()
    }

    /// Reject settings under which a live request could be evicted as stuck.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let longest = self.max_request_duration();
        if longest >= self.pending_ceiling {
            return Err(ConfigError::CeilingTooShort {
                longest,
                ceiling: self.pending_ceiling,
            });
        }
        Ok(())
    }

    /// The ceiling the deduplicators actually use.
    ///
    /// Settings built with the `with_*` setters are not validated, so the configured
    /// ceiling is raised past [`max_request_duration`](#method.max_request_duration)
    /// when it is too short.
    pub fn effective_pending_ceiling(&self) -> Duration {
        let longest = self.max_request_duration();
        if longest < self.pending_ceiling {
            return self.pending_ceiling;
        }
        let ceiling = longest + Duration::from_secs(1);
        warn!(
            "pending ceiling {:?} is shorter than the longest request {:?}, using {:?}",
            self.pending_ceiling, longest, ceiling
        );
        ceiling
    }

    /// Endpoint should include a trailing slash; one is added if missing.
    pub fn with_geocoding_endpoint(mut self, endpoint: &str) -> Self {
        self.geocoding_endpoint = with_trailing_slash(endpoint);
        self
    }

    pub fn with_routing_endpoint(mut self, endpoint: &str) -> Self {
        self.routing_endpoint = with_trailing_slash(endpoint);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_geocode_ttl(mut self, ttl: Duration) -> Self {
        self.geocode_ttl = ttl;
        self
    }

    pub fn with_route_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.route_ttl = ttl;
        self
    }

    pub fn with_pending_ceiling(mut self, ceiling: Duration) -> Self {
        self.pending_ceiling = ceiling;
        self
    }

    pub fn with_retry(mut self, retry: RetryOptions<TransportError>) -> Self {
        self.retry = retry;
        self
    }
}

fn with_trailing_slash(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

fn parse_var<T, L>(lookup: &L, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
