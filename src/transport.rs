use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::TransportError;

/// A single outbound HTTP GET returning the response body.
///
/// Implementations must map non-2xx responses to
/// [`TransportError::Status`](enum.TransportError.html) with the body attached,
/// so providers that explain failures in JSON can still be understood.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, TransportError>;
}

/// The reqwest-backed transport used in production.
///
/// Attempt timeouts are applied by the clients, not here.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport that identifies itself with `user_agent` on every request,
    /// as required by the Nominatim and OSRM usage policies.
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| TransportError::Network(format!("invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, ua);
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, TransportError> {
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
