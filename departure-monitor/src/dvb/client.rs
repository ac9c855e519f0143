//! DVB departure monitor widget HTTP client.
//!
//! Queries the public "Abfahrtsmonitor" widget of the Dresdner
//! Verkehrsbetriebe. The widget answers in plaintext but labels it
//! `text/html`, so that is what we ask for.

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, IF_MODIFIED_SINCE};
use tracing::debug;

use super::error::FetchError;
use super::upstream::{RawResponse, Upstream};

/// Default widget endpoint.
const DEFAULT_BASE_URL: &str = "http://widgets.vvo-online.de/abfahrtsmonitor/Abfahrten.do";

/// Default client identifier.
const DEFAULT_USER_AGENT: &str = "Departure/1.1";

/// The widget serves plaintext as `text/html`.
const DEFAULT_ACCEPT: &str = "text/html";

/// Display name of the data provider.
const DEFAULT_SOURCE_NAME: &str = "Dresdner Verkehrsbetriebe";

/// Configuration for the DVB client.
#[derive(Debug, Clone)]
pub struct DvbConfig {
    /// Widget endpoint URL
    pub base_url: String,
    /// City the stop names are resolved in
    pub city: String,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Accept header sent with every request
    pub accept: String,
    /// Provider name reported when no data is available
    pub source_name: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DvbConfig {
    /// Create a config pointing at the production widget.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            city: "Dresden".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the client identifier.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the city stop names are looked up in.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for DvbConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// DVB widget client.
#[derive(Debug, Clone)]
pub struct DvbClient {
    http: reqwest::Client,
    base_url: String,
    city: String,
    source_name: String,
}

impl DvbClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DvbConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let accept = HeaderValue::from_str(&config.accept)
            .map_err(|_| FetchError::Network("invalid accept header".to_string()))?;
        headers.insert(ACCEPT, accept);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            city: config.city,
            source_name: config.source_name,
        })
    }
}

impl Upstream for DvbClient {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    async fn fetch(
        &self,
        stop: &str,
        modified_since: Option<DateTime<Utc>>,
    ) -> Result<RawResponse, FetchError> {
        let mut request = self
            .http
            .get(&self.base_url)
            .query(&[("ort", self.city.as_str()), ("hst", stop)]);

        if let Some(since) = modified_since {
            request = request.header(IF_MODIFIED_SINCE, http_date(since));
        }

        let response = request.send().await?;
        let status = response.status();
        let fetched_at = Utc::now();

        debug!(stop, status = status.as_u16(), "widget responded");

        if status == reqwest::StatusCode::NOT_MODIFIED {
            return Err(FetchError::NotModified);
        }

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;

        Ok(RawResponse { body, fetched_at })
    }
}

/// Format a timestamp as an RFC 7231 HTTP-date.
fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
