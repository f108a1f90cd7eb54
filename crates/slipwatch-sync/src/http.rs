//! HTTP session for the slip-opinion site.
//!
//! One [`SlipClient`] is built per process and shared by reference. It keeps a
//! cookie jar and presents a desktop browser user agent, since the listing site
//! is less friendly to obvious scripts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ETAG, HeaderMap, LAST_MODIFIED};
use slipwatch_core::{
    CatalogEntry, CatalogError, CatalogSource, Listing, Period, ProbeError, RetrieveError,
    RevisionDescriptor, RevisionSource, strip_fingerprint,
};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::parse_listing;

pub const DEFAULT_LISTING_URL: &str =
    "https://www.supremecourt.gov/opinions/slipopinions.aspx?Term=";
pub const DEFAULT_DOCUMENT_BASE: &str = "https://www.supremecourt.gov/opinions/";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid document base URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Listing URL up to and including `Term=`; the two-digit term is appended.
    pub listing_url: String,
    /// Base that relative opinion links are resolved against.
    pub document_base: String,
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            document_base: DEFAULT_DOCUMENT_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HTTP client implementing both [`CatalogSource`] and [`RevisionSource`].
pub struct SlipClient {
    client: reqwest::Client,
    listing_url: String,
    document_base: Url,
}

impl SlipClient {
    pub fn new(config: ClientConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self {
            client,
            listing_url: config.listing_url,
            document_base: Url::parse(&config.document_base)?,
        })
    }

    fn listing_url_for(&self, period: Period) -> String {
        format!("{}{}", self.listing_url, period)
    }

    /// Response headers for `location` without reading the body.
    ///
    /// Uses `HEAD`, falling back to `GET` when the server rejects `HEAD`.
    async fn metadata(&self, location: &str) -> Result<HeaderMap, ProbeError> {
        let resp = self
            .client
            .head(location)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        let resp = if resp.status() == StatusCode::METHOD_NOT_ALLOWED {
            debug!(location, "HEAD rejected, probing with GET");
            self.client
                .get(location)
                .send()
                .await
                .map_err(|e| ProbeError::Unreachable(e.to_string()))?
        } else {
            resp
        };

        let status = resp.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                status: status.as_u16(),
            });
        }
        // Dropping the response discards any unread body.
        Ok(resp.headers().clone())
    }
}

/// Build a descriptor from `Last-Modified` and `ETag`.
pub fn revision_from_headers(
    identity: &str,
    headers: &HeaderMap,
) -> Result<RevisionDescriptor, ProbeError> {
    let revision = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ProbeError::MissingHeader("Last-Modified"))?;
    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .ok_or(ProbeError::MissingHeader("ETag"))?;

    Ok(RevisionDescriptor {
        identity: identity.to_string(),
        revision: revision.to_string(),
        fingerprint: strip_fingerprint(etag),
    })
}

#[async_trait]
impl CatalogSource for SlipClient {
    async fn list_period(&self, period: Period) -> Result<Vec<Listing>, CatalogError> {
        let url = self.listing_url_for(period);
        let unavailable = |reason: String| CatalogError::PeriodUnavailable { period, reason };

        info!(url = %url, "listing term");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(unavailable(format!("server returned {}", status.as_u16())));
        }
        let html = resp.text().await.map_err(|e| unavailable(e.to_string()))?;

        let listings = parse_listing(&html, &self.document_base);
        info!(%period, count = listings.len(), "listed opinions");
        Ok(listings)
    }

    fn period_location(&self, period: Period) -> String {
        self.listing_url_for(period)
    }
}

#[async_trait]
impl RevisionSource for SlipClient {
    async fn probe(&self, entry: &CatalogEntry) -> Result<RevisionDescriptor, ProbeError> {
        let headers = self.metadata(&entry.location).await?;
        revision_from_headers(&entry.identity, &headers)
    }

    async fn retrieve(&self, location: &str) -> Result<Vec<u8>, RetrieveError> {
        let resp = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| RetrieveError::Unreachable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RetrieveError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp
            .bytes()
            .await
            .map_err(|e| RetrieveError::Unreachable(e.to_string()))?;
        debug!(location, bytes = body.len(), "retrieved document");
        Ok(body.to_vec())
    }
}
