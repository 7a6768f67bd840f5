//! RAWG video game database API client.
//!
//! RAWG requires an API key for access and caps `page_size` at 40.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RawRecord, RemoteCatalog, RemoteCatalogError, RemotePage};
use crate::game::PageRequest;
use crate::metrics;

/// Largest page size RAWG accepts.
pub const RAWG_MAX_PAGE_SIZE: u32 = 40;

const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api";

/// RAWG API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawgConfig {
    /// RAWG API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.rawg.io/api).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// HTTP timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

/// RAWG API client.
pub struct RawgClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RawgClient {
    /// Create a new RAWG client.
    pub fn new(config: RawgConfig) -> Result<Self, RemoteCatalogError> {
        if config.api_key.trim().is_empty() {
            return Err(RemoteCatalogError::NotConfigured(
                "RAWG API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    fn list_request(&self, page: PageRequest) -> RequestBuilder {
        let page_size = page.page_size.min(RAWG_MAX_PAGE_SIZE);
        self.client.get(format!("{}/games", self.base_url)).query(&[
            ("key", self.api_key.clone()),
            ("page", page.page.to_string()),
            ("page_size", page_size.to_string()),
        ])
    }

    async fn fetch_list(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<RemotePage, RemoteCatalogError> {
        let start = Instant::now();
        let result = self.send_list(request).await;
        metrics::record_remote_call(operation, start.elapsed(), result.is_ok());
        result
    }

    async fn send_list(&self, request: RequestBuilder) -> Result<RemotePage, RemoteCatalogError> {
        let response = request.send().await?;

        // RAWG answers 404 for pages past the end of a listing.
        if response.status() == StatusCode::NOT_FOUND {
            debug!("RAWG listing page out of range, treating as exhausted");
            return Ok(RemotePage::default());
        }

        let response = check_status(response).await?;
        response.json().await.map_err(|e| {
            RemoteCatalogError::ParseError(format!("Failed to parse games response: {}", e))
        })
    }

    async fn send_detail(
        &self,
        url: &str,
        external_id: i64,
    ) -> Result<RawRecord, RemoteCatalogError> {
        let response = self
            .client
            .get(url)
            .query(&[("key", &self.api_key)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteCatalogError::NotFound(format!(
                "Game ID {}",
                external_id
            )));
        }

        let response = check_status(response).await?;
        response.json().await.map_err(|e| {
            RemoteCatalogError::ParseError(format!("Failed to parse game response: {}", e))
        })
    }
}

#[async_trait]
impl RemoteCatalog for RawgClient {
    async fn search(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<RemotePage, RemoteCatalogError> {
        debug!(
            "RAWG search: query='{}', page={}, page_size={}",
            query, page.page, page.page_size
        );

        let mut request = self.list_request(page);
        if !query.is_empty() {
            request = request.query(&[("search", query)]);
        }

        self.fetch_list("search", request).await
    }

    async fn filter(
        &self,
        params: &BTreeMap<String, String>,
        page: PageRequest,
    ) -> Result<RemotePage, RemoteCatalogError> {
        debug!(
            "RAWG filter: params={:?}, page={}, page_size={}",
            params, page.page, page.page_size
        );

        let request = self.list_request(page).query(params);
        self.fetch_list("filter", request).await
    }

    async fn get_detail(&self, external_id: i64) -> Result<RawRecord, RemoteCatalogError> {
        let url = format!("{}/games/{}", self.base_url, external_id);

        debug!("RAWG get game: id={}", external_id);

        let start = Instant::now();
        let result = self.send_detail(&url, external_id).await;
        metrics::record_remote_call("get_detail", start.elapsed(), result.is_ok());

        result
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteCatalogError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(RemoteCatalogError::NotConfigured(
            "Invalid RAWG API key".to_string(),
        ));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RemoteCatalogError::RateLimitExceeded);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteCatalogError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}
