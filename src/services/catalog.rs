//! External book catalog client (Google Books API v1)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::volume::{VolumeDetail, VolumeList, VolumeSummary},
};

/// Remote book-metadata provider
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Free-text search; an empty provider answer is an empty list
    async fn search(&self, query: &str) -> AppResult<Vec<VolumeSummary>>;

    /// One record by its opaque catalog id
    async fn get_volume(&self, id: &str) -> AppResult<VolumeDetail>;
}

#[derive(Debug, Clone)]
pub struct GoogleBooksClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    max_results: u32,
}

impl GoogleBooksClient {
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid catalog base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "Invalid catalog base URL: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("booktoshare/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            max_results: config.max_results,
        })
    }

    /// `{base_url}/volumes[/{id}]`, with the id percent-encoded as one segment
    fn volumes_url(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("volumes");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn key_param(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::ExternalService("catalog request timed out".to_string())
            } else {
                AppError::ExternalService(format!("catalog request failed: {}", e))
            }
        })
    }
}

#[async_trait]
impl CatalogApi for GoogleBooksClient {
    async fn search(&self, query: &str) -> AppResult<Vec<VolumeSummary>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("maxResults", self.max_results.to_string()),
        ];
        params.extend(self.key_param());

        let response = self
            .send(self.client.get(self.volumes_url(None)).query(&params))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "catalog search returned HTTP {}",
                status
            )));
        }

        let list: VolumeList = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("invalid catalog response: {}", e)))?;

        tracing::debug!(query, total = list.total_items, returned = list.items.len(), "Catalog search");
        Ok(list.items)
    }

    async fn get_volume(&self, id: &str) -> AppResult<VolumeDetail> {
        let response = self
            .send(self.client.get(self.volumes_url(Some(id))).query(&self.key_param()))
            .await?;

        match response.status() {
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| AppError::ExternalService(format!("invalid catalog response: {}", e))),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("Volume {} not found", id))),
            status => Err(AppError::ExternalService(format!(
                "catalog lookup returned HTTP {}",
                status
            ))),
        }
    }
}
