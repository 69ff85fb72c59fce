//! Blob storage client for uploaded media

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::{
    config::BlobConfig,
    error::{AppError, AppResult},
};

const API_VERSION: &str = "7";

/// Hosted object storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` publicly under `pathname` and return the public URL
    async fn put(&self, pathname: &str, bytes: Bytes, content_type: &str) -> AppResult<String>;

    async fn delete(&self, url: &str) -> AppResult<()>;

    /// Whether `url` points at an object this store manages
    fn is_managed(&self, url: &str) -> bool;
}

#[derive(Deserialize)]
struct PutResponse {
    url: String,
}

/// HTTP client for the hosted blob API
pub struct HttpBlobStore {
    client: Client,
    api_url: String,
    token: Option<String>,
    managed_host: String,
}

impl HttpBlobStore {
    pub fn new(config: &BlobConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build blob client: {}", e)))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            managed_host: config.managed_host.to_lowercase(),
        })
    }

    fn token(&self) -> AppResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| AppError::Upstream("Blob storage token is not configured".to_string()))
    }
}

/// Host equals `suffix` or is a subdomain of it
fn host_matches(url: &str, suffix: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    match parsed.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            host == suffix || host.ends_with(&format!(".{}", suffix))
        }
        None => false,
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, pathname: &str, bytes: Bytes, content_type: &str) -> AppResult<String> {
        let response = self
            .client
            .put(format!("{}/{}", self.api_url, pathname))
            .bearer_auth(self.token()?)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .header(header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Blob upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Blob upload returned {}: {}", status, body)));
        }

        let stored: PutResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid blob upload response: {}", e)))?;
        Ok(stored.url)
    }

    async fn delete(&self, url: &str) -> AppResult<()> {
        let response = self
            .client
            .post(format!("{}/delete", self.api_url))
            .bearer_auth(self.token()?)
            .header("x-api-version", API_VERSION)
            .json(&json!({ "urls": [url] }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Blob delete failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("Blob delete returned {}", status)));
        }
        Ok(())
    }

    fn is_managed(&self, url: &str) -> bool {
        host_matches(url, &self.managed_host)
    }
}
