//! Supabase Storage backend.
//!
//! Objects are addressed as `{url}/storage/v1/object/{bucket}/{path}`. All
//! calls authenticate with the service role key.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

use super::{ObjectStore, StorageError, StorageResult};
use crate::config::SupabaseConfig;
use crate::error::{MergeError, Result};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for a single Supabase Storage bucket.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    base_url: String,
    bucket: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// Build a client for the bucket described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfig`] if the service key cannot be used
    /// as an HTTP header or the HTTP client cannot be constructed.
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| MergeError::invalid_config("service role key is not a valid header"))?;
        let apikey = HeaderValue::from_str(&config.service_key)
            .map_err(|_| MergeError::invalid_config("service role key is not a valid header"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("apikey", apikey);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MergeError::invalid_config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            client,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    /// Pull a readable message out of a Supabase error body.
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();

        serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                if text.is_empty() {
                    format!("storage responded with {status}")
                } else {
                    text
                }
            })
    }
}

#[async_trait]
impl ObjectStore for SupabaseStore {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        debug!("GET {}/{}", self.bucket, path);

        let response = self
            .client
            .get(self.object_url(path))
            .send()
            .await
            .map_err(|e| StorageError::read(path, format!("download request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StorageError::read(path, Self::error_message(response).await));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::read(path, format!("read download body failed: {e}")))?;

        Ok(bytes.to_vec())
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        debug!("POST {}/{} ({} bytes)", self.bucket, path, bytes.len());

        let response = self
            .client
            .post(self.object_url(path))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if overwrite { "true" } else { "false" })
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::write(path, format!("upload request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StorageError::write(path, Self::error_message(response).await));
        }

        Ok(())
    }
}
