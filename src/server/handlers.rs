//! Route handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use super::error::ApiError;
use crate::error::MergeError;
use crate::pipeline::{MergeRequest, Pipeline};
use crate::publish::MergeResult;

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-api-secret";

/// `GET /` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the service is up.
    pub status: String,
    /// Service name.
    pub service: String,
}

/// `POST /merge` body. `orderNumber` is accepted and ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeBody {
    /// Batch object paths, in output order.
    #[serde(default)]
    pub storage_paths: Option<Value>,
    /// Merge group, as a string or number.
    #[serde(default)]
    pub order_id: Option<Value>,
    /// Output format label.
    #[serde(default)]
    pub format: Option<Value>,
}

impl MergeBody {
    /// Parse a raw request body. An empty body is treated as `{}`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
    }

    /// Convert into a pipeline request.
    ///
    /// Only the shape of `storagePaths` is checked here; everything else is
    /// left to [`MergeRequest::validate`].
    pub fn into_request(self) -> Result<MergeRequest, ApiError> {
        let items = match self.storage_paths {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(MergeError::EmptySourceList.into()),
        };

        let source_paths = items
            .into_iter()
            .map(|item| match item {
                Value::String(path) => Ok(path),
                _ => Err(ApiError::bad_request("storagePaths must contain only strings")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MergeRequest::new(
            source_paths,
            scalar(self.order_id),
            scalar(self.format),
        ))
    }
}

/// Render a string or number field; anything else becomes empty.
fn scalar(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// `POST /merge` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    /// Object path the merged PDF was uploaded to.
    pub storage_path: String,
    /// Size of the uploaded PDF in bytes.
    pub size: u64,
    /// Number of pages in the merged PDF.
    pub pages: usize,
}

impl From<MergeResult> for MergeResponse {
    fn from(result: MergeResult) -> Self {
        Self {
            storage_path: result.output_path,
            size: result.size_bytes,
            pages: result.page_count,
        }
    }
}

/// `GET /` health check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: crate::NAME.to_string(),
    })
}

/// `POST /merge`: authorize, parse the body and run a pipeline.
pub async fn merge(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MergeResponse>, ApiError> {
    authorize(&headers, &state.config.api_secret)?;

    let request = MergeBody::parse(&body)?.into_request()?;
    drop(body);

    let mut pipeline = Pipeline::new(Arc::clone(&state.store), &state.config.publish);
    let result = pipeline.run(request).await?;

    Ok(Json(result.into()))
}

fn authorize(headers: &HeaderMap, secret: &str) -> Result<(), ApiError> {
    let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    match provided {
        Some(value) if !value.is_empty() && value == secret => Ok(()),
        _ => {
            warn!("Rejected merge request: missing or invalid {}", SECRET_HEADER);
            Err(ApiError::unauthorized())
        }
    }
}
