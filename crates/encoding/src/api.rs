//! HTTP client for the encoding service REST API.
//!
//! Wraps the resource-creation, start, status and list endpoints using
//! [`reqwest`]. Every request carries the API key header (and the tenant
//! header for multi-tenant accounts).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use batchenc_core::types::ResourceId;

use crate::error::ApiError;
use crate::models::{
    CodecConfig, CreatedResource, DefaultManifest, ErrorEnvelope, InputConfig, MuxingRequest,
    OutputConfig, PaginationResponse, ResponseEnvelope, StartEncodingRequest, Status,
    StreamRequest, Task,
};
use crate::service::EncodingService;

/// Default timeout for a single API request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "x-api-key";
const TENANT_ORG_HEADER: &str = "x-tenant-org-id";
const CLIENT_HEADER: &str = "x-api-client";
const CLIENT_NAME: &str = "batchenc";

/// Connection settings for [`EncodingApi`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL including the version prefix, e.g. `https://api.bitmovin.com/v1`.
    pub base_url: String,
    pub api_key: String,
    /// Organisation to act in, for multi-tenant accounts.
    pub tenant_org_id: Option<String>,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            tenant_org_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// HTTP client for the encoding service.
pub struct EncodingApi {
    client: reqwest::Client,
    base_url: String,
}

impl EncodingApi {
    /// Build a client with the authentication headers preset.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            header_value(API_KEY_HEADER, &config.api_key)?,
        );
        if let Some(tenant) = &config.tenant_org_id {
            headers.insert(
                HeaderName::from_static(TENANT_ORG_HEADER),
                header_value(TENANT_ORG_HEADER, tenant)?,
            );
        }
        headers.insert(
            HeaderName::from_static(CLIENT_HEADER),
            HeaderValue::from_static(CLIENT_NAME),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a creation body and return the id of the created resource.
    async fn create(&self, path: &str, body: &Value) -> Result<ResourceId, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let created: CreatedResource = Self::parse_result(response).await?;
        tracing::debug!(path, id = %created.id, "Created resource");
        Ok(created.id)
    }

    /// Ensure the response has a success status code. On failure the body
    /// is decoded as the service's error envelope when possible, so the
    /// service error code is preserved.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                let message = envelope
                    .data
                    .developer_message
                    .or(envelope.data.message)
                    .unwrap_or_else(|| body.clone());
                (envelope.data.code, message)
            }
            Err(_) => (None, body),
        };

        Err(ApiError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    /// Parse a successful response and unwrap `data.result`.
    async fn parse_result<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let envelope = response.json::<ResponseEnvelope<T>>().await?;
        Ok(envelope.data.result)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|e| ApiError::Configuration(format!("invalid {name} header: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl EncodingService for EncodingApi {
    async fn create_input(&self, input: &InputConfig) -> Result<ResourceId, ApiError> {
        self.create(input.endpoint(), &input.body()).await
    }

    async fn create_output(&self, output: &OutputConfig) -> Result<ResourceId, ApiError> {
        self.create(output.endpoint(), &output.body()).await
    }

    async fn create_codec_config(&self, config: &CodecConfig) -> Result<ResourceId, ApiError> {
        self.create(config.endpoint(), &config.body()).await
    }

    async fn create_encoding(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ResourceId, ApiError> {
        let mut body = json!({ "name": name });
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        self.create("encoding/encodings", &body).await
    }

    async fn create_stream(
        &self,
        encoding_id: &str,
        stream: &StreamRequest,
    ) -> Result<ResourceId, ApiError> {
        self.create(
            &format!("encoding/encodings/{encoding_id}/streams"),
            &stream.body(),
        )
        .await
    }

    async fn create_muxing(
        &self,
        encoding_id: &str,
        muxing: &MuxingRequest,
    ) -> Result<ResourceId, ApiError> {
        self.create(&muxing.endpoint(encoding_id), &muxing.body())
            .await
    }

    async fn create_default_manifest(
        &self,
        manifest: &DefaultManifest,
    ) -> Result<ResourceId, ApiError> {
        self.create(manifest.endpoint(), &manifest.body()).await
    }

    async fn start_encoding(
        &self,
        encoding_id: &str,
        request: &StartEncodingRequest,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("encoding/encodings/{encoding_id}/start")))
            .json(request)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        tracing::debug!(encoding_id, "Start call accepted");
        Ok(())
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("encoding/encodings/{encoding_id}/status")))
            .send()
            .await?;

        Self::parse_result(response).await
    }

    async fn count_encodings(&self, status: Status) -> Result<u64, ApiError> {
        let response = self
            .client
            .get(self.url("encoding/encodings"))
            .query(&[("status", status.as_str()), ("limit", "1")])
            .send()
            .await?;

        let page: PaginationResponse = Self::parse_result(response).await?;
        Ok(page.total_count.unwrap_or(page.items.len() as u64))
    }
}
