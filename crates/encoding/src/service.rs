//! Abstraction over the remote encoding service.
//!
//! Everything above the HTTP layer is generic over [`EncodingService`] so
//! it can run against a fake in tests.

use std::sync::Arc;

use async_trait::async_trait;

use batchenc_core::types::ResourceId;

use crate::error::ApiError;
use crate::models::{
    CodecConfig, DefaultManifest, InputConfig, MuxingRequest, OutputConfig, StartEncodingRequest,
    Status, StreamRequest, Task,
};

#[async_trait]
pub trait EncodingService: Send + Sync {
    async fn create_input(&self, input: &InputConfig) -> Result<ResourceId, ApiError>;

    async fn create_output(&self, output: &OutputConfig) -> Result<ResourceId, ApiError>;

    async fn create_codec_config(&self, config: &CodecConfig) -> Result<ResourceId, ApiError>;

    async fn create_encoding(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ResourceId, ApiError>;

    async fn create_stream(
        &self,
        encoding_id: &str,
        stream: &StreamRequest,
    ) -> Result<ResourceId, ApiError>;

    async fn create_muxing(
        &self,
        encoding_id: &str,
        muxing: &MuxingRequest,
    ) -> Result<ResourceId, ApiError>;

    async fn create_default_manifest(
        &self,
        manifest: &DefaultManifest,
    ) -> Result<ResourceId, ApiError>;

    async fn start_encoding(
        &self,
        encoding_id: &str,
        request: &StartEncodingRequest,
    ) -> Result<(), ApiError>;

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError>;

    /// Number of encodings currently in `status`.
    async fn count_encodings(&self, status: Status) -> Result<u64, ApiError>;
}

#[async_trait]
impl<S: EncodingService + ?Sized> EncodingService for Arc<S> {
    async fn create_input(&self, input: &InputConfig) -> Result<ResourceId, ApiError> {
        (**self).create_input(input).await
    }

    async fn create_output(&self, output: &OutputConfig) -> Result<ResourceId, ApiError> {
        (**self).create_output(output).await
    }

    async fn create_codec_config(&self, config: &CodecConfig) -> Result<ResourceId, ApiError> {
        (**self).create_codec_config(config).await
    }

    async fn create_encoding(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<ResourceId, ApiError> {
        (**self).create_encoding(name, description).await
    }

    async fn create_stream(
        &self,
        encoding_id: &str,
        stream: &StreamRequest,
    ) -> Result<ResourceId, ApiError> {
        (**self).create_stream(encoding_id, stream).await
    }

    async fn create_muxing(
        &self,
        encoding_id: &str,
        muxing: &MuxingRequest,
    ) -> Result<ResourceId, ApiError> {
        (**self).create_muxing(encoding_id, muxing).await
    }

    async fn create_default_manifest(
        &self,
        manifest: &DefaultManifest,
    ) -> Result<ResourceId, ApiError> {
        (**self).create_default_manifest(manifest).await
    }

    async fn start_encoding(
        &self,
        encoding_id: &str,
        request: &StartEncodingRequest,
    ) -> Result<(), ApiError> {
        (**self).start_encoding(encoding_id, request).await
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError> {
        (**self).encoding_status(encoding_id).await
    }

    async fn count_encodings(&self, status: Status) -> Result<u64, ApiError> {
        (**self).count_encodings(status).await
    }
}
