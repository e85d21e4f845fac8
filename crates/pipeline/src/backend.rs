//! The remote side of the dispatcher.
//!
//! [`JobBackend`] is the narrow interface the dispatcher needs: count the
//! queued encodings, create and configure an encoding for a job, start it
//! and query its status. [`RemoteBackend`] implements it on top of any
//! [`EncodingService`] and an [`EncodingTemplate`].

use std::sync::Arc;

use async_trait::async_trait;

use batchenc_core::job::EncodingJob;
use batchenc_core::types::ResourceId;
use batchenc_encoding::error::ApiError;
use batchenc_encoding::ladder::EncodingTemplate;
use batchenc_encoding::models::{StartEncodingRequest, Status, Task};
use batchenc_encoding::service::EncodingService;

#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Number of encodings currently queued on the service.
    async fn count_queued(&self) -> Result<u64, ApiError>;

    /// Create the remote encoding for `job`.
    async fn create_encoding(&self, job: &EncodingJob) -> Result<ResourceId, ApiError>;

    /// Create the streams and muxings of an encoding created for `job`.
    async fn configure_encoding(
        &self,
        job: &EncodingJob,
        encoding_id: &str,
    ) -> Result<(), ApiError>;

    async fn start_encoding(&self, encoding_id: &str) -> Result<(), ApiError>;

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError>;
}

#[async_trait]
impl<B: JobBackend + ?Sized> JobBackend for Arc<B> {
    async fn count_queued(&self) -> Result<u64, ApiError> {
        (**self).count_queued().await
    }

    async fn create_encoding(&self, job: &EncodingJob) -> Result<ResourceId, ApiError> {
        (**self).create_encoding(job).await
    }

    async fn configure_encoding(
        &self,
        job: &EncodingJob,
        encoding_id: &str,
    ) -> Result<(), ApiError> {
        (**self).configure_encoding(job, encoding_id).await
    }

    async fn start_encoding(&self, encoding_id: &str) -> Result<(), ApiError> {
        (**self).start_encoding(encoding_id).await
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError> {
        (**self).encoding_status(encoding_id).await
    }
}

/// [`JobBackend`] backed by the encoding service.
///
/// Every job gets the renditions of `template`; its muxings are written
/// below the job's output path.
pub struct RemoteBackend<S> {
    service: S,
    template: EncodingTemplate,
}

impl<S: EncodingService> RemoteBackend<S> {
    pub fn new(service: S, template: EncodingTemplate) -> Self {
        Self { service, template }
    }
}

#[async_trait]
impl<S: EncodingService> JobBackend for RemoteBackend<S> {
    async fn count_queued(&self) -> Result<u64, ApiError> {
        self.service.count_encodings(Status::Queued).await
    }

    async fn create_encoding(&self, job: &EncodingJob) -> Result<ResourceId, ApiError> {
        self.service.create_encoding(&job.name, None).await
    }

    async fn configure_encoding(
        &self,
        job: &EncodingJob,
        encoding_id: &str,
    ) -> Result<(), ApiError> {
        self.template
            .configure_encoding(&self.service, encoding_id, &job.input_path, &job.output_path)
            .await
    }

    async fn start_encoding(&self, encoding_id: &str) -> Result<(), ApiError> {
        self.service
            .start_encoding(encoding_id, &StartEncodingRequest::default())
            .await
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError> {
        self.service.encoding_status(encoding_id).await
    }
}
