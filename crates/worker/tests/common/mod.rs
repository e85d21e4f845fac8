//! Recording encoding service for the worker tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use batchenc_encoding::error::ApiError;
use batchenc_encoding::models::{
    CodecConfig, DefaultManifest, InputConfig, MuxingKind, MuxingRequest, OutputConfig,
    StartEncodingRequest, Status, StreamRequest, Task,
};
use batchenc_encoding::service::EncodingService;

#[derive(Default)]
pub struct RecordingService {
    next_id: AtomicUsize,
    pub encodings: Mutex<Vec<(String, Option<String>)>>,
    pub codecs: Mutex<Vec<String>>,
    pub streams: Mutex<Vec<(String, StreamRequest)>>,
    pub muxings: Mutex<Vec<(String, MuxingKind, String)>>,
    pub manifests: Mutex<Vec<DefaultManifest>>,
}

impl RecordingService {
    fn next(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }
}

#[async_trait]
impl EncodingService for RecordingService {
    async fn create_input(&self, _input: &InputConfig) -> Result<String, ApiError> {
        Ok(self.next("input"))
    }

    async fn create_output(&self, _output: &OutputConfig) -> Result<String, ApiError> {
        Ok(self.next("output"))
    }

    async fn create_codec_config(&self, config: &CodecConfig) -> Result<String, ApiError> {
        self.codecs.lock().unwrap().push(config.name().to_string());
        Ok(self.next("codec"))
    }

    async fn create_encoding(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<String, ApiError> {
        self.encodings
            .lock()
            .unwrap()
            .push((name.to_string(), description.map(str::to_string)));
        Ok(self.next("encoding"))
    }

    async fn create_stream(
        &self,
        encoding_id: &str,
        stream: &StreamRequest,
    ) -> Result<String, ApiError> {
        self.streams
            .lock()
            .unwrap()
            .push((encoding_id.to_string(), stream.clone()));
        Ok(self.next("stream"))
    }

    async fn create_muxing(
        &self,
        encoding_id: &str,
        muxing: &MuxingRequest,
    ) -> Result<String, ApiError> {
        self.muxings.lock().unwrap().push((
            encoding_id.to_string(),
            muxing.kind,
            muxing.outputs[0].output_path.clone(),
        ));
        Ok(self.next("muxing"))
    }

    async fn create_default_manifest(
        &self,
        manifest: &DefaultManifest,
    ) -> Result<String, ApiError> {
        self.manifests.lock().unwrap().push(manifest.clone());
        Ok(self.next("manifest"))
    }

    async fn start_encoding(
        &self,
        _encoding_id: &str,
        _request: &StartEncodingRequest,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn encoding_status(&self, _encoding_id: &str) -> Result<Task, ApiError> {
        Err(ApiError::Configuration("not scripted".into()))
    }

    async fn count_encodings(&self, _status: Status) -> Result<u64, ApiError> {
        Ok(0)
    }
}
