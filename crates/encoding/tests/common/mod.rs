//! Shared fakes for the encoding crate integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use batchenc_core::pause::Pause;
use batchenc_encoding::error::ApiError;
use batchenc_encoding::models::{
    CodecConfig, DefaultManifest, InputConfig, MuxingRequest, OutputConfig, StartEncodingRequest,
    Status, StreamRequest, Task,
};
use batchenc_encoding::service::EncodingService;

/// Build a task with the given status and optional error payload.
pub fn task(status: &str) -> Task {
    serde_json::from_value(json!({ "status": status, "progress": 50 })).unwrap()
}

/// In-memory encoding service that records every call.
#[derive(Default)]
pub struct FakeService {
    next_id: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub muxing_paths: Mutex<Vec<String>>,
    /// Status sequence per encoding id; the last entry repeats.
    statuses: Mutex<HashMap<String, VecDeque<Task>>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_statuses(&self, encoding_id: &str, tasks: Vec<Task>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(encoding_id.to_string(), tasks.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }
}

#[async_trait]
impl EncodingService for FakeService {
    async fn create_input(&self, _input: &InputConfig) -> Result<String, ApiError> {
        self.record("create_input".into());
        Ok(self.next("input"))
    }

    async fn create_output(&self, _output: &OutputConfig) -> Result<String, ApiError> {
        self.record("create_output".into());
        Ok(self.next("output"))
    }

    async fn create_codec_config(&self, config: &CodecConfig) -> Result<String, ApiError> {
        self.record(format!("create_codec_config:{}", config.name()));
        Ok(self.next("codec"))
    }

    async fn create_encoding(
        &self,
        name: &str,
        _description: Option<&str>,
    ) -> Result<String, ApiError> {
        self.record(format!("create_encoding:{name}"));
        Ok(self.next("encoding"))
    }

    async fn create_stream(
        &self,
        encoding_id: &str,
        _stream: &StreamRequest,
    ) -> Result<String, ApiError> {
        self.record(format!("create_stream:{encoding_id}"));
        Ok(self.next("stream"))
    }

    async fn create_muxing(
        &self,
        encoding_id: &str,
        muxing: &MuxingRequest,
    ) -> Result<String, ApiError> {
        self.record(format!("create_muxing:{encoding_id}"));
        self.muxing_paths
            .lock()
            .unwrap()
            .push(muxing.outputs[0].output_path.clone());
        Ok(self.next("muxing"))
    }

    async fn create_default_manifest(
        &self,
        _manifest: &DefaultManifest,
    ) -> Result<String, ApiError> {
        self.record("create_default_manifest".into());
        Ok(self.next("manifest"))
    }

    async fn start_encoding(
        &self,
        encoding_id: &str,
        _request: &StartEncodingRequest,
    ) -> Result<(), ApiError> {
        self.record(format!("start:{encoding_id}"));
        Ok(())
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError> {
        self.record(format!("status:{encoding_id}"));
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses.get_mut(encoding_id).ok_or_else(|| ApiError::Api {
            status: 404,
            code: None,
            message: format!("unknown encoding {encoding_id}"),
        })?;
        let task = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        Ok(task)
    }

    async fn count_encodings(&self, _status: Status) -> Result<u64, ApiError> {
        Ok(0)
    }
}

/// Pause that returns immediately and records the requested durations.
#[derive(Default)]
pub struct RecordingPause {
    pub requested: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.requested.lock().unwrap().push(duration);
    }
}
