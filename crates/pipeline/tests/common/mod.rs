//! Scripted backend and pause for dispatcher tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use batchenc_core::job::EncodingJob;
use batchenc_core::pause::Pause;
use batchenc_core::types::ResourceId;
use batchenc_encoding::error::{ApiError, QUEUE_LIMIT_EXCEEDED};
use batchenc_encoding::models::Task;
use batchenc_pipeline::dispatcher::DispatcherConfig;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub fn running() -> Task {
    serde_json::from_value(json!({ "status": "RUNNING", "progress": 40 })).unwrap()
}

pub fn finished() -> Task {
    serde_json::from_value(json!({ "status": "FINISHED", "progress": 100 })).unwrap()
}

pub fn canceled() -> Task {
    serde_json::from_value(json!({ "status": "CANCELED" })).unwrap()
}

pub fn retryable_error(text: &str) -> Task {
    serde_json::from_value(json!({
        "status": "ERROR",
        "messages": [{ "type": "ERROR", "text": text }],
        "error": { "code": 1000, "retryHint": "RETRY" }
    }))
    .unwrap()
}

pub fn permanent_error(text: &str) -> Task {
    serde_json::from_value(json!({
        "status": "ERROR",
        "messages": [
            { "type": "INFO", "text": "analysis started" },
            { "type": "ERROR", "text": text }
        ],
        "error": { "code": 2001, "retryHint": "NO_RETRY" }
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Scripted reply to a start call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartReply {
    Accept,
    QueueFull,
    Fail,
}

fn api_error(code: Option<i64>, message: &str) -> ApiError {
    ApiError::Api {
        status: 400,
        code,
        message: message.to_string(),
    }
}

/// In-memory backend. Encoding ids are `enc-<job name>`.
///
/// The queued count is the number of encodings that were started and have
/// not yet reported a terminal status. Scripted replies are consumed in
/// order; the last one repeats. Unscripted starts are accepted and
/// unscripted encodings report `RUNNING` once, then `FINISHED`.
#[derive(Default)]
pub struct FakeBackend {
    pub created: Mutex<Vec<String>>,
    pub configured: Mutex<Vec<ResourceId>>,
    pub starts: Mutex<Vec<ResourceId>>,
    pub polls: Mutex<Vec<ResourceId>>,
    active: Mutex<HashSet<ResourceId>>,
    start_replies: Mutex<HashMap<ResourceId, VecDeque<StartReply>>>,
    statuses: Mutex<HashMap<ResourceId, VecDeque<Task>>>,
    failing_creates: Mutex<HashSet<String>>,
    failing_configures: Mutex<HashMap<ResourceId, u32>>,
    failing_status_queries: Mutex<HashSet<ResourceId>>,
    failing_count: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_starts(&self, job_name: &str, replies: Vec<StartReply>) {
        self.start_replies
            .lock()
            .unwrap()
            .insert(encoding_id(job_name), replies.into());
    }

    pub fn script_statuses(&self, job_name: &str, tasks: Vec<Task>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(encoding_id(job_name), tasks.into());
    }

    pub fn fail_create(&self, job_name: &str) {
        self.failing_creates
            .lock()
            .unwrap()
            .insert(job_name.to_string());
    }

    /// The next `times` configuration attempts for `job_name` fail.
    pub fn fail_configure(&self, job_name: &str, times: u32) {
        self.failing_configures
            .lock()
            .unwrap()
            .insert(encoding_id(job_name), times);
    }

    pub fn fail_status_queries(&self, job_name: &str) {
        self.failing_status_queries
            .lock()
            .unwrap()
            .insert(encoding_id(job_name));
    }

    pub fn fail_count(&self, failing: bool) {
        *self.failing_count.lock().unwrap() = failing;
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn configured(&self) -> Vec<String> {
        self.configured.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<String> {
        self.starts.lock().unwrap().clone()
    }

    pub fn start_count(&self, job_name: &str) -> usize {
        let id = encoding_id(job_name);
        self.starts.lock().unwrap().iter().filter(|s| **s == id).count()
    }

    fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

pub fn encoding_id(job_name: &str) -> ResourceId {
    format!("enc-{job_name}")
}

#[async_trait]
impl batchenc_pipeline::backend::JobBackend for FakeBackend {
    async fn count_queued(&self) -> Result<u64, ApiError> {
        if *self.failing_count.lock().unwrap() {
            return Err(api_error(None, "service unavailable"));
        }
        Ok(self.active.lock().unwrap().len() as u64)
    }

    async fn create_encoding(&self, job: &EncodingJob) -> Result<ResourceId, ApiError> {
        self.created.lock().unwrap().push(job.name.clone());
        if self.failing_creates.lock().unwrap().contains(&job.name) {
            return Err(api_error(Some(1001), "input file not found"));
        }
        Ok(encoding_id(&job.name))
    }

    async fn configure_encoding(
        &self,
        _job: &EncodingJob,
        encoding_id: &str,
    ) -> Result<(), ApiError> {
        self.configured.lock().unwrap().push(encoding_id.to_string());
        if let Some(left) = self.failing_configures.lock().unwrap().get_mut(encoding_id) {
            if *left > 0 {
                *left -= 1;
                return Err(api_error(None, "stream creation failed"));
            }
        }
        Ok(())
    }

    async fn start_encoding(&self, encoding_id: &str) -> Result<(), ApiError> {
        self.starts.lock().unwrap().push(encoding_id.to_string());

        let reply = self
            .start_replies
            .lock()
            .unwrap()
            .get_mut(encoding_id)
            .and_then(Self::next)
            .unwrap_or(StartReply::Accept);

        match reply {
            StartReply::Accept => {
                self.active.lock().unwrap().insert(encoding_id.to_string());
                Ok(())
            }
            StartReply::QueueFull => Err(api_error(
                Some(QUEUE_LIMIT_EXCEEDED),
                "Queue limit exceeded",
            )),
            StartReply::Fail => Err(api_error(Some(1002), "start rejected")),
        }
    }

    async fn encoding_status(&self, encoding_id: &str) -> Result<Task, ApiError> {
        self.polls.lock().unwrap().push(encoding_id.to_string());
        if self.failing_status_queries.lock().unwrap().contains(encoding_id) {
            return Err(api_error(None, "gateway timeout"));
        }

        let task = {
            let mut statuses = self.statuses.lock().unwrap();
            let queue = statuses
                .entry(encoding_id.to_string())
                .or_insert_with(|| VecDeque::from(vec![running(), finished()]));
            Self::next(queue).unwrap_or_else(finished)
        };

        if task.status.is_terminal() {
            self.active.lock().unwrap().remove(encoding_id);
        }
        Ok(task)
    }
}

// ---------------------------------------------------------------------------
// Pause
// ---------------------------------------------------------------------------

/// Returns immediately, recording the requested durations.
#[derive(Default)]
pub struct RecordingPause {
    pub requested: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn requested(&self) -> Vec<Duration> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.requested.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// `count` jobs named `job1`, `job2`, ...
pub fn jobs(count: usize) -> Vec<EncodingJob> {
    (1..=count)
        .map(|n| {
            EncodingJob::new(
                format!("job{n}"),
                format!("/input/file{n}.mkv"),
                format!("/output/job{n}"),
            )
        })
        .collect()
}

pub fn config(target_queue_size: u32, max_retries: u32) -> DispatcherConfig {
    DispatcherConfig {
        target_queue_size,
        max_retries,
        ..DispatcherConfig::default()
    }
}
