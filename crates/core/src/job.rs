//! Batch encoding job model and its state machine.
//!
//! An [`EncodingJob`] moves `Waiting -> Started -> {Successful | Waiting | GivenUp}`.
//! The transition methods consume explicit outcome values produced by the
//! remote calls, so the retry rules can be exercised without a network.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ResourceId;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a job inside the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Not yet started, or waiting to be restarted after a retryable failure.
    Waiting,
    /// Start call accepted by the remote service.
    Started,
    /// Remote encoding finished.
    Successful,
    /// Retries exhausted or a permanent error was reported.
    GivenUp,
}

impl JobStatus {
    /// `Successful` and `GivenUp` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Successful | Self::GivenUp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Started => "STARTED",
            Self::Successful => "SUCCESSFUL",
            Self::GivenUp => "GIVEN_UP",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcomes of remote calls
// ---------------------------------------------------------------------------

/// Result of a single attempt to start a job remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The remote service accepted the start call.
    Started,
    /// The platform limit for queued encodings has been reached.
    QueueLimitExceeded,
    /// Any other failure (resource creation or start call).
    Failed { message: String },
}

/// Result of a single status query for a started job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still queued or running.
    Running,
    /// Finished successfully.
    Finished,
    /// The remote encoding failed.
    Failed {
        retryable: bool,
        messages: Vec<String>,
    },
}

/// What a transition did to a job. Used for logging by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Started,
    Succeeded,
    /// Back to `Waiting`; `retries_left` further failures are tolerated.
    Requeued { retries_left: u32 },
    GivenUp,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Description of a job as loaded from a job list file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub input_path: String,
    pub output_path: String,
}

/// One unit of work submitted to the remote encoding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingJob {
    pub name: String,
    pub input_path: String,
    pub output_path: String,
    /// Remote encoding id; `None` until the remote resource is created.
    pub encoding_id: Option<ResourceId>,
    /// Streams and muxings of the remote encoding have been created.
    pub configured: bool,
    pub retry_count: u32,
    pub status: JobStatus,
    pub error_messages: Vec<String>,
}

impl EncodingJob {
    pub fn new(
        name: impl Into<String>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            encoding_id: None,
            configured: false,
            retry_count: 0,
            status: JobStatus::Waiting,
            error_messages: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Human-readable remote id for log lines.
    pub fn display_id(&self) -> &str {
        self.encoding_id.as_deref().unwrap_or("<not created>")
    }

    /// Apply the result of a start attempt.
    ///
    /// Only `Waiting` jobs are affected. A queue-limit signal never
    /// consumes a retry.
    pub fn apply_start(&mut self, outcome: StartOutcome, max_retries: u32) -> Transition {
        if self.status != JobStatus::Waiting {
            return Transition::Unchanged;
        }

        match outcome {
            StartOutcome::Started => {
                self.status = JobStatus::Started;
                Transition::Started
            }
            StartOutcome::QueueLimitExceeded => Transition::Unchanged,
            StartOutcome::Failed { message } => {
                self.retry_count += 1;
                if self.retry_count > max_retries {
                    self.status = JobStatus::GivenUp;
                    self.error_messages
                        .push(format!("The encoding could not be started: {message}"));
                    Transition::GivenUp
                } else {
                    Transition::Requeued {
                        retries_left: max_retries - self.retry_count,
                    }
                }
            }
        }
    }

    /// Apply the result of a status query.
    ///
    /// Only `Started` jobs are affected. A non-retryable failure gives up
    /// without touching the retry counter. A retryable failure increments
    /// the counter before comparing it with `max_retries`, so the job is
    /// given up on failure number `max_retries + 1`.
    pub fn apply_poll(&mut self, outcome: PollOutcome, max_retries: u32) -> Transition {
        if self.status != JobStatus::Started {
            return Transition::Unchanged;
        }

        match outcome {
            PollOutcome::Running => Transition::Unchanged,
            PollOutcome::Finished => {
                self.status = JobStatus::Successful;
                Transition::Succeeded
            }
            PollOutcome::Failed {
                retryable: false,
                messages,
            } => {
                self.give_up(messages);
                Transition::GivenUp
            }
            PollOutcome::Failed {
                retryable: true,
                messages,
            } => {
                self.retry_count += 1;
                if self.retry_count > max_retries {
                    self.give_up(messages);
                    Transition::GivenUp
                } else {
                    self.status = JobStatus::Waiting;
                    Transition::Requeued {
                        retries_left: max_retries - self.retry_count,
                    }
                }
            }
        }
    }

    fn give_up(&mut self, messages: Vec<String>) {
        self.status = JobStatus::GivenUp;
        self.error_messages.extend(messages);
    }
}

impl From<JobSpec> for EncodingJob {
    fn from(spec: JobSpec) -> Self {
        Self::new(spec.name, spec.input_path, spec.output_path)
    }
}

// ---------------------------------------------------------------------------
// Job list loading
// ---------------------------------------------------------------------------

/// Parse and validate a JSON job list.
///
/// Names must be non-empty and unique; input and output paths must be
/// non-empty.
pub fn parse_job_list(json: &str) -> Result<Vec<JobSpec>, CoreError> {
    let specs: Vec<JobSpec> =
        serde_json::from_str(json).map_err(|e| CoreError::Validation(e.to_string()))?;

    let mut seen = std::collections::HashSet::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        if spec.name.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Job at index {i} has an empty name"
            )));
        }
        if spec.input_path.trim().is_empty() || spec.output_path.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "Job \"{}\" must have an input and an output path",
                spec.name
            )));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate job name: \"{}\"",
                spec.name
            )));
        }
    }

    Ok(specs)
}

/// Read a job list file from disk.
pub fn load_job_list(path: &Path) -> Result<Vec<JobSpec>, CoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CoreError::JobList {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_job_list(&raw).map_err(|e| CoreError::JobList {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
