//! Batch job dispatcher.
//!
//! Keeps up to `target_queue_size` encodings queued on the service, polls
//! the started ones, and retries failed jobs up to `max_retries` times.
//! Runs as a single cooperative task; the job list is owned by the
//! dispatcher and mutated only through the transition methods on
//! [`EncodingJob`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use batchenc_core::config::{DEFAULT_MAX_RETRIES, DEFAULT_TARGET_QUEUE_SIZE};
use batchenc_core::job::{EncodingJob, JobStatus, PollOutcome, StartOutcome, Transition};
use batchenc_core::pause::Pause;
use batchenc_encoding::models::{Status, Task};

use crate::backend::JobBackend;
use crate::report::BatchReport;

/// Default pause between two passes of the main loop.
pub const DEFAULT_PASS_INTERVAL: Duration = Duration::from_secs(10);

/// Default pause between two consecutive requests within a pass.
pub const DEFAULT_REQUEST_SPACING: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Upper bound on encodings queued on the service at the same time.
    pub target_queue_size: u32,
    /// Failures tolerated per job before it is given up.
    pub max_retries: u32,
    pub pass_interval: Duration,
    pub request_spacing: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            target_queue_size: DEFAULT_TARGET_QUEUE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            pass_interval: DEFAULT_PASS_INTERVAL,
            request_spacing: DEFAULT_REQUEST_SPACING,
        }
    }
}

/// Whether a submission pass may continue after submitting a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    Continue,
    /// The service refused the start because its queue is full.
    QueueFull,
}

pub struct JobDispatcher<B, P> {
    backend: B,
    pause: P,
    jobs: Vec<EncodingJob>,
    config: DispatcherConfig,
}

impl<B: JobBackend, P: Pause> JobDispatcher<B, P> {
    pub fn new(backend: B, pause: P, jobs: Vec<EncodingJob>, config: DispatcherConfig) -> Self {
        Self {
            backend,
            pause,
            jobs,
            config,
        }
    }

    pub fn jobs(&self) -> &[EncodingJob] {
        &self.jobs
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Up to `limit` waiting jobs, in list order.
    pub fn select_jobs_to_start(&self, limit: usize) -> Vec<&EncodingJob> {
        self.indices_with_status(JobStatus::Waiting, limit)
            .into_iter()
            .map(|i| &self.jobs[i])
            .collect()
    }

    pub fn list_active_jobs(&self) -> Vec<&EncodingJob> {
        self.indices_with_status(JobStatus::Started, usize::MAX)
            .into_iter()
            .map(|i| &self.jobs[i])
            .collect()
    }

    pub fn all_jobs_finished(&self) -> bool {
        self.jobs.iter().all(EncodingJob::is_terminal)
    }

    fn indices_with_status(&self, status: JobStatus, limit: usize) -> Vec<usize> {
        self.jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.status == status)
            .map(|(i, _)| i)
            .take(limit)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Run until every job is finished or `cancel` fires, then report.
    pub async fn run(&mut self, cancel: CancellationToken) -> BatchReport {
        let started_at = chrono::Utc::now();
        tracing::info!(
            jobs = self.jobs.len(),
            target_queue_size = self.config.target_queue_size,
            max_retries = self.config.max_retries,
            "Job dispatcher started",
        );

        while !self.all_jobs_finished() {
            self.submit_pending().await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Job dispatcher shutting down");
                    break;
                }
                _ = self.pause.pause(self.config.pass_interval) => {}
            }

            self.poll_active().await;
        }

        let report = BatchReport::from_jobs(&self.jobs, started_at);
        report.log();
        report
    }

    /// Fill the free queue slots with waiting jobs, in list order.
    ///
    /// Stops early when the service reports that its queue is full. When
    /// the queue size cannot be determined nothing is submitted.
    pub async fn submit_pending(&mut self) {
        let queued = match self.backend.count_queued().await {
            Ok(queued) => queued,
            Err(e) => {
                tracing::warn!(error = %e, "Could not count queued encodings, skipping submission");
                return;
            }
        };

        let free_slots = u64::from(self.config.target_queue_size).saturating_sub(queued);
        tracing::info!(queued, free_slots, "Queue status");
        if free_slots == 0 {
            return;
        }

        let limit = usize::try_from(free_slots).unwrap_or(usize::MAX);
        let selected = self.indices_with_status(JobStatus::Waiting, limit);

        for (n, index) in selected.into_iter().enumerate() {
            if n > 0 {
                self.pause.pause(self.config.request_spacing).await;
            }
            if self.submit_job(index).await == SubmitResult::QueueFull {
                break;
            }
        }
    }

    /// Poll every started job once.
    pub async fn poll_active(&mut self) {
        let active = self.indices_with_status(JobStatus::Started, usize::MAX);

        for (n, index) in active.into_iter().enumerate() {
            if n > 0 {
                self.pause.pause(self.config.request_spacing).await;
            }
            self.poll_job(index).await;
        }
    }

    // -----------------------------------------------------------------------
    // Per-job operations
    // -----------------------------------------------------------------------

    /// Create and configure the remote encoding for the job at `index` if
    /// needed, then start it.
    ///
    /// The encoding id is stored as soon as the encoding exists, so a retry
    /// after a configuration failure reuses the same encoding.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub async fn submit_job(&mut self, index: usize) -> SubmitResult {
        if self.jobs[index].status != JobStatus::Waiting {
            return SubmitResult::Continue;
        }

        let existing = self.jobs[index].encoding_id.clone();
        let encoding_id = match existing {
            Some(id) => id,
            None => {
                let created = self.backend.create_encoding(&self.jobs[index]).await;
                match created {
                    Ok(id) => {
                        tracing::info!(
                            job = %self.jobs[index].name,
                            encoding_id = %id,
                            "Encoding created",
                        );
                        self.jobs[index].encoding_id = Some(id.clone());
                        id
                    }
                    Err(e) => {
                        let message = e.to_string();
                        self.record_start(index, StartOutcome::Failed { message });
                        return SubmitResult::Continue;
                    }
                }
            }
        };

        if !self.jobs[index].configured {
            let configured = self
                .backend
                .configure_encoding(&self.jobs[index], &encoding_id)
                .await;
            if let Err(e) = configured {
                let message = e.to_string();
                self.record_start(index, StartOutcome::Failed { message });
                return SubmitResult::Continue;
            }
            self.jobs[index].configured = true;
        }

        let outcome = match self.backend.start_encoding(&encoding_id).await {
            Ok(()) => StartOutcome::Started,
            Err(e) if e.is_queue_limit_exceeded() => StartOutcome::QueueLimitExceeded,
            Err(e) => StartOutcome::Failed {
                message: e.to_string(),
            },
        };

        let queue_full = outcome == StartOutcome::QueueLimitExceeded;
        self.record_start(index, outcome);

        if queue_full {
            SubmitResult::QueueFull
        } else {
            SubmitResult::Continue
        }
    }

    /// Query the status of the started job at `index` and apply it.
    ///
    /// A failed status query leaves the job untouched; it is polled again
    /// on the next pass.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub async fn poll_job(&mut self, index: usize) -> Transition {
        let job = &self.jobs[index];
        if job.status != JobStatus::Started {
            return Transition::Unchanged;
        }
        let Some(encoding_id) = job.encoding_id.clone() else {
            return Transition::Unchanged;
        };

        let task = match self.backend.encoding_status(&encoding_id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::warn!(
                    job = %self.jobs[index].name,
                    encoding_id = %encoding_id,
                    error = %e,
                    "Could not query encoding status",
                );
                return Transition::Unchanged;
            }
        };

        let job = &mut self.jobs[index];
        let transition = job.apply_poll(classify_task(&task), self.config.max_retries);

        match transition {
            Transition::Succeeded => {
                tracing::info!(job = %job.name, encoding_id = %encoding_id, "Encoding finished");
            }
            Transition::Requeued { retries_left } => {
                tracing::warn!(
                    job = %job.name,
                    encoding_id = %encoding_id,
                    status = %task.status,
                    error_code = task.error_code(),
                    retries_left,
                    "Encoding failed, will be resubmitted",
                );
            }
            Transition::GivenUp => {
                tracing::error!(
                    job = %job.name,
                    encoding_id = %encoding_id,
                    status = %task.status,
                    error_code = task.error_code(),
                    retries = job.retry_count,
                    "Encoding failed, giving up",
                );
            }
            Transition::Unchanged | Transition::Started => {
                tracing::info!(
                    job = %job.name,
                    encoding_id = %encoding_id,
                    status = %task.status,
                    progress = task.progress.unwrap_or(0.0),
                    "Encoding in progress",
                );
            }
        }

        transition
    }

    fn record_start(&mut self, index: usize, outcome: StartOutcome) -> Transition {
        let message = match &outcome {
            StartOutcome::Failed { message } => Some(message.clone()),
            _ => None,
        };

        let job = &mut self.jobs[index];
        let transition = job.apply_start(outcome, self.config.max_retries);
        let encoding_id = job.display_id().to_string();

        match transition {
            Transition::Started => {
                tracing::info!(job = %job.name, encoding_id = %encoding_id, "Encoding started");
            }
            Transition::Unchanged => {
                tracing::info!(
                    job = %job.name,
                    encoding_id = %encoding_id,
                    "Queue limit exceeded, stopping submission for this pass",
                );
            }
            Transition::Requeued { retries_left } => {
                tracing::warn!(
                    job = %job.name,
                    encoding_id = %encoding_id,
                    error = message.as_deref().unwrap_or_default(),
                    retries_left,
                    "Encoding could not be started, will retry",
                );
            }
            Transition::GivenUp => {
                tracing::error!(
                    job = %job.name,
                    encoding_id = %encoding_id,
                    error = message.as_deref().unwrap_or_default(),
                    "Encoding could not be started, giving up",
                );
            }
            Transition::Succeeded => {}
        }

        transition
    }
}

/// Map a remote task status onto the outcome of a poll.
///
/// `Canceled` is permanent. A failure without error details, or with a
/// `NO_RETRY` hint, is not retried.
pub fn classify_task(task: &Task) -> PollOutcome {
    match task.status {
        Status::Finished => PollOutcome::Finished,
        Status::Error | Status::TransferError => {
            let mut messages = task.error_messages();
            if messages.is_empty() {
                messages.push(format!("Encoding failed with status {}", task.status));
            }
            PollOutcome::Failed {
                retryable: task.is_retryable_error(),
                messages,
            }
        }
        Status::Canceled => PollOutcome::Failed {
            retryable: false,
            messages: vec!["Encoding was canceled".to_string()],
        },
        Status::Created | Status::Queued | Status::Running | Status::Unknown => {
            PollOutcome::Running
        }
    }
}
