//! Summary of a dispatcher run.

use serde::Serialize;

use batchenc_core::job::{EncodingJob, JobStatus};
use batchenc_core::types::{ResourceId, Timestamp};

/// A job that was given up, with everything needed to investigate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GivenUpJob {
    pub name: String,
    pub encoding_id: Option<ResourceId>,
    pub retry_count: u32,
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub given_up: Vec<GivenUpJob>,
    /// Jobs still waiting or running when the run was interrupted.
    pub unfinished: usize,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl BatchReport {
    /// Summarize `jobs` for a run that began at `started_at` and ends now.
    pub fn from_jobs(jobs: &[EncodingJob], started_at: Timestamp) -> Self {
        let mut report = Self {
            total: jobs.len(),
            successful: 0,
            given_up: Vec::new(),
            unfinished: 0,
            started_at,
            finished_at: chrono::Utc::now(),
        };

        for job in jobs {
            match job.status {
                JobStatus::Successful => report.successful += 1,
                JobStatus::GivenUp => report.given_up.push(GivenUpJob {
                    name: job.name.clone(),
                    encoding_id: job.encoding_id.clone(),
                    retry_count: job.retry_count,
                    error_messages: job.error_messages.clone(),
                }),
                JobStatus::Waiting | JobStatus::Started => report.unfinished += 1,
            }
        }

        report
    }

    pub fn is_complete(&self) -> bool {
        self.unfinished == 0
    }

    /// Log the summary and one error line per given-up job.
    pub fn log(&self) {
        tracing::info!(
            total = self.total,
            successful = self.successful,
            given_up = self.given_up.len(),
            unfinished = self.unfinished,
            elapsed_secs = (self.finished_at - self.started_at).num_seconds(),
            "Batch finished",
        );

        for job in &self.given_up {
            tracing::error!(
                job = %job.name,
                encoding_id = job.encoding_id.as_deref().unwrap_or("<not created>"),
                retries = job.retry_count,
                errors = %job.error_messages.join("; "),
                "Encoding was given up",
            );
        }
    }
}
