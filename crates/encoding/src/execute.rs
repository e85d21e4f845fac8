//! Start an encoding and wait for it to reach a final state.
//!
//! [`execute_encoding`] polls a single encoding. [`execute_all`] runs
//! several independent encodings concurrently on a [`JoinSet`] and joins
//! them; the tasks share nothing but the stateless client.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use batchenc_core::pause::Pause;
use batchenc_core::types::ResourceId;

use crate::error::ApiError;
use crate::models::{StartEncodingRequest, Task};
use crate::service::EncodingService;

/// Default interval between status queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Start `encoding_id` and poll its status until it is finished, failed
/// or canceled. Returns the final task.
///
/// A failed encoding is not an `Err`: callers inspect the returned task.
pub async fn execute_encoding<S, P>(
    service: &S,
    pause: &P,
    encoding_id: &str,
    request: &StartEncodingRequest,
    poll_interval: Duration,
) -> Result<Task, ApiError>
where
    S: EncodingService + ?Sized,
    P: Pause + ?Sized,
{
    service.start_encoding(encoding_id, request).await?;
    tracing::info!(encoding_id, "Encoding started");

    loop {
        pause.pause(poll_interval).await;

        let task = service.encoding_status(encoding_id).await?;
        tracing::info!(
            encoding_id,
            status = %task.status,
            progress = task.progress.unwrap_or(0.0),
            "Encoding status",
        );

        if task.status.is_terminal() {
            if task.status.is_failure() {
                for message in task.error_messages() {
                    tracing::error!(encoding_id, message = %message, "Encoding error");
                }
            } else {
                tracing::info!(encoding_id, status = %task.status, "Encoding finished");
            }
            return Ok(task);
        }
    }
}

/// One encoding to run as part of [`execute_all`].
#[derive(Debug, Clone)]
pub struct EncodingRun {
    pub encoding_id: ResourceId,
    pub request: StartEncodingRequest,
}

/// Outcome of one [`EncodingRun`].
#[derive(Debug)]
pub struct EncodingRunResult {
    pub encoding_id: ResourceId,
    pub result: Result<Task, ApiError>,
}

/// Run every encoding concurrently and wait for all of them.
///
/// Results are returned in the order of `runs`. A task that panicked is
/// logged and has no entry in the result.
pub async fn execute_all<S, P>(
    service: Arc<S>,
    pause: Arc<P>,
    runs: Vec<EncodingRun>,
    poll_interval: Duration,
) -> Vec<EncodingRunResult>
where
    S: EncodingService + ?Sized + 'static,
    P: Pause + ?Sized + 'static,
{
    let mut set = JoinSet::new();

    for (index, run) in runs.into_iter().enumerate() {
        let service = Arc::clone(&service);
        let pause = Arc::clone(&pause);
        set.spawn(async move {
            let result = execute_encoding(
                service.as_ref(),
                pause.as_ref(),
                &run.encoding_id,
                &run.request,
                poll_interval,
            )
            .await;
            (
                index,
                EncodingRunResult {
                    encoding_id: run.encoding_id,
                    result,
                },
            )
        });
    }

    let mut results = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(entry) => results.push(entry),
            Err(e) => tracing::error!(error = %e, "Encoding task panicked"),
        }
    }

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}
