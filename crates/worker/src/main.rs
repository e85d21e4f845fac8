//! `batchenc-worker` -- batch encoding dispatcher.
//!
//! Creates the shared input, output and codec configurations, then feeds
//! the jobs from `BATCH_JOBS_FILE` to the encoding service, keeping at
//! most `BATCH_TARGET_QUEUE_SIZE` encodings queued at a time.
//!
//! Parameters are read from `KEY=VALUE` arguments, `./batchenc.properties`,
//! the environment and `~/.batchenc/batchenc.properties`, in that order.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use batchenc_core::config::ConfigProvider;
use batchenc_core::pause::TokioPause;
use batchenc_encoding::api::EncodingApi;
use batchenc_encoding::ladder::{default_ladder, EncodingTemplate};
use batchenc_encoding::models::MuxingKind;
use batchenc_encoding::service::EncodingService;
use batchenc_pipeline::backend::RemoteBackend;
use batchenc_pipeline::dispatcher::JobDispatcher;
use batchenc_worker::setup::{self, exit_on_error};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    setup::init_tracing();

    let config = exit_on_error(
        ConfigProvider::load(std::env::args().skip(1)),
        "Failed to load configuration",
    );

    let api_config = exit_on_error(setup::api_config(&config), "Invalid API configuration");
    let input = exit_on_error(setup::input_config(&config), "Invalid input configuration");
    let output = exit_on_error(setup::output_config(&config), "Invalid output configuration");
    let output_base_path = exit_on_error(
        config.s3_output_base_path(),
        "Invalid output configuration",
    );
    let dispatcher_config = exit_on_error(
        setup::dispatcher_config(&config),
        "Invalid batch configuration",
    );
    let jobs = exit_on_error(setup::load_jobs(&config), "Failed to load job list");

    let api = Arc::new(exit_on_error(
        EncodingApi::new(api_config),
        "Failed to build encoding client",
    ));

    let input_id = exit_on_error(api.create_input(&input).await, "Failed to create input");
    let output_id = exit_on_error(api.create_output(&output).await, "Failed to create output");
    let template = exit_on_error(
        EncodingTemplate::create(
            api.as_ref(),
            input_id,
            output_id,
            output_base_path,
            default_ladder(),
            MuxingKind::Fmp4,
        )
        .await,
        "Failed to create codec configurations",
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping after the current pass");
                cancel.cancel();
            }
        });
    }

    let backend = RemoteBackend::new(Arc::clone(&api), template);
    let mut dispatcher = JobDispatcher::new(backend, TokioPause, jobs, dispatcher_config);
    let report = dispatcher.run(cancel).await;

    if !report.is_complete() {
        tracing::warn!(
            unfinished = report.unfinished,
            "Batch interrupted before all jobs finished",
        );
    }
}
