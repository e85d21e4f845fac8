//! `batchenc-multi` -- encode one input with several codecs concurrently.
//!
//! Configures an H.264/AAC, an H.265 and a VP9/Vorbis encoding of
//! `HTTP_INPUT_FILE_PATH`, starts all three with default DASH and HLS
//! manifests and waits for them to finish. Exits with status 1 when any
//! encoding did not finish successfully.

use std::sync::Arc;

use batchenc_core::config::ConfigProvider;
use batchenc_core::pause::TokioPause;
use batchenc_encoding::api::EncodingApi;
use batchenc_encoding::execute::{execute_all, DEFAULT_POLL_INTERVAL};
use batchenc_encoding::models::Status;
use batchenc_encoding::service::EncodingService;
use batchenc_worker::multi::{configure_plan, encoding_plans, SharedResources};
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
    let input_path = exit_on_error(config.http_input_file_path(), "Invalid input configuration");
    let output_base_path = exit_on_error(
        config.s3_output_base_path(),
        "Invalid output configuration",
    );

    let api = Arc::new(exit_on_error(
        EncodingApi::new(api_config),
        "Failed to build encoding client",
    ));

    let shared = SharedResources {
        input_id: exit_on_error(api.create_input(&input).await, "Failed to create input"),
        input_path,
        output_id: exit_on_error(api.create_output(&output).await, "Failed to create output"),
        output_base_path,
    };

    let mut runs = Vec::new();
    for plan in encoding_plans() {
        let run = exit_on_error(
            configure_plan(api.as_ref(), &plan, &shared).await,
            "Failed to configure encoding",
        );
        runs.push(run);
    }

    let results = execute_all(api, Arc::new(TokioPause), runs, DEFAULT_POLL_INTERVAL).await;

    let mut failed = 0;
    for run in &results {
        match &run.result {
            Ok(task) if task.status == Status::Finished => {
                tracing::info!(encoding_id = %run.encoding_id, "Encoding finished successfully");
            }
            Ok(task) => {
                failed += 1;
                tracing::error!(
                    encoding_id = %run.encoding_id,
                    status = %task.status,
                    "Encoding did not finish successfully",
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(encoding_id = %run.encoding_id, error = %e, "Encoding failed");
            }
        }
    }

    if failed > 0 || results.len() < encoding_plans().len() {
        std::process::exit(1);
    }
}
