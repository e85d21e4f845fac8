//! Process setup: tracing, and turning configuration into client settings.

use std::fmt::Display;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use batchenc_core::config::ConfigProvider;
use batchenc_core::error::CoreError;
use batchenc_core::job::{load_job_list, EncodingJob};
use batchenc_encoding::api::ApiConfig;
use batchenc_encoding::models::{InputConfig, OutputConfig};
use batchenc_pipeline::dispatcher::DispatcherConfig;

/// Default `EnvFilter` directives when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str =
    "batchenc_worker=info,batchenc_pipeline=info,batchenc_encoding=info,batchenc_core=info";

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON output.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Unwrap a setup result or log the error and exit with status 1.
pub fn exit_on_error<T, E: Display>(result: Result<T, E>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "{what}");
        std::process::exit(1);
    })
}

pub fn api_config(config: &ConfigProvider) -> Result<ApiConfig, CoreError> {
    let mut api = ApiConfig::new(config.api_url(), config.api_key()?);
    api.tenant_org_id = config.tenant_org_id();
    Ok(api)
}

/// Role-based S3 input when `S3_INPUT_ARN_ROLE` is set, HTTP otherwise.
pub fn input_config(config: &ConfigProvider) -> Result<InputConfig, CoreError> {
    match config.s3_input_arn_role() {
        Some(role_arn) => Ok(InputConfig::S3RoleBased {
            bucket_name: config.s3_input_bucket_name()?,
            role_arn,
            external_id: config.s3_input_external_id()?,
        }),
        None => Ok(InputConfig::Http {
            host: config.http_input_host()?,
        }),
    }
}

/// Role-based S3 output when `S3_OUTPUT_ARN_ROLE` is set, access keys
/// otherwise.
pub fn output_config(config: &ConfigProvider) -> Result<OutputConfig, CoreError> {
    let bucket_name = config.s3_output_bucket_name()?;
    match config.s3_output_arn_role() {
        Some(role_arn) => Ok(OutputConfig::S3RoleBased {
            bucket_name,
            role_arn,
            external_id: config.s3_output_external_id()?,
        }),
        None => Ok(OutputConfig::S3 {
            bucket_name,
            access_key: config.s3_output_access_key()?,
            secret_key: config.s3_output_secret_key()?,
        }),
    }
}

pub fn dispatcher_config(config: &ConfigProvider) -> Result<DispatcherConfig, CoreError> {
    Ok(DispatcherConfig {
        target_queue_size: config.batch_target_queue_size()?,
        max_retries: config.batch_max_retries()?,
        ..DispatcherConfig::default()
    })
}

/// Read the job list named by `BATCH_JOBS_FILE`.
pub fn load_jobs(config: &ConfigProvider) -> Result<Vec<EncodingJob>, CoreError> {
    let path = config.batch_jobs_file()?;
    let specs = load_job_list(&path)?;
    tracing::info!(path = %path.display(), jobs = specs.len(), "Job list loaded");
    Ok(specs.into_iter().map(EncodingJob::from).collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use assert_matches::assert_matches;
    use batchenc_core::config::keys;

    use super::*;

    fn provider(pairs: &[(&str, &str)]) -> ConfigProvider {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigProvider::from_sources(vec![("test", values)])
    }

    #[test]
    fn api_config_uses_default_url_and_optional_tenant() {
        let api = api_config(&provider(&[(keys::API_KEY, "secret")])).unwrap();
        assert_eq!(api.base_url, "https://api.bitmovin.com/v1");
        assert_eq!(api.api_key, "secret");
        assert_eq!(api.tenant_org_id, None);

        let api = api_config(&provider(&[
            (keys::API_KEY, "secret"),
            (keys::API_URL, "https://encoding.test/v1"),
            (keys::TENANT_ORG_ID, "org-7"),
        ]))
        .unwrap();
        assert_eq!(api.base_url, "https://encoding.test/v1");
        assert_eq!(api.tenant_org_id.as_deref(), Some("org-7"));
    }

    #[test]
    fn missing_api_key_is_reported() {
        assert_matches!(
            api_config(&provider(&[])),
            Err(CoreError::MissingParameter { key, .. }) if key == keys::API_KEY
        );
    }

    #[test]
    fn input_defaults_to_http() {
        let input = input_config(&provider(&[(keys::HTTP_INPUT_HOST, "media.test")])).unwrap();
        assert_eq!(
            input,
            InputConfig::Http {
                host: "media.test".into()
            }
        );
    }

    #[test]
    fn input_role_arn_selects_role_based_s3() {
        let input = input_config(&provider(&[
            (keys::S3_INPUT_ARN_ROLE, "arn:aws:iam::1:role/in"),
            (keys::S3_INPUT_BUCKET_NAME, "sources"),
            (keys::S3_INPUT_EXT_ID, "ext-1"),
        ]))
        .unwrap();
        assert_eq!(
            input,
            InputConfig::S3RoleBased {
                bucket_name: "sources".into(),
                role_arn: "arn:aws:iam::1:role/in".into(),
                external_id: "ext-1".into(),
            }
        );
    }

    #[test]
    fn output_selection() {
        let keyed = output_config(&provider(&[
            (keys::S3_OUTPUT_BUCKET_NAME, "results"),
            (keys::S3_OUTPUT_ACCESS_KEY, "ak"),
            (keys::S3_OUTPUT_SECRET_KEY, "sk"),
        ]))
        .unwrap();
        assert_matches!(keyed, OutputConfig::S3 { bucket_name, .. } if bucket_name == "results");

        let role = output_config(&provider(&[
            (keys::S3_OUTPUT_BUCKET_NAME, "results"),
            (keys::S3_OUTPUT_ARN_ROLE, "arn:aws:iam::1:role/out"),
            (keys::S3_OUTPUT_EXT_ID, "ext-2"),
        ]))
        .unwrap();
        assert_matches!(role, OutputConfig::S3RoleBased { external_id, .. } if external_id == "ext-2");
    }

    #[test]
    fn dispatcher_config_reads_batch_settings() {
        let config = dispatcher_config(&provider(&[
            (keys::BATCH_TARGET_QUEUE_SIZE, "5"),
            (keys::BATCH_MAX_RETRIES, "0"),
        ]))
        .unwrap();
        assert_eq!(config.target_queue_size, 5);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.pass_interval, DispatcherConfig::default().pass_interval);

        assert_eq!(
            dispatcher_config(&provider(&[])).unwrap(),
            DispatcherConfig::default()
        );
    }

    #[test]
    fn load_jobs_reads_the_configured_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "encoding1", "input_path": "/in/file1.mkv", "output_path": "/out/encoding1"}},
                {{"name": "encoding2", "input_path": "/in/file2.mkv", "output_path": "/out/encoding2"}}
            ]"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let jobs = load_jobs(&provider(&[(keys::BATCH_JOBS_FILE, path.as_str())])).unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].name, "encoding2");
        assert_eq!(jobs[1].encoding_id, None);
        assert!(jobs.iter().all(|j| j.retry_count == 0));
    }
}
