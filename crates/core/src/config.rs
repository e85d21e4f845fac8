//! Layered configuration lookup.
//!
//! Parameters are resolved from these sources, first match wins:
//!
//! 1. command-line arguments of the form `KEY=VALUE`
//! 2. `./batchenc.properties`
//! 3. environment variables
//! 4. `~/.batchenc/batchenc.properties`
//!
//! Properties files use `KEY=VALUE` lines and are parsed with `dotenvy`.
//! Empty values are treated as absent in every source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::CoreError;
use crate::paths::normalize_base_path;

/// File name of the properties file looked up in the working directory
/// and in the home configuration directory.
pub const PROPERTIES_FILE: &str = "batchenc.properties";

/// Directory below the user's home holding the system-wide properties file.
pub const HOME_CONFIG_DIR: &str = ".batchenc";

/// Default base URL of the remote encoding service.
pub const DEFAULT_API_URL: &str = "https://api.bitmovin.com/v1";

/// Default number of remote encodings to keep queued.
pub const DEFAULT_TARGET_QUEUE_SIZE: u32 = 3;

/// Default number of retries per job.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

pub mod keys {
    pub const API_KEY: &str = "ENCODING_API_KEY";
    pub const API_URL: &str = "ENCODING_API_URL";
    pub const TENANT_ORG_ID: &str = "ENCODING_TENANT_ORG_ID";
    pub const HTTP_INPUT_HOST: &str = "HTTP_INPUT_HOST";
    pub const HTTP_INPUT_FILE_PATH: &str = "HTTP_INPUT_FILE_PATH";
    pub const S3_INPUT_BUCKET_NAME: &str = "S3_INPUT_BUCKET_NAME";
    pub const S3_INPUT_ARN_ROLE: &str = "S3_INPUT_ARN_ROLE";
    pub const S3_INPUT_EXT_ID: &str = "S3_INPUT_EXT_ID";
    pub const S3_OUTPUT_BUCKET_NAME: &str = "S3_OUTPUT_BUCKET_NAME";
    pub const S3_OUTPUT_ACCESS_KEY: &str = "S3_OUTPUT_ACCESS_KEY";
    pub const S3_OUTPUT_SECRET_KEY: &str = "S3_OUTPUT_SECRET_KEY";
    pub const S3_OUTPUT_ARN_ROLE: &str = "S3_OUTPUT_ARN_ROLE";
    pub const S3_OUTPUT_EXT_ID: &str = "S3_OUTPUT_EXT_ID";
    pub const S3_OUTPUT_BASE_PATH: &str = "S3_OUTPUT_BASE_PATH";
    pub const BATCH_JOBS_FILE: &str = "BATCH_JOBS_FILE";
    pub const BATCH_TARGET_QUEUE_SIZE: &str = "BATCH_TARGET_QUEUE_SIZE";
    pub const BATCH_MAX_RETRIES: &str = "BATCH_MAX_RETRIES";
}

/// One named layer of configuration values.
#[derive(Debug, Clone)]
struct ConfigSource {
    name: &'static str,
    values: HashMap<String, String>,
}

/// Resolves named parameters across prioritized sources.
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    sources: Vec<ConfigSource>,
}

impl ConfigProvider {
    /// Build the standard four-layer provider.
    ///
    /// `args` should not include the program name.
    pub fn load<I, S>(args: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let home_file = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(HOME_CONFIG_DIR).join(PROPERTIES_FILE));

        let home_values = match home_file {
            Some(path) => parse_properties_file(&path)?,
            None => HashMap::new(),
        };

        Ok(Self::from_sources(vec![
            ("Command line arguments", parse_cli_arguments(args)),
            (
                "Local properties file",
                parse_properties_file(Path::new(PROPERTIES_FILE))?,
            ),
            ("Environment variables", environment_variables()),
            ("System-wide properties file", home_values),
        ]))
    }

    /// Build a provider from explicit sources, highest priority first.
    pub fn from_sources(sources: Vec<(&'static str, HashMap<String, String>)>) -> Self {
        Self {
            sources: sources
                .into_iter()
                .map(|(name, values)| ConfigSource {
                    name,
                    values: values.into_iter().filter(|(_, v)| !v.is_empty()).collect(),
                })
                .collect(),
        }
    }

    /// Look up any parameter by key, failing if no source defines it.
    pub fn get(&self, key: &str) -> Result<String, CoreError> {
        self.require(key, &format!("Configuration parameter '{key}'"))
    }

    /// Look up a parameter that may legitimately be absent.
    pub fn get_optional(&self, key: &str) -> Option<String> {
        self.lookup(key).map(|(_, value)| value.to_string())
    }

    /// Look up and parse a parameter, falling back to `default` when absent.
    pub fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T, CoreError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.lookup(key) {
            None => Ok(default),
            Some((_, raw)) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| CoreError::InvalidParameter {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    // ---- typed accessors ----

    pub fn api_key(&self) -> Result<String, CoreError> {
        self.require(keys::API_KEY, "Your API key for the encoding service.")
    }

    pub fn api_url(&self) -> String {
        self.get_optional(keys::API_URL)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn tenant_org_id(&self) -> Option<String> {
        self.get_optional(keys::TENANT_ORG_ID)
    }

    pub fn http_input_host(&self) -> Result<String, CoreError> {
        self.require(
            keys::HTTP_INPUT_HOST,
            "Hostname or IP address of the HTTP server hosting your input files, e.g.: my-storage.biz",
        )
    }

    pub fn http_input_file_path(&self) -> Result<String, CoreError> {
        self.require(
            keys::HTTP_INPUT_FILE_PATH,
            "The path to your HTTP input file. Example: videos/1080p_Sintel.mp4",
        )
    }

    pub fn s3_output_bucket_name(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_OUTPUT_BUCKET_NAME,
            "The name of your S3 output bucket. Example: my-bucket-name",
        )
    }

    pub fn s3_output_access_key(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_OUTPUT_ACCESS_KEY,
            "The access key of your S3 output bucket.",
        )
    }

    pub fn s3_output_secret_key(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_OUTPUT_SECRET_KEY,
            "The secret key of your S3 output bucket.",
        )
    }

    pub fn s3_output_arn_role(&self) -> Option<String> {
        self.get_optional(keys::S3_OUTPUT_ARN_ROLE)
    }

    pub fn s3_output_external_id(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_OUTPUT_EXT_ID,
            "The external ID of your S3 role based output bucket.",
        )
    }

    pub fn s3_input_arn_role(&self) -> Option<String> {
        self.get_optional(keys::S3_INPUT_ARN_ROLE)
    }

    pub fn s3_input_bucket_name(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_INPUT_BUCKET_NAME,
            "The name of your S3 input bucket. Example: my-bucket-name",
        )
    }

    pub fn s3_input_external_id(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_INPUT_EXT_ID,
            "The external ID of your S3 role based input bucket.",
        )
    }

    /// Output base path, without a leading slash and with a trailing one.
    pub fn s3_output_base_path(&self) -> Result<String, CoreError> {
        self.require(
            keys::S3_OUTPUT_BASE_PATH,
            "The base path on your S3 output bucket. Example: /outputs",
        )
        .map(|p| normalize_base_path(&p))
    }

    pub fn batch_jobs_file(&self) -> Result<PathBuf, CoreError> {
        self.require(
            keys::BATCH_JOBS_FILE,
            "Path to a JSON file listing the jobs of the batch.",
        )
        .map(PathBuf::from)
    }

    pub fn batch_target_queue_size(&self) -> Result<u32, CoreError> {
        let size = self.get_parsed_or(keys::BATCH_TARGET_QUEUE_SIZE, DEFAULT_TARGET_QUEUE_SIZE)?;
        if size == 0 {
            return Err(CoreError::InvalidParameter {
                key: keys::BATCH_TARGET_QUEUE_SIZE.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(size)
    }

    pub fn batch_max_retries(&self) -> Result<u32, CoreError> {
        self.get_parsed_or(keys::BATCH_MAX_RETRIES, DEFAULT_MAX_RETRIES)
    }

    // ---- private helpers ----

    fn lookup(&self, key: &str) -> Option<(&'static str, &str)> {
        self.sources.iter().find_map(|source| {
            source
                .values
                .get(key)
                .map(|value| (source.name, value.as_str()))
        })
    }

    fn require(&self, key: &str, description: &str) -> Result<String, CoreError> {
        match self.lookup(key) {
            Some((source, value)) => {
                tracing::info!(key, source, "Retrieved configuration parameter");
                Ok(value.to_string())
            }
            None => Err(CoreError::MissingParameter {
                key: key.to_string(),
                description: description.to_string(),
            }),
        }
    }
}

/// Parse `KEY=VALUE` arguments. Arguments without `=` or with an empty
/// value are skipped; only the first `=` separates key from value.
pub fn parse_cli_arguments<I, S>(args: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .filter_map(|arg| {
            let (key, value) = arg.as_ref().split_once('=')?;
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Read a properties file. A missing file yields an empty map.
pub fn parse_properties_file(path: &Path) -> Result<HashMap<String, String>, CoreError> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => {
            return Err(CoreError::ConfigFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| CoreError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !value.is_empty() {
            values.insert(key, value);
        }
    }
    Ok(values)
}

fn environment_variables() -> HashMap<String, String> {
    std::env::vars().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
