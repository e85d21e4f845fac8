use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing configuration parameter {key} - {description}")]
    MissingParameter {
        key: String,
        description: String,
    },

    #[error("Invalid configuration parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Failed to read {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Failed to load job list from {}: {reason}", path.display())]
    JobList { path: PathBuf, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}
