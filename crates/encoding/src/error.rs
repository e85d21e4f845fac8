//! Errors from the encoding service client layer.

/// Error code the service returns when the platform limit for queued
/// encodings has been reached.
pub const QUEUE_LIMIT_EXCEEDED: i64 = 8004;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Encoding API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Service-specific error code, when the body carried one.
        code: Option<i64>,
        /// Developer message from the error body, or the raw body.
        message: String,
    },

    /// The client could not be built from the supplied settings.
    #[error("Invalid client configuration: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Service-specific error code, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether this is the transient "queue limit exceeded" signal.
    pub fn is_queue_limit_exceeded(&self) -> bool {
        self.code() == Some(QUEUE_LIMIT_EXCEEDED)
    }
}
