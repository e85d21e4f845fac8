/// Identifier assigned by the remote encoding service to any created
/// resource (input, output, codec configuration, encoding, ...).
pub type ResourceId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
