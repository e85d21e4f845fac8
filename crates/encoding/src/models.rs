//! Typed request and response models for the encoding service.
//!
//! Resource families that the service models as class hierarchies
//! (inputs, outputs, codec configurations, muxings, manifests) are closed
//! enums here. Each variant knows its creation endpoint and renders its
//! own JSON body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use batchenc_core::types::ResourceId;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Successful responses wrap the payload as `{ "data": { "result": ... } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseEnvelope<T> {
    pub data: ResponseData<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseData<T> {
    pub result: T,
}

/// Error responses carry `{ "data": { "code", "message", "developerMessage" } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub data: ErrorData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorData {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub developer_message: Option<String>,
}

/// Minimal view of any created resource.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedResource {
    pub id: ResourceId,
}

/// Paged list response; only the total count is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse {
    pub total_count: Option<u64>,
    #[serde(default)]
    pub items: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Storage the service reads input files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputConfig {
    Http {
        host: String,
    },
    S3RoleBased {
        bucket_name: String,
        role_arn: String,
        external_id: String,
    },
}

impl InputConfig {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Http { .. } => "encoding/inputs/http",
            Self::S3RoleBased { .. } => "encoding/inputs/s3-role-based",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::Http { host } => json!({ "host": host }),
            Self::S3RoleBased {
                bucket_name,
                role_arn,
                external_id,
            } => json!({
                "bucketName": bucket_name,
                "roleArn": role_arn,
                "externalId": external_id,
            }),
        }
    }
}

/// Storage the service writes encoded content to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputConfig {
    S3 {
        bucket_name: String,
        access_key: String,
        secret_key: String,
    },
    S3RoleBased {
        bucket_name: String,
        role_arn: String,
        external_id: String,
    },
}

impl OutputConfig {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "encoding/outputs/s3",
            Self::S3RoleBased { .. } => "encoding/outputs/s3-role-based",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::S3 {
                bucket_name,
                access_key,
                secret_key,
            } => json!({
                "bucketName": bucket_name,
                "accessKey": access_key,
                "secretKey": secret_key,
            }),
            Self::S3RoleBased {
                bucket_name,
                role_arn,
                external_id,
            } => json!({
                "bucketName": bucket_name,
                "roleArn": role_arn,
                "externalId": external_id,
            }),
        }
    }
}

/// Where a muxing or manifest writes its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingOutput {
    pub output_id: ResourceId,
    pub output_path: String,
    pub acl: Vec<AclEntry>,
}

impl EncodingOutput {
    /// Output whose files are publicly readable over HTTP.
    pub fn public_read(output_id: impl Into<ResourceId>, output_path: impl Into<String>) -> Self {
        Self {
            output_id: output_id.into(),
            output_path: output_path.into(),
            acl: vec![AclEntry {
                permission: AclPermission::PublicRead,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AclEntry {
    pub permission: AclPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclPermission {
    PublicRead,
}

// ---------------------------------------------------------------------------
// Codec configurations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresetConfiguration {
    VodStandard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCodec {
    pub name: String,
    pub preset: PresetConfiguration,
    /// Output height; width follows the input aspect ratio.
    pub height: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCodec {
    pub name: String,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
}

/// A codec configuration to create on the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecConfig {
    H264Video(VideoCodec),
    H265Video(VideoCodec),
    Vp9Video(VideoCodec),
    AacAudio(AudioCodec),
    VorbisAudio(AudioCodec),
}

impl CodecConfig {
    pub fn h264(height: u32, bitrate: u64) -> Self {
        Self::H264Video(VideoCodec {
            name: format!("H.264 {height}p"),
            preset: PresetConfiguration::VodStandard,
            height,
            bitrate,
        })
    }

    pub fn h265(height: u32, bitrate: u64) -> Self {
        Self::H265Video(VideoCodec {
            name: format!("H.265 {height}p"),
            preset: PresetConfiguration::VodStandard,
            height,
            bitrate,
        })
    }

    pub fn vp9(height: u32, bitrate: u64) -> Self {
        Self::Vp9Video(VideoCodec {
            name: format!("VP9 {height}p"),
            preset: PresetConfiguration::VodStandard,
            height,
            bitrate,
        })
    }

    pub fn aac(bitrate: u64) -> Self {
        Self::AacAudio(AudioCodec {
            name: format!("AAC {} kbit/s", bitrate / 1000),
            bitrate,
        })
    }

    pub fn vorbis(bitrate: u64) -> Self {
        Self::VorbisAudio(AudioCodec {
            name: format!("Vorbis {} kbit/s", bitrate / 1000),
            bitrate,
        })
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::H264Video(_) => "encoding/configurations/video/h264",
            Self::H265Video(_) => "encoding/configurations/video/h265",
            Self::Vp9Video(_) => "encoding/configurations/video/vp9",
            Self::AacAudio(_) => "encoding/configurations/audio/aac",
            Self::VorbisAudio(_) => "encoding/configurations/audio/vorbis",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::H264Video(v) | Self::H265Video(v) | Self::Vp9Video(v) => &v.name,
            Self::AacAudio(a) | Self::VorbisAudio(a) => &a.name,
        }
    }

    /// Default segment directory: `video/<height>` or `audio/<kbit/s>`.
    pub fn segment_dir(&self) -> String {
        match self {
            Self::H264Video(v) | Self::H265Video(v) | Self::Vp9Video(v) => {
                format!("video/{}", v.height)
            }
            Self::AacAudio(a) | Self::VorbisAudio(a) => format!("audio/{}", a.bitrate / 1000),
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::H264Video(v) | Self::H265Video(v) | Self::Vp9Video(v) => json!({
                "name": v.name,
                "presetConfiguration": v.preset,
                "height": v.height,
                "bitrate": v.bitrate,
            }),
            Self::AacAudio(a) | Self::VorbisAudio(a) => json!({
                "name": a.name,
                "bitrate": a.bitrate,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Streams and muxings
// ---------------------------------------------------------------------------

/// Binds an input file to a codec configuration inside an encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub codec_config_id: ResourceId,
    pub input_id: ResourceId,
    pub input_path: String,
}

impl StreamRequest {
    pub fn body(&self) -> Value {
        json!({
            "codecConfigId": self.codec_config_id,
            "inputStreams": [{
                "inputId": self.input_id,
                "inputPath": self.input_path,
                "selectionMode": "AUTO",
            }],
        })
    }
}

/// Default segment length for segmented muxings, in seconds.
pub const DEFAULT_SEGMENT_LENGTH: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxingKind {
    Fmp4,
    Ts,
    Cmaf,
    Webm,
}

impl MuxingKind {
    fn path_segment(self) -> &'static str {
        match self {
            Self::Fmp4 => "fmp4",
            Self::Ts => "ts",
            Self::Cmaf => "cmaf",
            Self::Webm => "webm",
        }
    }
}

/// A segmented muxing of one or more streams.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxingRequest {
    pub kind: MuxingKind,
    pub stream_ids: Vec<ResourceId>,
    pub outputs: Vec<EncodingOutput>,
    pub segment_length: f64,
}

impl MuxingRequest {
    pub fn new(kind: MuxingKind, stream_id: impl Into<ResourceId>, output: EncodingOutput) -> Self {
        Self {
            kind,
            stream_ids: vec![stream_id.into()],
            outputs: vec![output],
            segment_length: DEFAULT_SEGMENT_LENGTH,
        }
    }

    pub fn endpoint(&self, encoding_id: &str) -> String {
        format!(
            "encoding/encodings/{encoding_id}/muxings/{}",
            self.kind.path_segment()
        )
    }

    pub fn body(&self) -> Value {
        let streams: Vec<Value> = self
            .stream_ids
            .iter()
            .map(|id| json!({ "streamId": id }))
            .collect();
        json!({
            "streams": streams,
            "outputs": self.outputs,
            "segmentLength": self.segment_length,
        })
    }
}

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

/// A default manifest generated from all muxings of one encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultManifest {
    Dash {
        encoding_id: ResourceId,
        manifest_name: String,
        outputs: Vec<EncodingOutput>,
    },
    Hls {
        encoding_id: ResourceId,
        manifest_name: String,
        outputs: Vec<EncodingOutput>,
    },
}

impl DefaultManifest {
    pub fn dash(encoding_id: impl Into<ResourceId>, output: EncodingOutput) -> Self {
        Self::Dash {
            encoding_id: encoding_id.into(),
            manifest_name: "stream.mpd".to_string(),
            outputs: vec![output],
        }
    }

    pub fn hls(encoding_id: impl Into<ResourceId>, output: EncodingOutput) -> Self {
        Self::Hls {
            encoding_id: encoding_id.into(),
            manifest_name: "master.m3u8".to_string(),
            outputs: vec![output],
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Dash { .. } => "encoding/manifests/dash/default",
            Self::Hls { .. } => "encoding/manifests/hls/default",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::Dash {
                encoding_id,
                manifest_name,
                outputs,
            }
            | Self::Hls {
                encoding_id,
                manifest_name,
                outputs,
            } => json!({
                "encodingId": encoding_id,
                "manifestName": manifest_name,
                "outputs": outputs,
                "version": "V1",
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Start request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManifestGenerator {
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResource {
    pub manifest_id: ResourceId,
}

/// Body of the start call. The empty request starts without manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEncodingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_generator: Option<ManifestGenerator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vod_dash_manifests: Vec<ManifestResource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vod_hls_manifests: Vec<ManifestResource>,
}

impl StartEncodingRequest {
    /// Start request that generates the given manifests once the
    /// encoding has finished.
    pub fn with_manifests(dash_ids: Vec<ResourceId>, hls_ids: Vec<ResourceId>) -> Self {
        Self {
            manifest_generator: Some(ManifestGenerator::V2),
            vod_dash_manifests: dash_ids
                .into_iter()
                .map(|manifest_id| ManifestResource { manifest_id })
                .collect(),
            vod_hls_manifests: hls_ids
                .into_iter()
                .map(|manifest_id| ManifestResource { manifest_id })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Remote task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Created,
    Queued,
    Running,
    Finished,
    Error,
    TransferError,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
            Self::TransferError => "TRANSFER_ERROR",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Finished | Self::Error | Self::TransferError | Self::Canceled
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::TransferError)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetryHint {
    Retry,
    NoRetry,
    #[default]
    #[serde(other)]
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Debug,
    Trace,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub code: Option<i64>,
    #[serde(default)]
    pub retry_hint: RetryHint,
}

/// Status of an encoding as reported by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub status: Status,
    pub progress: Option<f64>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub error: Option<ErrorDetails>,
}

impl Task {
    /// A failed task is retryable when it carries error details whose
    /// retry hint does not forbid retrying.
    pub fn is_retryable_error(&self) -> bool {
        self.status.is_failure()
            && self
                .error
                .as_ref()
                .is_some_and(|e| e.retry_hint != RetryHint::NoRetry)
    }

    /// Service error code of a failed task.
    pub fn error_code(&self) -> Option<i64> {
        self.error.as_ref().and_then(|e| e.code)
    }

    /// Texts of all messages of type `ERROR`, in order.
    pub fn error_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.message_type == MessageType::Error)
            .map(|m| m.text.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
