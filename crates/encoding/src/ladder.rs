//! Rendition ladders: configuring a complete encoding from a template.
//!
//! An [`EncodingTemplate`] holds the ids of resources shared by every
//! encoding of a batch (input, output, codec configurations).
//! [`EncodingTemplate::configure_encoding`] gives an encoding a stream and
//! a muxing per rendition.

use batchenc_core::paths::join_output_path;
use batchenc_core::types::ResourceId;

use crate::error::ApiError;
use crate::models::{CodecConfig, EncodingOutput, MuxingKind, MuxingRequest, StreamRequest};
use crate::service::EncodingService;

/// The ladder used by batch encodings: three H.264 renditions and AAC audio.
pub fn default_ladder() -> Vec<CodecConfig> {
    vec![
        CodecConfig::h264(480, 800_000),
        CodecConfig::h264(720, 1_200_000),
        CodecConfig::h264(1080, 2_000_000),
        CodecConfig::aac(128_000),
    ]
}

/// A codec configuration that already exists on the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub codec_config_id: ResourceId,
    pub codec: CodecConfig,
}

#[derive(Debug, Clone)]
pub struct EncodingTemplate {
    pub input_id: ResourceId,
    pub output_id: ResourceId,
    /// Normalized output base path (no leading slash, trailing slash).
    pub output_base_path: String,
    pub renditions: Vec<Rendition>,
    pub muxing: MuxingKind,
}

impl EncodingTemplate {
    /// Create the codec configurations for `codecs` and build a template
    /// around them.
    pub async fn create<S: EncodingService + ?Sized>(
        service: &S,
        input_id: ResourceId,
        output_id: ResourceId,
        output_base_path: String,
        codecs: Vec<CodecConfig>,
        muxing: MuxingKind,
    ) -> Result<Self, ApiError> {
        let mut renditions = Vec::with_capacity(codecs.len());
        for codec in codecs {
            let codec_config_id = service.create_codec_config(&codec).await?;
            tracing::info!(
                codec = codec.name(),
                codec_config_id = %codec_config_id,
                "Codec configuration created",
            );
            renditions.push(Rendition {
                codec_config_id,
                codec,
            });
        }

        Ok(Self {
            input_id,
            output_id,
            output_base_path,
            renditions,
            muxing,
        })
    }

    /// Full output path of one rendition of a job.
    pub fn muxing_output_path(&self, job_output_path: &str, codec: &CodecConfig) -> String {
        join_output_path(&[
            self.output_base_path.as_str(),
            job_output_path,
            codec.segment_dir().as_str(),
        ])
    }

    /// Add a stream and a muxing per rendition to an existing encoding.
    pub async fn configure_encoding<S: EncodingService + ?Sized>(
        &self,
        service: &S,
        encoding_id: &str,
        input_path: &str,
        output_path: &str,
    ) -> Result<(), ApiError> {
        for rendition in &self.renditions {
            let stream_id = service
                .create_stream(
                    encoding_id,
                    &StreamRequest {
                        codec_config_id: rendition.codec_config_id.clone(),
                        input_id: self.input_id.clone(),
                        input_path: input_path.to_string(),
                    },
                )
                .await?;

            let output = EncodingOutput::public_read(
                self.output_id.clone(),
                self.muxing_output_path(output_path, &rendition.codec),
            );
            service
                .create_muxing(
                    encoding_id,
                    &MuxingRequest::new(self.muxing, stream_id, output),
                )
                .await?;
        }

        tracing::info!(
            encoding_id,
            renditions = self.renditions.len(),
            "Encoding configured",
        );
        Ok(())
    }
}
