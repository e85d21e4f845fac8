//! Multi-codec flow: three independent encodings of the same input, each
//! with its own codecs, muxings and default DASH and HLS manifests.
//!
//! The encodings are configured sequentially and then executed
//! concurrently with [`execute_all`](batchenc_encoding::execute::execute_all).

use batchenc_core::paths::join_output_path;
use batchenc_core::types::ResourceId;
use batchenc_encoding::error::ApiError;
use batchenc_encoding::execute::EncodingRun;
use batchenc_encoding::models::{
    CodecConfig, DefaultManifest, EncodingOutput, MuxingKind, MuxingRequest,
    StartEncodingRequest, StreamRequest,
};
use batchenc_encoding::service::EncodingService;

/// One muxing of a plan: which codec's stream, the container, and the
/// segment directory below the plan's output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct MuxingPlan {
    pub codec: usize,
    pub kind: MuxingKind,
    pub segments_path: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodingPlan {
    pub name: &'static str,
    pub description: &'static str,
    /// Directory below the output base path; manifests are written here.
    pub output_dir: &'static str,
    pub codecs: Vec<CodecConfig>,
    pub muxings: Vec<MuxingPlan>,
}

fn muxing(codec: usize, kind: MuxingKind, segments_path: &'static str) -> MuxingPlan {
    MuxingPlan {
        codec,
        kind,
        segments_path,
    }
}

/// H.264 and AAC, H.265 alone, VP9 and Vorbis.
pub fn encoding_plans() -> Vec<EncodingPlan> {
    vec![
        EncodingPlan {
            name: "H.264 Encoding",
            description: "H.264 -> TS and CMAF muxings, AAC -> fMP4 and TS muxings",
            output_dir: "h264",
            codecs: vec![
                CodecConfig::h264(1080, 1_500_000),
                CodecConfig::aac(128_000),
            ],
            muxings: vec![
                muxing(0, MuxingKind::Ts, "video/h264/ts"),
                muxing(0, MuxingKind::Cmaf, "video/h264/cmaf"),
                muxing(1, MuxingKind::Fmp4, "audio/aac/fmp4"),
                muxing(1, MuxingKind::Ts, "audio/aac/ts"),
            ],
        },
        EncodingPlan {
            name: "H.265 Encoding",
            description: "H.265 -> fMP4 muxing",
            output_dir: "h265",
            codecs: vec![CodecConfig::h265(1080, 1_500_000)],
            muxings: vec![muxing(0, MuxingKind::Fmp4, "video/h265/fmp4")],
        },
        EncodingPlan {
            name: "VP9/Vorbis Encoding",
            description: "VP9 -> WebM muxing, Vorbis -> WebM muxing",
            output_dir: "vp9",
            codecs: vec![CodecConfig::vp9(1080, 1_500_000), CodecConfig::vorbis(128_000)],
            muxings: vec![
                muxing(0, MuxingKind::Webm, "video/vp9/webm"),
                muxing(1, MuxingKind::Webm, "audio/vorbis/webm"),
            ],
        },
    ]
}

/// Resources shared by every plan.
#[derive(Debug, Clone)]
pub struct SharedResources {
    pub input_id: ResourceId,
    pub input_path: String,
    pub output_id: ResourceId,
    /// Normalized output base path.
    pub output_base_path: String,
}

/// Create the encoding of `plan` with its streams, muxings and default
/// manifests. The returned run starts the encoding with both manifests.
pub async fn configure_plan<S: EncodingService + ?Sized>(
    service: &S,
    plan: &EncodingPlan,
    shared: &SharedResources,
) -> Result<EncodingRun, ApiError> {
    let encoding_id = service
        .create_encoding(plan.name, Some(plan.description))
        .await?;

    let mut stream_ids = Vec::with_capacity(plan.codecs.len());
    for codec in &plan.codecs {
        let codec_config_id = service.create_codec_config(codec).await?;
        let stream_id = service
            .create_stream(
                &encoding_id,
                &StreamRequest {
                    codec_config_id,
                    input_id: shared.input_id.clone(),
                    input_path: shared.input_path.clone(),
                },
            )
            .await?;
        stream_ids.push(stream_id);
    }

    for m in &plan.muxings {
        let path = join_output_path(&[
            shared.output_base_path.as_str(),
            plan.output_dir,
            m.segments_path,
        ]);
        let output = EncodingOutput::public_read(shared.output_id.clone(), path);
        service
            .create_muxing(
                &encoding_id,
                &MuxingRequest::new(m.kind, stream_ids[m.codec].clone(), output),
            )
            .await?;
    }

    let manifest_output = || {
        EncodingOutput::public_read(
            shared.output_id.clone(),
            join_output_path(&[shared.output_base_path.as_str(), plan.output_dir]),
        )
    };
    let dash_id = service
        .create_default_manifest(&DefaultManifest::dash(
            encoding_id.clone(),
            manifest_output(),
        ))
        .await?;
    let hls_id = service
        .create_default_manifest(&DefaultManifest::hls(
            encoding_id.clone(),
            manifest_output(),
        ))
        .await?;

    tracing::info!(
        encoding_id = %encoding_id,
        plan = plan.name,
        streams = stream_ids.len(),
        muxings = plan.muxings.len(),
        "Encoding configured",
    );

    Ok(EncodingRun {
        encoding_id,
        request: StartEncodingRequest::with_manifests(vec![dash_id], vec![hls_id]),
    })
}
