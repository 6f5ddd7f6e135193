use std::io::Cursor;

use bytes::Bytes;
use figmant_core::ProcessingInfo;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

/// Limits applied to image payloads before upload.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    /// Images wider or taller than this are downscaled to fit.
    pub max_dimension: u32,
    /// Payloads above this many bytes are re-encoded as JPEG.
    pub recompress_above_bytes: u64,
    pub jpeg_quality: u8,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_dimension: 4096,
            recompress_above_bytes: 2 * 1024 * 1024,
            jpeg_quality: 80,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("empty image payload")]
    Empty,

    #[error("unreadable image: {0}")]
    Undecodable(String),

    #[error("re-encode failed: {0}")]
    Encode(String),
}

/// Output of the image processing stage: the (possibly transformed) payload
/// plus metadata for the ledger record.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub data: Bytes,
    pub info: ProcessingInfo,
}

/// Validate and, where the policy calls for it, downscale and recompress an
/// image payload. Non-image attachments never reach this function.
///
/// CPU-bound; the ingestor runs it under `spawn_blocking`.
pub fn process_image(data: &Bytes, policy: &ImagePolicy) -> Result<ProcessedImage, ProcessError> {
    if data.is_empty() {
        return Err(ProcessError::Empty);
    }

    let source_format = image::guess_format(data)
        .map(|f| f.extensions_str().first().copied().unwrap_or("unknown"))
        .map_err(|e| ProcessError::Undecodable(e.to_string()))?;

    let img = image::load_from_memory(data)
        .map_err(|e| ProcessError::Undecodable(e.to_string()))?;
    let (orig_w, orig_h) = img.dimensions();

    let needs_resize = orig_w.max(orig_h) > policy.max_dimension;
    let needs_recompress = data.len() as u64 > policy.recompress_above_bytes;

    if !needs_resize && !needs_recompress {
        return Ok(ProcessedImage {
            data: data.clone(),
            info: ProcessingInfo {
                original_bytes: data.len() as u64,
                processed_bytes: data.len() as u64,
                width: orig_w,
                height: orig_h,
                source_format: source_format.to_string(),
                recompressed: false,
            },
        });
    }

    let img = if needs_resize {
        img.resize(policy.max_dimension, policy.max_dimension, FilterType::Triangle)
    } else {
        img
    };
    let (width, height) = img.dimensions();

    let encoded = encode_jpeg(&img, policy.jpeg_quality)?;

    Ok(ProcessedImage {
        info: ProcessingInfo {
            original_bytes: data.len() as u64,
            processed_bytes: encoded.len() as u64,
            width,
            height,
            source_format: source_format.to_string(),
            recompressed: true,
        },
        data: Bytes::from(encoded),
    })
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessError> {
    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ProcessError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
