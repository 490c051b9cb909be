//! Pure Rust normalizer built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` (quality stepped down to fit budget) |
//! | Encode PNG | `image::codecs::png::PngEncoder` (dimensions shrunk to fit budget) |
//!
//! JPEG stays JPEG and PNG stays PNG. Any other decodable image is written
//! as PNG and its filename extension is swapped to match.
//!
//! A file that already fits both the edge limit and the size budget is
//! returned byte-for-byte, so re-dropping a normalized file is a no-op.

use super::calculations::{fit_within, shrink_step};
use super::params::{NormalizeOptions, Quality};
use super::transformer::{Constraints, Dimensions, NormalizedFile, TransformError, Transformer};
use crate::candidate::RawCandidate;
use crate::naming::strip_file_extension;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::sync::Arc;
use tracing::{debug, trace};

/// Quality decrement per size-budget retry.
const QUALITY_STEP: u8 = 10;
/// JPEG quality is never pushed below this.
const MIN_QUALITY: u8 = 10;
/// Edge scale factor per size-budget retry once quality is exhausted.
const SHRINK_FACTOR: f64 = 0.8;
/// Upper bound on encode attempts for one file.
const MAX_ROUNDS: usize = 16;

/// Formats this build can decode, keyed by MIME type.
const DECODABLE: &[(&str, ImageFormat)] = &[
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/png", ImageFormat::Png),
    ("image/webp", ImageFormat::WebP),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTransformer;

impl ImageTransformer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transformer for ImageTransformer {
    async fn normalize(
        &self,
        candidate: &RawCandidate,
        constraints: &Constraints,
    ) -> Result<NormalizedFile, TransformError> {
        let opts = NormalizeOptions::from_map(&constraints.options, constraints.max_dimension);
        let candidate = candidate.clone();
        tokio::task::spawn_blocking(move || normalize_blocking(&candidate, &opts))
            .await
            .map_err(|e| TransformError::Worker(e.to_string()))?
    }
}

/// Resolve the input format: declared MIME type first, content sniffing second.
fn input_format(candidate: &RawCandidate) -> Result<ImageFormat, TransformError> {
    let mime = candidate.mime_type.to_ascii_lowercase();
    if let Some((_, fmt)) = DECODABLE.iter().find(|(m, _)| *m == mime) {
        return Ok(*fmt);
    }
    match image::guess_format(&candidate.bytes) {
        Ok(fmt) if DECODABLE.iter().any(|(_, f)| *f == fmt) => Ok(fmt),
        Ok(fmt) => Err(TransformError::Decode(format!(
            "no decoder for {fmt:?} ({})",
            candidate.filename
        ))),
        Err(_) => Err(TransformError::NotAnImage(candidate.filename.clone())),
    }
}

/// Synchronous normalization. Runs on the blocking pool.
pub fn normalize_blocking(
    candidate: &RawCandidate,
    opts: &NormalizeOptions,
) -> Result<NormalizedFile, TransformError> {
    let format = input_format(candidate)?;
    let img = image::load_from_memory_with_format(&candidate.bytes, format)
        .map_err(|e| TransformError::Decode(format!("{}: {e}", candidate.filename)))?;

    let original = (img.width(), img.height());
    let target = fit_within(original, opts.max_edge);
    let output_format = match format {
        ImageFormat::Jpeg => ImageFormat::Jpeg,
        _ => ImageFormat::Png,
    };

    if target == original && candidate.len() <= opts.max_bytes && output_format == format {
        trace!(filename = %candidate.filename, "already within limits");
        return Ok(NormalizedFile {
            filename: candidate.filename.clone(),
            mime_type: mime_for(format).to_string(),
            bytes: Arc::clone(&candidate.bytes),
            dimensions: Some(Dimensions {
                width: original.0,
                height: original.1,
            }),
        });
    }

    let mut img = if target != original {
        img.resize_exact(target.0, target.1, FilterType::Lanczos3)
    } else {
        img
    };
    let mut quality = opts.quality;
    let mut bytes = encode(&img, output_format, quality)?;

    for _ in 0..MAX_ROUNDS {
        if bytes.len() <= opts.max_bytes {
            break;
        }
        let lower = match output_format {
            ImageFormat::Jpeg => quality.step_down(QUALITY_STEP, MIN_QUALITY),
            _ => None,
        };
        match (lower, shrink_step((img.width(), img.height()), SHRINK_FACTOR)) {
            (Some(lower), _) => quality = lower,
            (None, Some((w, h))) => img = img.resize_exact(w, h, FilterType::Lanczos3),
            (None, None) => break,
        }
        bytes = encode(&img, output_format, quality)?;
    }

    debug!(
        filename = %candidate.filename,
        from = candidate.len(),
        to = bytes.len(),
        width = img.width(),
        height = img.height(),
        quality = quality.value(),
        "normalized"
    );

    Ok(NormalizedFile {
        filename: output_filename(&candidate.filename, format, output_format),
        mime_type: mime_for(output_format).to_string(),
        bytes: bytes.into(),
        dimensions: Some(Dimensions {
            width: img.width(),
            height: img.height(),
        }),
    })
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>, TransformError> {
    let mut buf = Vec::new();
    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.value()))
        }
        _ => img.write_with_encoder(PngEncoder::new(&mut buf)),
    };
    result.map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(buf)
}

fn mime_for(format: ImageFormat) -> &'static str {
    DECODABLE
        .iter()
        .find(|(_, f)| *f == format)
        .map(|(m, _)| *m)
        .unwrap_or("application/octet-stream")
}

fn output_filename(filename: &str, input: ImageFormat, output: ImageFormat) -> String {
    if input == output {
        filename.to_string()
    } else {
        format!("{}.png", strip_file_extension(filename))
    }
}
