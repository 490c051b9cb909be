//! The normalization seam and shared result types.
//!
//! The [`Transformer`] trait is the one operation the intake controller needs
//! from an image pipeline: take a raw candidate and the configured
//! constraints, produce a [`NormalizedFile`] or a [`TransformError`].
//!
//! The production implementation is
//! [`ImageTransformer`](super::image_transformer::ImageTransformer). Tests use
//! the scripted `MockTransformer` in this module's test submodule.
//!
//! Implementations must be `Send + Sync`: the controller shares one instance
//! across every per-candidate task of a batch.

use crate::candidate::RawCandidate;
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("not an image: {0}")]
    NotAnImage(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("normalization worker failed: {0}")]
    Worker(String),
}

/// Pixel dimensions of a normalized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// What the normalizer is allowed to do to a candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub max_dimension: u32,
    /// Opaque to the controller; see [`NormalizeOptions`](super::NormalizeOptions).
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Normalized output of one candidate.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    pub dimensions: Option<Dimensions>,
}

impl NormalizedFile {
    /// Wrap the raw bytes unchanged.
    pub fn pass_through(candidate: &RawCandidate) -> Self {
        Self {
            filename: candidate.filename.clone(),
            mime_type: candidate.mime_type.clone(),
            bytes: Arc::clone(&candidate.bytes),
            dimensions: probe_dimensions(&candidate.bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for NormalizedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedFile")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

/// Read image dimensions from the header only. `None` for non-images.
pub fn probe_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some(Dimensions { width, height })
}

/// Asynchronous, stateless normalization of one candidate.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn normalize(
        &self,
        candidate: &RawCandidate,
        constraints: &Constraints,
    ) -> Result<NormalizedFile, TransformError>;
}

/// Normalize one candidate, or pass it through untouched when normalization
/// is disabled. The transformer is not consulted in the second case.
pub async fn normalize_or_pass_through(
    transformer: &dyn Transformer,
    candidate: &RawCandidate,
    constraints: &Constraints,
    enabled: bool,
) -> Result<NormalizedFile, TransformError> {
    if enabled {
        transformer.normalize(candidate, constraints).await
    } else {
        Ok(NormalizedFile::pass_through(candidate))
    }
}
