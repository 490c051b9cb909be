//! Normalization: the Transformer seam and its `image`-crate implementation.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::into_dimensions` |
//! | **Fit** | [`fit_within`] longer-edge calculation |
//! | **Resize** | Lanczos3 via `DynamicImage::resize_exact` |
//! | **Encode** | JPEG (quality stepping) / PNG (dimension stepping) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and budget math (unit testable)
//! - **Parameters**: The normalizer's reading of the opaque option map
//! - **Transformer**: [`Transformer`] trait, result types, pass-through
//! - **Image transformer**: [`ImageTransformer`], the production normalizer

mod calculations;
pub mod image_transformer;
mod params;
pub mod transformer;

pub use calculations::fit_within;
pub use image_transformer::ImageTransformer;
pub use params::{NormalizeOptions, Quality};
pub use transformer::{
    Constraints, Dimensions, NormalizedFile, TransformError, Transformer,
    normalize_or_pass_through,
};
