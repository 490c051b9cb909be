//! Parameter types for normalization.
//!
//! The controller forwards `normalize.options` as an opaque JSON map. These
//! types are where the image normalizer gives that map meaning:
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`NormalizeOptions`]: Resolved longer-edge limit, size budget, and starting quality.
//!
//! Recognised option keys:
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | `max_size_mb` | number | `1.0` |
//! | `max_width_or_height` | integer | `max_dimension` from config |
//! | `quality` | integer 1–100 | `90` |
//!
//! Unknown keys and values of the wrong type are ignored.

use super::calculations::size_budget_bytes;
use tracing::debug;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Next lower quality for a size-budget retry, or `None` at the floor.
    pub fn step_down(self, step: u8, floor: u8) -> Option<Self> {
        let next = self.0.saturating_sub(step);
        (next >= floor && next < self.0).then_some(Self(next))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Default size budget, in MiB.
pub const DEFAULT_MAX_SIZE_MB: f64 = 1.0;

/// Options resolved from the opaque map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    /// Longer-edge limit in pixels.
    pub max_edge: u32,
    /// Output size budget in bytes.
    pub max_bytes: usize,
    /// Starting JPEG quality.
    pub quality: Quality,
}

impl NormalizeOptions {
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>, max_dimension: u32) -> Self {
        let mut opts = Self {
            max_edge: max_dimension,
            max_bytes: size_budget_bytes(DEFAULT_MAX_SIZE_MB),
            quality: Quality::default(),
        };

        for (key, value) in map {
            match (key.as_str(), value) {
                ("max_size_mb", v) if v.is_number() => {
                    if let Some(mb) = v.as_f64() {
                        opts.max_bytes = size_budget_bytes(mb);
                    }
                }
                ("max_width_or_height", v) => {
                    if let Some(edge) = v.as_u64().filter(|&e| e > 0) {
                        opts.max_edge = u32::try_from(edge).unwrap_or(u32::MAX);
                    }
                }
                ("quality", v) => {
                    if let Some(q) = v.as_u64() {
                        opts.quality = Quality::new(u32::try_from(q).unwrap_or(100));
                    }
                }
                (other, _) => debug!(option = other, "ignoring unrecognised normalize option"),
            }
        }
        opts
    }
}
