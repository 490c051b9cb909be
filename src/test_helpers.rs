//! Shared test utilities for the simple-drop test suite.
//!
//! Provides in-memory image encoders, candidate and item builders, and a
//! recording change sink.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let registry = PreviewRegistry::new();
//! let item = file_item(&registry, "A");
//! assert_eq!(item.normalized.filename, "A.png");
//!
//! let sink = RecordingSink::default();
//! sink.on_change(Snapshot::Many(vec![item.view()]));
//! assert_eq!(sink.calls().len(), 1);
//! ```

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

use crate::candidate::RawCandidate;
use crate::collection::FileItem;
use crate::handle::PreviewRegistry;
use crate::imaging::NormalizedFile;
use crate::intake::{ChangeSink, Snapshot};

// =========================================================================
// Image bytes
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Random-looking pixels, so JPEG size tracks quality.
fn noise(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_f491;
    ImageBuffer::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [a, b, c, _] = state.to_le_bytes();
        Rgb([a, b, c])
    })
}

fn encode_jpeg(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 95))
        .unwrap();
    buf
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_jpeg(&gradient(width, height))
}

pub fn noisy_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_jpeg(&noise(width, height))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    gradient(width, height)
        .write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        .unwrap();
    buf
}

// =========================================================================
// Candidates and items
// =========================================================================

/// A candidate carrying a tiny valid PNG, whatever its claimed type.
pub fn candidate(filename: &str, mime_type: &str) -> RawCandidate {
    RawCandidate::new(filename, mime_type, png_bytes(2, 2))
}

/// One PNG candidate per filename, in order.
pub fn batch(filenames: &[&str]) -> Vec<RawCandidate> {
    filenames
        .iter()
        .map(|name| candidate(name, "image/png"))
        .collect()
}

/// An accepted item with id `id` wrapping `<id>.png`.
pub fn file_item(registry: &PreviewRegistry, id: &str) -> FileItem {
    let raw = candidate(&format!("{id}.png"), "image/png");
    let normalized = NormalizedFile::pass_through(&raw);
    let handle = registry.acquire(Arc::clone(&normalized.bytes));
    FileItem::new(id.to_string(), raw, normalized, handle)
}

// =========================================================================
// Sinks
// =========================================================================

/// Change sink that keeps every snapshot it receives.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<Snapshot>>,
}

impl RecordingSink {
    pub fn calls(&self) -> Vec<Snapshot> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChangeSink for RecordingSink {
    fn on_change(&self, snapshot: Snapshot) {
        self.calls.lock().unwrap().push(snapshot);
    }
}
