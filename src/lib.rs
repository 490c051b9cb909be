//! # Simple Drop
//!
//! Drop-zone intake for small batches of image files. A batch of candidates
//! (one drop or file-picker selection) is checked against an accepted-types
//! policy and an item limit, accepted images are normalized concurrently, and
//! the results land in an ordered collection the user can rearrange.
//!
//! # Architecture: Classify, Normalize, Merge
//!
//! Every batch goes through three steps inside [`intake::IntakeController`]:
//!
//! ```text
//! 1. Classify   candidates  →  accepted + rejected   (pure, no I/O)
//! 2. Normalize  accepted    →  normalized files      (concurrent, bounded)
//! 3. Merge      normalized  →  collection + ledger   (one lock, one notify)
//! ```
//!
//! Classification is a pure function of the config, the batch, and the number
//! of occupied slots, so type and capacity rules are tested without images.
//! Normalization sits behind the [`imaging::Transformer`] trait, so the
//! controller is tested against a scripted mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `drop.toml` loading, stock defaults, validation |
//! | [`candidate`] | Raw dropped files: bytes, filename, sniffed MIME type |
//! | [`validate`] | Type and capacity classification of a batch |
//! | [`imaging`] | Resize and recompress into the configured limits |
//! | [`handle`] | Preview handles with exactly-once release |
//! | [`collection`] | The ordered list of accepted items and its reorder rules |
//! | [`ledger`] | Rejected candidates and their reasons |
//! | [`drag`] | Drag-to-reorder gesture state machine |
//! | [`intake`] | The controller tying it together, change notification |
//! | [`naming`] | Extension handling, item ids, numbered export names |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Order Is Batch Order
//!
//! Normalizations complete in any order, but results are merged by their
//! position in the batch. A user who drops `A, B, C` sees `A, B, C` even when
//! `C` is tiny and `A` is a 40-megapixel photo.
//!
//! ## Truncate, Don't Refuse
//!
//! A batch that exceeds the item limit is cut at the limit. The overflow goes
//! to the rejection ledger with a reason; the rest of the batch is accepted.
//!
//! ## Handles Are Owned
//!
//! A preview [`handle::ResourceHandle`] is released by consuming it, and
//! dropping it releases it too. Items own their handles and the collection
//! owns its items, so removal, replacement, overflow, and teardown each
//! release exactly once without bookkeeping at the call sites.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling, and JPEG/PNG encoding all use the `image`
//! crate. No system libraries, no external processes.

pub mod candidate;
pub mod collection;
pub mod config;
pub mod drag;
pub mod handle;
pub mod imaging;
pub mod intake;
pub mod ledger;
pub mod naming;
pub mod output;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
