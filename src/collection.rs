//! The authoritative, positionally ordered list of accepted files.
//!
//! [`OrderedCollection`] owns its [`FileItem`]s and, through them, their
//! preview [`ResourceHandle`]s. Every path that takes an item out of the
//! collection goes through [`OrderedCollection::remove`],
//! [`OrderedCollection::clear`], or the overflow returned by
//! [`OrderedCollection::append`], so handle release has a single owner.
//!
//! Positions are dense and 0-based after every mutation: `items[i].position
//! == i` always holds.

use crate::candidate::RawCandidate;
use crate::handle::ResourceHandle;
use crate::imaging::NormalizedFile;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderError {
    #[error("reorder {from} -> {to} out of range for {len} items")]
    InvalidReorderRange { from: usize, to: usize, len: usize },
}

/// An accepted, normalized file.
#[derive(Debug)]
pub struct FileItem {
    pub id: String,
    /// The candidate as dropped.
    pub raw: RawCandidate,
    pub normalized: NormalizedFile,
    handle: ResourceHandle,
    position: usize,
}

impl FileItem {
    pub fn new(
        id: String,
        raw: RawCandidate,
        normalized: NormalizedFile,
        handle: ResourceHandle,
    ) -> Self {
        Self {
            id,
            raw,
            normalized,
            handle,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn preview_url(&self) -> String {
        self.handle.url()
    }

    /// Release the preview handle and keep the raw candidate, for routing an
    /// item that never made it into the collection to the ledger.
    pub fn into_raw(self) -> RawCandidate {
        self.handle.release();
        self.raw
    }

    pub fn view(&self) -> FileView {
        FileView {
            id: self.id.clone(),
            filename: self.normalized.filename.clone(),
            original_filename: self.raw.filename.clone(),
            mime_type: self.normalized.mime_type.clone(),
            position: self.position,
            preview_url: self.handle.url(),
            original_len: self.raw.len(),
            len: self.normalized.len(),
            width: self.normalized.dimensions.map(|d| d.width),
            height: self.normalized.dimensions.map(|d| d.height),
        }
    }
}

/// Read-only snapshot of a [`FileItem`], handed to sinks and renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileView {
    pub id: String,
    pub filename: String,
    /// The name the file was dropped with.
    pub original_filename: String,
    pub mime_type: String,
    pub position: usize,
    pub preview_url: String,
    pub original_len: usize,
    pub len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Anything a drag gesture can commit into.
pub trait Reorder {
    /// Move the item at `from` to `to`. `Ok(true)` if the order changed.
    fn reorder(&mut self, from: usize, to: usize) -> Result<bool, ReorderError>;
}

#[derive(Debug, Default)]
pub struct OrderedCollection {
    items: Vec<FileItem>,
}

impl OrderedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileItem> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&FileItem> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&FileItem> {
        self.items.first()
    }

    pub fn find(&self, id: &str) -> Option<&FileItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn views(&self) -> Vec<FileView> {
        self.items.iter().map(FileItem::view).collect()
    }

    /// Append in order until the collection holds `cap` items.
    ///
    /// Items that do not fit are returned, still holding their handles, so
    /// the caller decides how to retire them.
    pub fn append(&mut self, items: Vec<FileItem>, cap: usize) -> Vec<FileItem> {
        let start = self.items.len();
        let room = cap.saturating_sub(start);
        let mut items = items;
        let overflow = if items.len() > room {
            items.split_off(room)
        } else {
            Vec::new()
        };
        self.items.extend(items);
        self.renumber(start, self.items.len());
        overflow
    }

    /// Replace the whole collection, releasing every current handle first.
    pub fn replace(&mut self, items: Vec<FileItem>, cap: usize) -> Vec<FileItem> {
        self.clear();
        self.append(items, cap)
    }

    /// Remove by id, releasing its handle. `false` if no such item.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        let item = self.items.remove(index);
        debug!(id = %item.id, index, "removed item");
        item.handle.release();
        self.renumber(index, self.items.len());
        true
    }

    /// Release every handle and empty the collection.
    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            item.handle.release();
        }
    }

    fn renumber(&mut self, from: usize, to: usize) {
        for (offset, item) in self.items[from..to].iter_mut().enumerate() {
            item.position = from + offset;
        }
    }
}

impl Reorder for OrderedCollection {
    fn reorder(&mut self, from: usize, to: usize) -> Result<bool, ReorderError> {
        let len = self.items.len();
        if from >= len || to >= len {
            return Err(ReorderError::InvalidReorderRange { from, to, len });
        }
        if from == to {
            return Ok(false);
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.renumber(from.min(to), from.max(to) + 1);
        Ok(true)
    }
}

impl Drop for OrderedCollection {
    fn drop(&mut self) {
        self.clear();
    }
}
