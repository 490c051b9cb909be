//! Raw file candidates offered for intake.
//!
//! A [`RawCandidate`] is what the drop or selection collaborator hands over:
//! a filename, a MIME type, and the bytes. Bytes are shared (`Arc<[u8]>`) so
//! a candidate can be cloned into a normalization task and still be kept
//! for the rejection ledger without copying the file.

use crate::naming::file_extension;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CandidateError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path has no usable file name: {0}")]
    NoFileName(PathBuf),
}

/// A file offered for intake, prior to validation or normalization.
#[derive(Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl RawCandidate {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased extension with its leading dot, if the filename has one.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.filename)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read a file from disk.
    ///
    /// The MIME type is sniffed from the content first and falls back to the
    /// extension; unknown files get `application/octet-stream` and are left
    /// for the validator to reject.
    pub fn from_path(path: &Path) -> Result<Self, CandidateError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CandidateError::NoFileName(path.to_path_buf()))?
            .to_string();
        let bytes = std::fs::read(path).map_err(|source| CandidateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mime_type = sniff_mime_type(&filename, &bytes);
        Ok(Self::new(filename, mime_type, bytes))
    }
}

// Bytes are elided so logging a candidate never dumps a whole image.
impl fmt::Debug for RawCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCandidate")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Content-sniffed MIME type with an extension-table fallback.
pub fn sniff_mime_type(filename: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    let mime = match file_extension(filename).as_deref() {
        Some(".jpg" | ".jpeg") => "image/jpeg",
        Some(".png") => "image/png",
        Some(".webp") => "image/webp",
        Some(".gif") => "image/gif",
        Some(".pdf") => "application/pdf",
        Some(".txt") => "text/plain",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// Expand files and directories into candidates, in argument order.
///
/// Directories are walked recursively with entries sorted by file name so
/// the batch order is stable across platforms. Hidden files are skipped.
pub fn collect_candidates(paths: &[PathBuf]) -> Result<Vec<RawCandidate>, CandidateError> {
    let mut candidates = Vec::new();
    for path in paths {
        if path.is_dir() {
            let walker = WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_file() {
                    candidates.push(RawCandidate::from_path(entry.path())?);
                }
            }
        } else {
            candidates.push(RawCandidate::from_path(path)?);
        }
    }
    Ok(candidates)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use tempfile::TempDir;

    #[test]
    fn extension_is_lowercase() {
        let c = RawCandidate::new("IMG_001.JPG", "image/jpeg", vec![1u8, 2, 3]);
        assert_eq!(c.extension().as_deref(), Some(".jpg"));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn debug_elides_bytes() {
        let c = RawCandidate::new("a.png", "image/png", vec![0u8; 4096]);
        let dbg = format!("{c:?}");
        assert!(dbg.contains("len: 4096"));
        assert!(!dbg.contains("0, 0, 0"));
    }

    #[test]
    fn sniff_prefers_content() {
        // PNG bytes under a .jpg name are still PNG.
        assert_eq!(sniff_mime_type("fake.jpg", &png_bytes(4, 4)), "image/png");
        assert_eq!(sniff_mime_type("photo", &jpeg_bytes(4, 4)), "image/jpeg");
    }

    #[test]
    fn sniff_falls_back_to_extension() {
        assert_eq!(sniff_mime_type("notes.txt", b"hello"), "text/plain");
        assert_eq!(
            sniff_mime_type("blob", b"hello"),
            "application/octet-stream"
        );
    }

    #[test]
    fn collect_walks_directories_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.png"), png_bytes(2, 2)).unwrap();
        std::fs::write(tmp.path().join("a.jpg"), jpeg_bytes(2, 2)).unwrap();
        std::fs::write(tmp.path().join(".DS_Store"), b"junk").unwrap();
        std::fs::create_dir(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("nested/c.txt"), b"text").unwrap();

        let candidates = collect_candidates(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<&str> = candidates.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.txt"]);
        assert_eq!(candidates[0].mime_type, "image/jpeg");
        assert_eq!(candidates[2].mime_type, "text/plain");
    }

    #[test]
    fn collect_keeps_argument_order_for_files() {
        let tmp = TempDir::new().unwrap();
        let z = tmp.path().join("z.png");
        let a = tmp.path().join("a.png");
        std::fs::write(&z, png_bytes(2, 2)).unwrap();
        std::fs::write(&a, png_bytes(2, 2)).unwrap();

        let candidates = collect_candidates(&[z, a]).unwrap();
        assert_eq!(candidates[0].filename, "z.png");
        assert_eq!(candidates[1].filename, "a.png");
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = RawCandidate::from_path(Path::new("/nonexistent/x.png"));
        assert!(matches!(result, Err(CandidateError::Io { .. })));
    }
}
