//! CLI output formatting for intake results.
//!
//! # Information-First Display
//!
//! Every accepted file leads with its positional index and filename, with
//! identity and preview details as indented context lines. Rejections lead
//! with the filename and the reasons it was turned away.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! Accepted (2 of 10)
//! 001 dawn.jpg 1024x683, 148.2 KB (from 4.1 MB)
//!     Id: dawn-1700000000000-0
//!     Preview: preview://0
//! 002 mountains.png 800x600, 412.0 KB
//!     Id: mountains-1700000000000-1
//!     Preview: preview://1
//!
//! Rejected
//!     notes.txt: file type must be image/jpeg, .jpeg, .jpg
//! ```
//!
//! ## Change notification
//!
//! ```text
//! ==> Changed: dawn.jpg, mountains.png
//! ==> Changed: (empty)
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 dawn.jpg (image/jpeg) accepted
//!     notes.txt (text/plain) rejected: file type must be image/jpeg, .jpeg, .jpg
//! ```
//!
//! ## Drag
//!
//! ```text
//! 001 dawn.jpg (dragging)
//! 002 mountains.png
//! 003 lake.jpg (drop here)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::collection::FileView;
use crate::handle::HandleStats;
use crate::intake::{RenderThumbnail, Snapshot, ThumbnailContext};
use crate::ledger::RejectionView;
use crate::validate::Classification;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count, binary units with one decimal.
fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Header line for an accepted item.
///
/// ```text
/// 001 dawn.jpg 1024x683, 148.2 KB (from 4.1 MB)
/// 002 notes.png 52 B
/// ```
fn item_header(view: &FileView) -> String {
    let mut details = Vec::new();
    if let (Some(w), Some(h)) = (view.width, view.height) {
        details.push(format!("{w}x{h}"));
    }
    let size = if view.len == view.original_len {
        format_size(view.len)
    } else {
        format!(
            "{} (from {})",
            format_size(view.len),
            format_size(view.original_len)
        )
    };
    details.push(size);
    format!(
        "{} {} {}",
        format_index(view.position + 1),
        view.filename,
        details.join(", ")
    )
}

fn rejection_line(rejection: &RejectionView) -> String {
    format!(
        "{}{}: {}",
        indent(1),
        rejection.filename,
        rejection.reasons.join("; ")
    )
}

// ============================================================================
// Ingest
// ============================================================================

/// Format the collection after an ingest, followed by the ledger.
pub fn format_change(items: &[FileView], capacity: usize) -> Vec<String> {
    let mut lines = vec![format!("Accepted ({} of {})", items.len(), capacity)];
    for view in items {
        lines.push(item_header(view));
        lines.push(format!("{}Id: {}", indent(1), view.id));
        lines.push(format!("{}Preview: {}", indent(1), view.preview_url));
    }
    lines
}

/// Format the rejection ledger. Empty ledger, no lines.
pub fn format_rejections(rejections: &[RejectionView]) -> Vec<String> {
    if rejections.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Rejected".to_string()];
    lines.extend(rejections.iter().map(rejection_line));
    lines
}

/// One line per change notification, listing the new order.
pub fn format_notification(snapshot: &Snapshot) -> String {
    let names: Vec<&str> = snapshot
        .items()
        .iter()
        .map(|v| v.filename.as_str())
        .collect();
    if names.is_empty() {
        "==> Changed: (empty)".to_string()
    } else {
        format!("==> Changed: {}", names.join(", "))
    }
}

pub fn format_stats(stats: &HandleStats) -> String {
    format!("Handles: {stats}")
}

pub fn print_change(items: &[FileView], capacity: usize, rejections: &[RejectionView]) {
    for line in format_change(items, capacity) {
        println!("{}", line);
    }
    for line in format_rejections(rejections) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format a dry-run classification: what would be accepted, what rejected.
pub fn format_check(classification: &Classification) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, candidate) in classification.accepted.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}) accepted",
            format_index(i + 1),
            candidate.filename,
            candidate.mime_type
        ));
    }
    for (candidate, reasons) in &classification.rejected {
        let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
        lines.push(format!(
            "{}{} ({}) rejected: {}",
            indent(1),
            candidate.filename,
            candidate.mime_type,
            reasons.join("; ")
        ));
    }
    lines
}

pub fn print_check(classification: &Classification) {
    for line in format_check(classification) {
        println!("{}", line);
    }
}

// ============================================================================
// Drag
// ============================================================================

/// Plain-text thumbnail: one line per item, marked with its drag role.
pub struct TextThumbnails;

impl RenderThumbnail for TextThumbnails {
    type Output = String;

    fn render(&self, item: &FileView, ctx: &ThumbnailContext) -> String {
        let marker = if ctx.is_dragged {
            " (dragging)"
        } else if ctx.is_placeholder {
            " (drop here)"
        } else {
            ""
        };
        format!("{} {}{}", format_index(ctx.index + 1), item.filename, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::candidate;
    use crate::validate::RejectionReason;

    fn view(filename: &str, position: usize) -> FileView {
        FileView {
            id: format!("{filename}-1-{position}"),
            filename: filename.to_string(),
            original_filename: filename.to_string(),
            mime_type: "image/jpeg".to_string(),
            position,
            preview_url: format!("preview://{position}"),
            original_len: 4 * 1024 * 1024,
            len: 150 * 1024,
            width: Some(1024),
            height: Some(683),
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(52), "52 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(4 * 1024 * 1024), "4.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn item_header_shows_shrinkage() {
        assert_eq!(
            item_header(&view("dawn.jpg", 0)),
            "001 dawn.jpg 1024x683, 150.0 KB (from 4.0 MB)"
        );
    }

    #[test]
    fn item_header_untouched_file() {
        let mut v = view("tiny.png", 1);
        v.len = 52;
        v.original_len = 52;
        v.width = None;
        v.height = None;
        assert_eq!(item_header(&v), "002 tiny.png 52 B");
    }

    // =========================================================================
    // View tests
    // =========================================================================

    #[test]
    fn format_change_lists_items_with_context() {
        let lines = format_change(&[view("dawn.jpg", 0), view("lake.jpg", 1)], 10);
        assert_eq!(lines[0], "Accepted (2 of 10)");
        assert_eq!(lines[1], "001 dawn.jpg 1024x683, 150.0 KB (from 4.0 MB)");
        assert_eq!(lines[2], "    Id: dawn.jpg-1-0");
        assert_eq!(lines[3], "    Preview: preview://0");
        assert!(lines[4].starts_with("002 lake.jpg"));
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn format_change_empty() {
        assert_eq!(format_change(&[], 1), vec!["Accepted (0 of 1)"]);
    }

    #[test]
    fn format_rejections_joins_reasons() {
        let rejections = vec![RejectionView {
            id: "notes.txt-1-0".to_string(),
            filename: "notes.txt".to_string(),
            reasons: vec!["a".to_string(), "b".to_string()],
        }];
        assert_eq!(
            format_rejections(&rejections),
            vec!["", "Rejected", "    notes.txt: a; b"]
        );
        assert!(format_rejections(&[]).is_empty());
    }

    #[test]
    fn format_check_marks_each_candidate() {
        let classification = Classification {
            accepted: vec![candidate("dawn.jpg", "image/jpeg")],
            rejected: vec![(
                candidate("notes.txt", "text/plain"),
                vec![RejectionReason::CapacityExceeded],
            )],
        };
        assert_eq!(
            format_check(&classification),
            vec![
                "001 dawn.jpg (image/jpeg) accepted",
                "    notes.txt (text/plain) rejected: capacity exceeded",
            ]
        );
    }

    #[test]
    fn format_notification_lists_order() {
        let many = Snapshot::Many(vec![view("a.jpg", 0), view("b.jpg", 1)]);
        assert_eq!(format_notification(&many), "==> Changed: a.jpg, b.jpg");
        assert_eq!(
            format_notification(&Snapshot::Single(None)),
            "==> Changed: (empty)"
        );
        assert_eq!(
            format_notification(&Snapshot::Many(Vec::new())),
            "==> Changed: (empty)"
        );
    }

    #[test]
    fn format_stats_line() {
        let stats = HandleStats {
            acquired: 2,
            released: 2,
        };
        assert_eq!(format_stats(&stats), "Handles: 2 acquired, 2 released, 0 live");
    }

    #[test]
    fn text_thumbnails_mark_drag_roles() {
        let renderer = TextThumbnails;
        let item = view("dawn.jpg", 0);
        let plain = ThumbnailContext {
            index: 0,
            is_dragged: false,
            is_placeholder: false,
        };
        assert_eq!(renderer.render(&item, &plain), "001 dawn.jpg");
        let dragged = ThumbnailContext {
            is_dragged: true,
            ..plain
        };
        assert_eq!(renderer.render(&item, &dragged), "001 dawn.jpg (dragging)");
        let target = ThumbnailContext {
            index: 2,
            is_placeholder: true,
            ..plain
        };
        assert_eq!(renderer.render(&item, &target), "003 dawn.jpg (drop here)");
    }
}
