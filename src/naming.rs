//! Filename conventions shared by intake and export.
//!
//! ## Identifiers
//!
//! Accepted items and rejected entries get ids built from the filename, the
//! batch timestamp, and a per-controller sequence number:
//!
//! - `holiday.jpg` accepted → `holiday-1718000000000-0`
//! - `notes.txt` rejected   → `notes.txt-1718000000000-1`
//!
//! Accepted ids drop the extension; ledger ids keep the full name so two
//! rejected files that differ only by extension stay distinguishable.
//!
//! ## Export Names
//!
//! The CLI writes the ordered collection as `NNN-name` files, the same
//! numeric-prefix convention used for ordering content on disk. An existing
//! prefix on the source name is replaced, never stacked:
//! - position 0, `dawn.jpg`     → `001-dawn.jpg`
//! - position 4, `020-dusk.jpg` → `005-dusk.jpg`

/// Result of parsing a numbered entry name like `020-My-Best-Photos`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `20` from `020-My-Best-Photos`)
    pub number: Option<u32>,
    /// Name part after `NNN-`. For unnumbered entries, this is the full input.
    pub name: String,
}

/// Parse an entry name following the `NNN-name` convention.
///
/// - `"020-My-Best-Photos"` → number=Some(20), name="My-Best-Photos"
/// - `"001"` → number=Some(1), name=""
/// - `"wip-drafts"` → number=None, name="wip-drafts"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some(dash_pos) = name.find('-') {
        let prefix = &name[..dash_pos];
        if let Ok(num) = prefix.parse::<u32>() {
            return ParsedName {
                number: Some(num),
                name: name[dash_pos + 1..].to_string(),
            };
        }
    }
    if let Ok(num) = name.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            name: String::new(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
    }
}

/// Strip the final extension: `a.b.jpg` → `a.b`, `README` → `README`.
///
/// A leading dot is not an extension separator (`.hidden` stays as is).
pub fn strip_file_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < filename.len() && !filename[pos + 1..].contains('/') => {
            &filename[..pos]
        }
        _ => filename,
    }
}

/// Lowercased extension including the dot (`Photo.JPG` → `.jpg`).
pub fn file_extension(filename: &str) -> Option<String> {
    let stem = strip_file_extension(filename);
    if stem.len() == filename.len() {
        return None;
    }
    Some(filename[stem.len()..].to_lowercase())
}

/// Id for an accepted item.
pub fn item_id(filename: &str, millis: u128, seq: u64) -> String {
    format!("{}-{millis}-{seq}", strip_file_extension(filename))
}

/// Id for a rejection ledger entry.
pub fn rejection_id(filename: &str, millis: u128, seq: u64) -> String {
    format!("{filename}-{millis}-{seq}")
}

/// Export name for the item at `position` (0-based).
pub fn numbered_filename(position: usize, filename: &str) -> String {
    let parsed = parse_entry_name(filename);
    let name = if parsed.number.is_some() && !parsed.name.is_empty() {
        parsed.name
    } else {
        filename.to_string()
    };
    format!("{:03}-{name}", position + 1)
}
