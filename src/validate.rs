//! Candidate classification against the type and capacity policy.
//!
//! [`classify`] is a pure function of the configuration, the batch, and the
//! number of slots already taken. It never touches the collection or the
//! ledger; the controller routes its output.
//!
//! ## Type matching
//!
//! A candidate passes the type check when **either** its MIME type matches
//! an `accepted_types` key (case-insensitive, `image/*` style wildcards
//! allowed) **or** its extension appears in any key's extension list. This
//! is how browser drop zones evaluate an `accept` map, so files with a
//! generic MIME type but the right extension still get through.
//!
//! ## Capacity
//!
//! Type-valid candidates are admitted in batch order until
//! `occupied + admitted == effective_max_items`. The rest are rejected one by
//! one with [`RejectionReason::CapacityExceeded`]; the batch is truncated,
//! never rejected wholesale.
//!
//! The cut happens before normalization. A slot given to a candidate that
//! later fails to normalize is not handed to the next one: with
//! `max_items = 2`, a batch `[A, B, C]` where A fails keeps only `[B]`, and
//! C is rejected as capacity exceeded even though a slot stays free.

use crate::candidate::RawCandidate;
use crate::config::DropConfig;
use std::fmt;

/// Why a candidate ended up in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Neither the MIME type nor the extension is listed.
    TypeNotAccepted { accepted: String },
    /// Every slot is taken.
    CapacityExceeded,
    /// Normalization failed and the config asks for failures to be recorded.
    NormalizationFailed(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeNotAccepted { accepted } => write!(f, "file type must be {accepted}"),
            Self::CapacityExceeded => f.write_str("capacity exceeded"),
            Self::NormalizationFailed(e) => write!(f, "normalization failed: {e}"),
        }
    }
}

/// Output of [`classify`]. Both lists keep batch order.
#[derive(Debug, Default)]
pub struct Classification {
    pub accepted: Vec<RawCandidate>,
    pub rejected: Vec<(RawCandidate, Vec<RejectionReason>)>,
}

/// Split a batch into accepted and rejected candidates.
///
/// `occupied` is the number of slots already used by the collection. In
/// single-file mode the controller passes 0, since a new item replaces the
/// current one.
pub fn classify(
    candidates: Vec<RawCandidate>,
    config: &DropConfig,
    occupied: usize,
) -> Classification {
    let capacity = config.effective_max_items();
    let mut remaining = capacity.saturating_sub(occupied);
    let mut out = Classification::default();

    for candidate in candidates {
        if !type_accepted(&candidate, config) {
            let reason = RejectionReason::TypeNotAccepted {
                accepted: describe_accepted(config),
            };
            out.rejected.push((candidate, vec![reason]));
        } else if remaining == 0 {
            out.rejected
                .push((candidate, vec![RejectionReason::CapacityExceeded]));
        } else {
            remaining -= 1;
            out.accepted.push(candidate);
        }
    }
    out
}

/// Whether a candidate's type or extension is allowed.
pub fn type_accepted(candidate: &RawCandidate, config: &DropConfig) -> bool {
    let mime = candidate.mime_type.to_ascii_lowercase();
    let extension = candidate.extension();

    config.accepted_types.iter().any(|(pattern, extensions)| {
        mime_matches(pattern, &mime)
            || extension
                .as_deref()
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    })
}

fn mime_matches(pattern: &str, mime: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    match pattern.strip_suffix("/*") {
        Some(family) => mime
            .split_once('/')
            .is_some_and(|(candidate_family, _)| candidate_family == family),
        None => pattern == mime,
    }
}

/// `image/jpeg, .jpeg, .jpg, image/png, .png`
fn describe_accepted(config: &DropConfig) -> String {
    config
        .accepted_types
        .iter()
        .flat_map(|(mime, exts)| std::iter::once(mime.as_str()).chain(exts.iter().map(String::as_str)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::candidate;
    use std::collections::BTreeMap;

    fn names(list: &[RawCandidate]) -> Vec<&str> {
        list.iter().map(|c| c.filename.as_str()).collect()
    }

    #[test]
    fn accepts_listed_types() {
        let config = DropConfig::default();
        let batch = vec![
            candidate("a.jpg", "image/jpeg"),
            candidate("b.png", "image/png"),
        ];
        let out = classify(batch, &config, 0);
        assert_eq!(names(&out.accepted), vec!["a.jpg", "b.png"]);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn rejects_unlisted_type() {
        let config = DropConfig::default();
        let out = classify(vec![candidate("doc.pdf", "application/pdf")], &config, 0);
        assert!(out.accepted.is_empty());
        let (rejected, reasons) = &out.rejected[0];
        assert_eq!(rejected.filename, "doc.pdf");
        assert_eq!(
            reasons[0].to_string(),
            "file type must be image/jpeg, .jpeg, .jpg, image/png, .png"
        );
    }

    #[test]
    fn extension_match_rescues_generic_mime() {
        let config = DropConfig::default();
        let out = classify(
            vec![candidate("scan.JPG", "application/octet-stream")],
            &config,
            0,
        );
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn mime_match_without_extension() {
        let config = DropConfig::default();
        let out = classify(vec![candidate("clipboard", "IMAGE/PNG")], &config, 0);
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn wildcard_mime_pattern() {
        let config = DropConfig {
            accepted_types: BTreeMap::from([("image/*".to_string(), vec![])]),
            ..DropConfig::default()
        };
        let batch = vec![
            candidate("a.webp", "image/webp"),
            candidate("b.txt", "text/plain"),
        ];
        let out = classify(batch, &config, 0);
        assert_eq!(names(&out.accepted), vec!["a.webp"]);
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn batch_truncated_at_capacity() {
        let config = DropConfig {
            max_items: 2,
            ..DropConfig::default()
        };
        let batch = vec![
            candidate("a.jpg", "image/jpeg"),
            candidate("b.jpg", "image/jpeg"),
            candidate("c.jpg", "image/jpeg"),
        ];
        let out = classify(batch, &config, 0);
        assert_eq!(names(&out.accepted), vec!["a.jpg", "b.jpg"]);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].0.filename, "c.jpg");
        assert_eq!(out.rejected[0].1, vec![RejectionReason::CapacityExceeded]);
    }

    #[test]
    fn occupied_slots_count_against_capacity() {
        let config = DropConfig {
            max_items: 3,
            ..DropConfig::default()
        };
        let batch = vec![
            candidate("a.jpg", "image/jpeg"),
            candidate("b.jpg", "image/jpeg"),
        ];
        let out = classify(batch, &config, 2);
        assert_eq!(names(&out.accepted), vec!["a.jpg"]);
        assert_eq!(out.rejected[0].1[0].to_string(), "capacity exceeded");
    }

    #[test]
    fn type_rejections_do_not_consume_capacity() {
        let config = DropConfig {
            max_items: 1,
            ..DropConfig::default()
        };
        let batch = vec![
            candidate("notes.txt", "text/plain"),
            candidate("a.png", "image/png"),
        ];
        let out = classify(batch, &config, 0);
        assert_eq!(names(&out.accepted), vec!["a.png"]);
        assert!(matches!(
            out.rejected[0].1[0],
            RejectionReason::TypeNotAccepted { .. }
        ));
    }

    #[test]
    fn single_mode_admits_one() {
        let config = DropConfig {
            allow_multiple: false,
            max_items: 10,
            ..DropConfig::default()
        };
        let batch = vec![
            candidate("a.jpg", "image/jpeg"),
            candidate("b.jpg", "image/jpeg"),
        ];
        let out = classify(batch, &config, 0);
        assert_eq!(names(&out.accepted), vec!["a.jpg"]);
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn overfull_collection_admits_nothing() {
        let config = DropConfig {
            max_items: 2,
            ..DropConfig::default()
        };
        let out = classify(vec![candidate("a.jpg", "image/jpeg")], &config, 5);
        assert!(out.accepted.is_empty());
        assert_eq!(out.rejected.len(), 1);
    }
}
