//! Rejected candidates and why they were turned away.
//!
//! Entries stay until the user dismisses them; they never take part in
//! ordering or capacity. Iteration is insertion order.

use crate::candidate::RawCandidate;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RejectedItem {
    pub id: String,
    pub raw: RawCandidate,
    pub reasons: Vec<String>,
}

impl RejectedItem {
    pub fn view(&self) -> RejectionView {
        RejectionView {
            id: self.id.clone(),
            filename: self.raw.filename.clone(),
            reasons: self.reasons.clone(),
        }
    }
}

/// Read-only display row for a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionView {
    pub id: String,
    pub filename: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RejectionLedger {
    entries: Vec<RejectedItem>,
}

impl RejectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. An entry with the same id replaces the old one in place.
    pub fn add(&mut self, item: RejectedItem) {
        match self.entries.iter_mut().find(|e| e.id == item.id) {
            Some(existing) => *existing = item,
            None => self.entries.push(item),
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RejectedItem> {
        self.entries.iter()
    }

    pub fn views(&self) -> Vec<RejectionView> {
        self.entries.iter().map(RejectedItem::view).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::candidate;

    fn rejected(id: &str, reason: &str) -> RejectedItem {
        RejectedItem {
            id: id.to_string(),
            raw: candidate(&format!("{id}.txt"), "text/plain"),
            reasons: vec![reason.to_string()],
        }
    }

    #[test]
    fn add_keeps_insertion_order() {
        let mut ledger = RejectionLedger::new();
        ledger.add(rejected("b", "capacity exceeded"));
        ledger.add(rejected("a", "capacity exceeded"));
        let ids: Vec<_> = ledger.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn add_same_id_replaces_in_place() {
        let mut ledger = RejectionLedger::new();
        ledger.add(rejected("a", "first"));
        ledger.add(rejected("b", "other"));
        ledger.add(rejected("a", "second"));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.views()[0].reasons, vec!["second"]);
    }

    #[test]
    fn remove_by_id() {
        let mut ledger = RejectionLedger::new();
        ledger.add(rejected("a", "x"));
        ledger.add(rejected("b", "y"));
        assert!(ledger.remove("a"));
        assert!(!ledger.remove("a"));
        assert_eq!(ledger.views()[0].id, "b");
    }

    #[test]
    fn view_exposes_filename_and_reasons() {
        let mut ledger = RejectionLedger::new();
        ledger.add(rejected("notes", "file type must be image/png"));
        let view = &ledger.views()[0];
        assert_eq!(view.filename, "notes.txt");
        assert_eq!(view.reasons, vec!["file type must be image/png"]);
    }
}
