//! One in-progress drag-to-reorder gesture.
//!
//! ```text
//! Idle ──begin(i)──▶ Dragging { source: i, hover: None }
//!                      │ hover(j)   (repeatable)
//!                      ▼
//!                    Dragging { source: i, hover: Some(j) }
//!                      │ end()
//!          ┌───────────┴───────────┐
//!   hover set and ≠ source     otherwise
//!          ▼                        ▼
//!      Committed                Cancelled
//!          └──────────┬─────────────┘
//!                     ▼
//!                   Idle
//! ```
//!
//! The terminal states are reported by [`DragReorderSession::end`] and the
//! session is back to `Idle` by the time it returns, ready for the next
//! gesture. Calling `begin` while a drag is in progress, or `hover` while
//! idle, is rejected with [`DragError::InvalidDragState`] and changes nothing.

use crate::collection::{Reorder, ReorderError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragError {
    #[error("cannot {op} while {state}")]
    InvalidDragState {
        op: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        source: usize,
        hover: Option<usize>,
    },
}

impl DragState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging { .. } => "dragging",
        }
    }
}

/// How a gesture finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    Committed { from: usize, to: usize },
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DragReorderSession {
    state: DragState,
}

impl DragReorderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Index being dragged, if any.
    pub fn dragged_index(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { source, .. } => Some(source),
            DragState::Idle => None,
        }
    }

    /// Where the dropped item would land: the hover target, or the source
    /// until the pointer has entered another slot.
    pub fn placeholder_index(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { source, hover } => Some(hover.unwrap_or(source)),
            DragState::Idle => None,
        }
    }

    pub fn begin(&mut self, index: usize) -> Result<(), DragError> {
        if self.is_dragging() {
            warn!(index, "drag already in progress, ignoring begin");
            return Err(self.invalid("begin"));
        }
        debug!(index, "drag started");
        self.state = DragState::Dragging {
            source: index,
            hover: None,
        };
        Ok(())
    }

    pub fn hover(&mut self, index: usize) -> Result<(), DragError> {
        if let DragState::Dragging { hover, .. } = &mut self.state {
            *hover = Some(index);
            return Ok(());
        }
        Err(self.invalid("hover"))
    }

    /// Finish the gesture, committing into `target` when it moved.
    ///
    /// A commit whose indices `target` rejects (the list shrank mid-drag)
    /// is reported as `Cancelled`.
    pub fn end(&mut self, target: &mut impl Reorder) -> DragOutcome {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging {
            source,
            hover: Some(hover),
        } = state
        else {
            return DragOutcome::Cancelled;
        };
        if hover == source {
            return DragOutcome::Cancelled;
        }
        match target.reorder(source, hover) {
            Ok(true) => {
                debug!(from = source, to = hover, "drag committed");
                DragOutcome::Committed {
                    from: source,
                    to: hover,
                }
            }
            Ok(false) => DragOutcome::Cancelled,
            Err(ReorderError::InvalidReorderRange { from, to, len }) => {
                warn!(from, to, len, "drag target out of range, cancelled");
                DragOutcome::Cancelled
            }
        }
    }

    /// Abandon the gesture without touching any collection.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    fn invalid(&self, op: &'static str) -> DragError {
        DragError::InvalidDragState {
            op,
            state: self.state.name(),
        }
    }
}
