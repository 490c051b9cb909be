//! Batch intake: validate, normalize concurrently, merge, notify.
//!
//! [`IntakeController`] is the single entry point for every mutation of the
//! accepted collection and the rejection ledger. It is cheap to clone; clones
//! share one collection, so a UI thread and an async drop handler can both
//! hold it.
//!
//! # Ingest
//!
//! ```text
//! candidates ──classify──▶ accepted ──spawn per candidate──▶ normalize (bounded)
//!      │                                                        │
//!      └──────▶ rejected ─────────┐                    join_all (batch order)
//!                                 ▼                             ▼
//!                              ledger ◀── overflow ◀── collection.append(cap)
//!                                                               │
//!                                                        sink.on_change
//! ```
//!
//! Nothing is published until every normalization in the batch has settled.
//! Results are merged by original batch position, never completion order.
//!
//! # Serialization
//!
//! Collection and ledger live behind one mutex. Each mutation (`ingest`'s
//! merge step, `remove`, `reorder`, `finish_drag`, `teardown`) holds it for
//! its whole duration, including the sink callback. Sinks therefore must not
//! call back into the controller.
//!
//! # Teardown
//!
//! [`IntakeController::teardown`] releases every handle and makes the
//! controller inert. Normalizations already in flight run to completion on
//! their own tasks; their results, and the handles acquired for them, are
//! dropped when the batch finds the controller torn down.

use crate::candidate::RawCandidate;
use crate::collection::{FileItem, FileView, OrderedCollection, Reorder, ReorderError};
use crate::config::{ConfigError, DropConfig, effective_concurrency};
use crate::drag::{DragOutcome, DragReorderSession};
use crate::handle::{PreviewRegistry, ResourceHandle};
use crate::imaging::{Constraints, NormalizedFile, TransformError, Transformer, normalize_or_pass_through};
use crate::ledger::{RejectedItem, RejectionLedger, RejectionView};
use crate::naming::{item_id, rejection_id};
use crate::validate::{self, RejectionReason};
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Payload of a change notification.
///
/// Serializes as the bare list in multi-file mode and as the single item
/// (or `null`) in single-file mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Snapshot {
    Many(Vec<FileView>),
    Single(Option<FileView>),
}

impl Snapshot {
    /// Items in order, whichever shape the snapshot has.
    pub fn items(&self) -> &[FileView] {
        match self {
            Self::Many(items) => items,
            Self::Single(item) => item.as_slice(),
        }
    }
}

/// External consumer of collection changes.
pub trait ChangeSink: Send + Sync {
    fn on_change(&self, snapshot: Snapshot);
}

impl<F> ChangeSink for F
where
    F: Fn(Snapshot) + Send + Sync,
{
    fn on_change(&self, snapshot: Snapshot) {
        self(snapshot)
    }
}

/// Per-thumbnail drag state handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailContext {
    pub index: usize,
    /// This item is the one being dragged.
    pub is_dragged: bool,
    /// The dragged item would land here.
    pub is_placeholder: bool,
}

/// Pluggable thumbnail rendering. The controller never inspects the output.
pub trait RenderThumbnail {
    type Output;

    fn render(&self, item: &FileView, ctx: &ThumbnailContext) -> Self::Output;
}

/// What one `ingest` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Ids of items added to the collection, in batch order.
    pub accepted: Vec<String>,
    /// Ledger entries added by this batch.
    pub rejected: usize,
    /// Candidates whose normalization failed.
    pub failed: usize,
}

/// Result of one per-candidate normalization task.
enum Settled {
    Ready {
        candidate: RawCandidate,
        normalized: NormalizedFile,
        handle: ResourceHandle,
    },
    Failed {
        candidate: RawCandidate,
        error: TransformError,
    },
}

struct State {
    collection: OrderedCollection,
    ledger: RejectionLedger,
    torn_down: bool,
}

#[derive(Clone)]
pub struct IntakeController {
    config: Arc<DropConfig>,
    transformer: Arc<dyn Transformer>,
    sink: Arc<dyn ChangeSink>,
    registry: PreviewRegistry,
    limiter: Arc<Semaphore>,
    seq: Arc<AtomicU64>,
    state: Arc<Mutex<State>>,
}

impl IntakeController {
    /// Build a controller. The config is validated once here and then frozen.
    pub fn new(
        config: DropConfig,
        transformer: Arc<dyn Transformer>,
        sink: Arc<dyn ChangeSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let permits = effective_concurrency(&config);
        Ok(Self {
            config: Arc::new(config),
            transformer,
            sink,
            registry: PreviewRegistry::new(),
            limiter: Arc::new(Semaphore::new(permits)),
            seq: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(State {
                collection: OrderedCollection::new(),
                ledger: RejectionLedger::new(),
                torn_down: false,
            })),
        })
    }

    pub fn config(&self) -> &DropConfig {
        &self.config
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn constraints(&self) -> Constraints {
        Constraints {
            max_dimension: self.config.max_dimension,
            options: self.config.normalize.options.clone(),
        }
    }

    fn snapshot_of(&self, collection: &OrderedCollection) -> Snapshot {
        if self.config.allow_multiple {
            Snapshot::Many(collection.views())
        } else {
            Snapshot::Single(collection.first().map(FileItem::view))
        }
    }

    /// Process one drop or selection event.
    ///
    /// Suspends until every accepted candidate has been normalized or has
    /// failed, then merges the batch and notifies the sink exactly once.
    pub async fn ingest(&self, candidates: Vec<RawCandidate>) -> IngestReport {
        let millis = now_millis();
        let batch_len = candidates.len();

        let classification = {
            let state = self.lock();
            if state.torn_down {
                debug!(batch_len, "controller torn down, ignoring batch");
                return IngestReport::default();
            }
            // A single-mode drop replaces the current item rather than
            // competing with it for the one slot.
            let occupied = if self.config.allow_multiple {
                state.collection.len()
            } else {
                0
            };
            validate::classify(candidates, &self.config, occupied)
        };
        for (candidate, reasons) in &classification.rejected {
            debug!(filename = %candidate.filename, reasons = ?reasons, "candidate rejected");
        }

        let constraints = Arc::new(self.constraints());
        let enabled = self.config.normalize.enabled;
        // Kept so a panicked task can still be accounted for.
        let originals: Vec<RawCandidate> = classification.accepted.clone();
        let tasks = classification.accepted.into_iter().map(|candidate| {
            let transformer = Arc::clone(&self.transformer);
            let limiter = Arc::clone(&self.limiter);
            let registry = self.registry.clone();
            let constraints = Arc::clone(&constraints);
            tokio::spawn(async move {
                // The semaphore is never closed, so acquisition cannot fail.
                let _permit = limiter.acquire_owned().await.ok();
                match normalize_or_pass_through(
                    transformer.as_ref(),
                    &candidate,
                    &constraints,
                    enabled,
                )
                .await
                {
                    Ok(normalized) => {
                        let handle = registry.acquire(Arc::clone(&normalized.bytes));
                        Settled::Ready {
                            candidate,
                            normalized,
                            handle,
                        }
                    }
                    Err(error) => Settled::Failed { candidate, error },
                }
            })
        });
        let settled = join_all(tasks).await;

        let mut state = self.lock();
        if state.torn_down {
            debug!(batch_len, "controller torn down mid-batch, discarding results");
            return IngestReport::default();
        }

        let mut report = IngestReport::default();
        let mut entries: Vec<(RawCandidate, Vec<RejectionReason>)> = classification.rejected;
        let mut ready = Vec::new();

        for (outcome, original) in settled.into_iter().zip(originals) {
            match outcome {
                Ok(Settled::Ready {
                    candidate,
                    normalized,
                    handle,
                }) => {
                    let id = item_id(&candidate.filename, millis, self.next_seq());
                    ready.push(FileItem::new(id, candidate, normalized, handle));
                }
                Ok(Settled::Failed { candidate, error }) => {
                    warn!(filename = %candidate.filename, error = %error, "normalization failed");
                    report.failed += 1;
                    if self.config.normalize.record_failures {
                        entries.push((
                            candidate,
                            vec![RejectionReason::NormalizationFailed(error.to_string())],
                        ));
                    }
                }
                Err(join_error) => {
                    warn!(filename = %original.filename, error = %join_error, "normalization task aborted");
                    report.failed += 1;
                    if self.config.normalize.record_failures {
                        entries.push((
                            original,
                            vec![RejectionReason::NormalizationFailed(join_error.to_string())],
                        ));
                    }
                }
            }
        }

        let ids: Vec<String> = ready.iter().map(|item| item.id.clone()).collect();
        let cap = self.config.effective_max_items();
        let overflow = if self.config.allow_multiple {
            state.collection.append(ready, cap)
        } else if ready.is_empty() {
            Vec::new()
        } else {
            state.collection.replace(ready, cap)
        };
        report.accepted = ids[..ids.len() - overflow.len()].to_vec();
        for item in overflow {
            entries.push((item.into_raw(), vec![RejectionReason::CapacityExceeded]));
        }

        report.rejected = entries.len();
        for (candidate, reasons) in entries {
            let id = rejection_id(&candidate.filename, millis, self.next_seq());
            state.ledger.add(RejectedItem {
                id,
                raw: candidate,
                reasons: reasons.iter().map(ToString::to_string).collect(),
            });
        }

        info!(
            batch_len,
            accepted = report.accepted.len(),
            rejected = report.rejected,
            failed = report.failed,
            size = state.collection.len(),
            "batch settled"
        );
        self.sink.on_change(self.snapshot_of(&state.collection));
        report
    }

    /// Seed the collection with already-normalized files.
    ///
    /// Candidates pass through untouched, capacity still applies, and the
    /// sink is not notified. Returns how many were inserted.
    pub fn preload(&self, candidates: Vec<RawCandidate>) -> usize {
        let millis = now_millis();
        let mut state = self.lock();
        if state.torn_down {
            return 0;
        }
        let items = candidates
            .into_iter()
            .map(|candidate| {
                let normalized = NormalizedFile::pass_through(&candidate);
                let handle = self.registry.acquire(Arc::clone(&normalized.bytes));
                let id = item_id(&candidate.filename, millis, self.next_seq());
                FileItem::new(id, candidate, normalized, handle)
            })
            .collect();
        let before = state.collection.len();
        let overflow = state
            .collection
            .append(items, self.config.effective_max_items());
        if !overflow.is_empty() {
            warn!(dropped = overflow.len(), "preload exceeds capacity");
        }
        state.collection.len() - before
    }

    /// Remove an item, releasing its preview handle. `false` if unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.lock();
        if state.torn_down || !state.collection.remove(id) {
            return false;
        }
        self.sink.on_change(self.snapshot_of(&state.collection));
        true
    }

    /// Move an item between positions and notify if the order changed.
    /// Out-of-range indices leave the collection untouched.
    pub fn reorder(&self, from: usize, to: usize) -> Result<bool, ReorderError> {
        let mut state = self.lock();
        if state.torn_down {
            return Ok(false);
        }
        let changed = state.collection.reorder(from, to).inspect_err(|e| {
            warn!(error = %e, "reorder ignored");
        })?;
        if changed {
            self.sink.on_change(self.snapshot_of(&state.collection));
        }
        Ok(changed)
    }

    /// End a drag gesture, committing it into the collection.
    pub fn finish_drag(&self, session: &mut DragReorderSession) -> DragOutcome {
        let mut state = self.lock();
        if state.torn_down {
            session.cancel();
            return DragOutcome::Cancelled;
        }
        let outcome = session.end(&mut state.collection);
        if let DragOutcome::Committed { .. } = outcome {
            self.sink.on_change(self.snapshot_of(&state.collection));
        }
        outcome
    }

    /// Dismiss a ledger entry. The sink is not notified.
    pub fn dismiss_rejection(&self, id: &str) -> bool {
        self.lock().ledger.remove(id)
    }

    /// Release everything and stop accepting mutations.
    pub fn teardown(&self) {
        let mut state = self.lock();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        let released = state.collection.len();
        state.collection.clear();
        state.ledger.clear();
        info!(released, "intake torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.lock().torn_down
    }

    pub fn len(&self) -> usize {
        self.lock().collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().collection.is_empty()
    }

    /// Find an item by id, by its current filename, or by the filename it
    /// was dropped with (normalization may change the extension).
    pub fn lookup(&self, key: &str) -> Option<FileView> {
        self.lock()
            .collection
            .iter()
            .find(|item| item.id == key || item.normalized.filename == key || item.raw.filename == key)
            .map(FileItem::view)
    }

    pub fn items(&self) -> Vec<FileView> {
        self.lock().collection.views()
    }

    /// The payload the sink would receive right now.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        self.snapshot_of(&state.collection)
    }

    pub fn rejections(&self) -> Vec<RejectionView> {
        self.lock().ledger.views()
    }

    /// Normalized files in collection order.
    pub fn normalized_files(&self) -> Vec<NormalizedFile> {
        self.lock()
            .collection
            .iter()
            .map(|item| item.normalized.clone())
            .collect()
    }

    /// Render every item with its drag context.
    pub fn render_thumbnails<R: RenderThumbnail>(
        &self,
        renderer: &R,
        session: &DragReorderSession,
    ) -> Vec<R::Output> {
        let dragged = session.dragged_index();
        let placeholder = session.placeholder_index();
        self.lock()
            .collection
            .views()
            .iter()
            .enumerate()
            .map(|(index, view)| {
                let ctx = ThumbnailContext {
                    index,
                    is_dragged: dragged == Some(index),
                    is_placeholder: placeholder == Some(index) && dragged != Some(index),
                };
                renderer.render(view, &ctx)
            })
            .collect()
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
