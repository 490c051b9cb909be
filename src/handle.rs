//! Transient renderable handles for accepted files.
//!
//! A [`ResourceHandle`] is the preview reference a UI renders from, the
//! counterpart of a browser object URL. Handles are issued by a
//! [`PreviewRegistry`], which keeps the bytes alive and resolvable while the
//! handle exists.
//!
//! # Lifecycle
//!
//! - [`PreviewRegistry::acquire`] issues a handle and registers its bytes.
//! - [`ResourceHandle::release`] consumes the handle and unregisters them.
//! - Dropping an unreleased handle releases it.
//!
//! Because `release` takes `self`, a handle can be released at most once and
//! cannot be read afterwards. Together with the drop path that gives exactly
//! one release per acquire on every exit path, which the registry counts in
//! [`HandleStats`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

const URL_SCHEME: &str = "preview://";

/// Acquire/release counters for leak checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub acquired: u64,
    pub released: u64,
}

impl HandleStats {
    /// Counters are read independently, so a snapshot taken mid-release
    /// can briefly show more releases than acquires.
    pub fn live(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

impl fmt::Display for HandleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} acquired, {} released, {} live",
            self.acquired,
            self.released,
            self.live()
        )
    }
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
    live: Mutex<HashMap<u64, Arc<[u8]>>>,
}

impl RegistryInner {
    fn release(&self, id: u64) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed.is_some() {
            self.released.fetch_add(1, Ordering::SeqCst);
            trace!(handle = id, "released preview handle");
        }
    }
}

/// Issues and tracks [`ResourceHandle`]s. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<RegistryInner>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and hand out a handle to them.
    pub fn acquire(&self, bytes: Arc<[u8]>) -> ResourceHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, bytes);
        self.inner.acquired.fetch_add(1, Ordering::SeqCst);
        trace!(handle = id, "acquired preview handle");
        ResourceHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Bytes behind a preview URL, while its handle is alive.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        let id: u64 = url.strip_prefix(URL_SCHEME)?.parse().ok()?;
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn stats(&self) -> HandleStats {
        HandleStats {
            acquired: self.inner.acquired.load(Ordering::SeqCst),
            released: self.inner.released.load(Ordering::SeqCst),
        }
    }

    pub fn live_count(&self) -> usize {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// An owned, revocable preview reference. Not `Clone`: one owner, one release.
pub struct ResourceHandle {
    id: u64,
    registry: Arc<RegistryInner>,
}

impl ResourceHandle {
    /// The URL a renderer uses to fetch the preview.
    pub fn url(&self) -> String {
        format!("{URL_SCHEME}{}", self.id)
    }

    /// Release the handle. Equivalent to dropping it, spelled out at the
    /// call sites that own the release.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceHandle").field(&self.url()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(data: &[u8]) -> Arc<[u8]> {
        Arc::from(data)
    }

    #[test]
    fn acquire_registers_bytes() {
        let registry = PreviewRegistry::new();
        let handle = registry.acquire(bytes(b"pixels"));
        assert_eq!(registry.resolve(&handle.url()).as_deref(), Some(&b"pixels"[..]));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(
            registry.stats(),
            HandleStats {
                acquired: 1,
                released: 0
            }
        );
    }

    #[test]
    fn release_unregisters() {
        let registry = PreviewRegistry::new();
        let handle = registry.acquire(bytes(b"pixels"));
        let url = handle.url();
        handle.release();
        assert_eq!(registry.resolve(&url), None);
        assert_eq!(registry.stats().released, 1);
        assert_eq!(registry.stats().live(), 0);
    }

    #[test]
    fn drop_releases_exactly_once() {
        let registry = PreviewRegistry::new();
        {
            let _a = registry.acquire(bytes(b"a"));
            let _b = registry.acquire(bytes(b"b"));
        }
        assert_eq!(
            registry.stats(),
            HandleStats {
                acquired: 2,
                released: 2
            }
        );
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn urls_are_unique() {
        let registry = PreviewRegistry::new();
        let a = registry.acquire(bytes(b"a"));
        let b = registry.acquire(bytes(b"a"));
        assert_ne!(a.url(), b.url());
    }

    #[test]
    fn resolve_rejects_foreign_urls() {
        let registry = PreviewRegistry::new();
        let _h = registry.acquire(bytes(b"a"));
        assert_eq!(registry.resolve("blob:0"), None);
        assert_eq!(registry.resolve("preview://zero"), None);
    }

    #[test]
    fn clones_share_accounting() {
        let registry = PreviewRegistry::new();
        let clone = registry.clone();
        let handle = clone.acquire(bytes(b"a"));
        assert_eq!(registry.live_count(), 1);
        drop(handle);
        assert_eq!(registry.stats().live(), 0);
    }

    #[test]
    fn live_never_underflows() {
        let stats = HandleStats {
            acquired: 1,
            released: 2,
        };
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn stats_display() {
        let stats = HandleStats {
            acquired: 3,
            released: 1,
        };
        assert_eq!(stats.to_string(), "3 acquired, 1 released, 2 live");
    }
}
