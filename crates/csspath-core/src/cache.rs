//! Memoization of compiled selectors.
//!
//! Entries are keyed by the exact selector text and live until [`QueryCache::clear`].
//! There is no eviction, size bound or expiry.

use crate::path::PathQuery;
use crate::CompileError;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Compiles one selector. Handed to [`QueryCache::get_or_compute`] on a miss.
pub type Compute<'a> = &'a dyn Fn(&str) -> Result<PathQuery, CompileError>;

lazy_static! {
    static ref GLOBAL_CACHE: Arc<SelectorCache> = Arc::new(SelectorCache::new());
}

/// Lookup-or-compute storage for compiled selectors.
///
/// Implementations must be shareable across threads; compilers hold them as
/// `Arc<dyn QueryCache>`.
pub trait QueryCache: Send + Sync {
    /// Returns the stored query for `selector`, or runs `compute` and stores
    /// its result. A failed compute stores nothing.
    fn get_or_compute(
        &self,
        selector: &str,
        compute: Compute<'_>,
    ) -> Result<Arc<PathQuery>, CompileError>;

    /// Removes every entry, whether or not the cache is enabled.
    fn clear(&self);

    /// While disabled every lookup computes; stored entries are kept.
    fn set_enabled(&self, enabled: bool);

    fn is_enabled(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct SelectorCache {
    entries: Mutex<HashMap<String, Arc<PathQuery>>>,
    enabled: AtomicBool,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            enabled: AtomicBool::new(true),
        }
    }

    /// The process-wide cache shared by every [`Compiler::new`](crate::Compiler::new).
    pub fn global() -> Arc<SelectorCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.entries().contains_key(selector)
    }

    // A panic while compiling cannot leave a half-written entry behind, so a
    // poisoned map is still consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<PathQuery>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache for SelectorCache {
    fn get_or_compute(
        &self,
        selector: &str,
        compute: Compute<'_>,
    ) -> Result<Arc<PathQuery>, CompileError> {
        if !self.is_enabled() {
            debug!(selector, "selector cache disabled");
            return compute(selector).map(Arc::new);
        }

        // The lock is held across compute so concurrent first lookups of the
        // same selector compile it once.
        let mut entries = self.entries();
        if let Some(query) = entries.get(selector) {
            debug!(selector, "selector cache hit");
            return Ok(Arc::clone(query));
        }

        debug!(selector, "selector cache miss");
        let query = Arc::new(compute(selector)?);
        entries.insert(selector.to_string(), Arc::clone(&query));
        Ok(query)
    }

    fn clear(&self) {
        let mut entries = self.entries();
        debug!(entries = entries.len(), "clearing selector cache");
        entries.clear();
    }

    fn set_enabled(&self, enabled: bool) {
        debug!(enabled, "selector cache toggled");
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParseError;

    fn empty_query(_: &str) -> Result<PathQuery, CompileError> {
        Ok(PathQuery { paths: vec![] })
    }

    #[test]
    fn test_failed_compute_is_not_stored() {
        let cache = SelectorCache::new();
        let failing = |_: &str| -> Result<PathQuery, CompileError> {
            Err(CompileError::Syntax(ParseError::InvalidInteger {
                text: "x".into(),
                position: 0,
            }))
        };
        assert!(cache.get_or_compute("bad", &failing).is_err());
        assert!(cache.is_empty());
        assert!(!cache.contains("bad"));
    }

    #[test]
    fn test_hit_returns_same_entry() {
        let cache = SelectorCache::new();
        let first = cache.get_or_compute("p", &empty_query).unwrap();
        let second = cache.get_or_compute("p", &empty_query).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_disabled_cache_leaves_entries() {
        let cache = SelectorCache::new();
        cache.get_or_compute("p", &empty_query).unwrap();
        cache.set_enabled(false);
        cache.get_or_compute("a", &empty_query).unwrap();
        assert!(cache.contains("p"));
        assert!(!cache.contains("a"));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_enabled());
    }
}
