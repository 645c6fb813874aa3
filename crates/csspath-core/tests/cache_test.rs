use csspath_core::cache::{Compute, QueryCache, SelectorCache};
use csspath_core::{CompileError, Compiler, PathQuery};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SELECTOR: &str = "a1 > b2 > c3";

/// Counts how many lookups reach the compiler before delegating to the wrapped cache.
struct CountingCache<C> {
    inner: C,
    compiles: AtomicUsize,
}

impl<C: QueryCache> CountingCache<C> {
    fn new(inner: C) -> Self {
        Self {
            inner,
            compiles: AtomicUsize::new(0),
        }
    }

    fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl<C: QueryCache> QueryCache for CountingCache<C> {
    fn get_or_compute(
        &self,
        selector: &str,
        compute: Compute<'_>,
    ) -> Result<Arc<PathQuery>, CompileError> {
        let counted = |s: &str| {
            self.compiles.fetch_add(1, Ordering::SeqCst);
            compute(s)
        };
        self.inner.get_or_compute(selector, &counted)
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn set_enabled(&self, enabled: bool) {
        self.inner.set_enabled(enabled)
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

fn counting_compilers() -> (Arc<CountingCache<SelectorCache>>, Compiler, Compiler) {
    let cache = Arc::new(CountingCache::new(SelectorCache::new()));
    let first = Compiler::with_cache(cache.clone());
    let second = Compiler::with_cache(cache.clone());
    (cache, first, second)
}

/// Restores the process-wide cache to its initial state.
fn reset_global() {
    csspath_core::clear_cache();
    csspath_core::set_cache_enabled(true);
}

#[test]
fn test_cache_enabled_compiles_once() {
    let (cache, first, second) = counting_compilers();
    assert!(cache.is_enabled());

    first.xpath_for(SELECTOR).unwrap();
    first.xpath_for(SELECTOR).unwrap();
    second.xpath_for(SELECTOR).unwrap();
    second.xpath_for(SELECTOR).unwrap();

    assert_eq!(cache.compiles(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_cache_disabled_compiles_every_time() {
    let (cache, first, second) = counting_compilers();
    cache.set_enabled(false);

    first.xpath_for(SELECTOR).unwrap();
    first.xpath_for(SELECTOR).unwrap();
    second.xpath_for(SELECTOR).unwrap();
    second.xpath_for(SELECTOR).unwrap();

    assert_eq!(cache.compiles(), 4);
    assert!(cache.is_empty());
}

#[test]
fn test_clear_forces_one_fresh_compile() {
    let (cache, first, _) = counting_compilers();
    first.compile(SELECTOR).unwrap();
    cache.clear();
    assert!(cache.is_empty());

    first.compile(SELECTOR).unwrap();
    first.compile(SELECTOR).unwrap();
    assert_eq!(cache.compiles(), 2);
}

#[test]
fn test_toggling_keeps_earlier_entries() {
    let (cache, first, _) = counting_compilers();
    let original = first.compile(SELECTOR).unwrap();

    cache.set_enabled(false);
    let uncached = first.compile(SELECTOR).unwrap();
    assert!(!Arc::ptr_eq(&original, &uncached));
    assert_eq!(original, uncached);

    cache.set_enabled(true);
    let restored = first.compile(SELECTOR).unwrap();
    assert!(Arc::ptr_eq(&original, &restored));
    assert_eq!(cache.compiles(), 2);
}

#[test]
fn test_failed_compile_is_not_cached() {
    let (cache, first, _) = counting_compilers();
    assert!(first.compile("div >").is_err());
    assert!(first.compile("div >").is_err());
    assert_eq!(cache.compiles(), 2);
    assert!(cache.is_empty());
}

#[test]
fn test_isolated_compilers_do_not_share() {
    let first = Compiler::isolated();
    let second = Compiler::isolated();
    first.compile(SELECTOR).unwrap();
    assert_eq!(first.cache().len(), 1);
    assert!(second.cache().is_empty());
}

#[test]
#[serial]
fn test_global_cache_shared_by_compilers() {
    reset_global();

    csspath_core::xpath_for(SELECTOR).unwrap();
    Compiler::new().xpath_for(SELECTOR).unwrap();
    let first = Compiler::new().compile(SELECTOR).unwrap();
    let second = csspath_core::compile(SELECTOR).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(SelectorCache::global().contains(SELECTOR));
    assert_eq!(SelectorCache::global().len(), 1);

    reset_global();
}

#[test]
#[serial]
fn test_global_cache_toggle() {
    reset_global();
    assert!(csspath_core::cache_enabled());

    csspath_core::set_cache_enabled(false);
    assert!(!Compiler::new().cache().is_enabled());
    csspath_core::xpath_for(SELECTOR).unwrap();
    assert!(SelectorCache::global().is_empty());

    csspath_core::set_cache_enabled(true);
    csspath_core::xpath_for(SELECTOR).unwrap();
    assert_eq!(SelectorCache::global().len(), 1);

    csspath_core::clear_cache();
    assert!(SelectorCache::global().is_empty());

    reset_global();
}

#[test]
fn test_concurrent_first_lookup_compiles_once() {
    let (cache, compiler, _) = counting_compilers();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            let compiler = compiler.clone();
            scope.spawn(move || compiler.compile(SELECTOR).unwrap());
        }
    });
    assert_eq!(cache.compiles(), 1);
}
