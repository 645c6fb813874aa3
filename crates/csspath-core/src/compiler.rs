use crate::cache::{QueryCache, SelectorCache};
use crate::config::{CacheScope, CompilerConfig};
use crate::parser::parse;
use crate::path::{PathQuery, DEFAULT_PREFIX};
use crate::translator::translate;
use crate::CompileError;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Compiles selectors into path queries through a [`QueryCache`].
#[derive(Clone)]
pub struct Compiler {
    cache: Arc<dyn QueryCache>,
    prefix: String,
}

impl Compiler {
    /// Compiler backed by the process-wide cache.
    pub fn new() -> Self {
        Self::with_cache(SelectorCache::global())
    }

    /// Compiler with a private cache of its own.
    pub fn isolated() -> Self {
        Self::with_cache(Arc::new(SelectorCache::new()))
    }

    pub fn with_cache(cache: Arc<dyn QueryCache>) -> Self {
        Self {
            cache,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Builds a compiler from configuration. For the shared scope this also
    /// sets the enablement flag of the process-wide cache.
    pub fn from_config(config: &CompilerConfig) -> Self {
        let compiler = match config.cache_scope {
            CacheScope::Shared => Self::new(),
            CacheScope::Isolated => Self::isolated(),
        };
        compiler.cache.set_enabled(config.cache_enabled);
        compiler.with_prefix(config.prefix.clone())
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn cache(&self) -> &Arc<dyn QueryCache> {
        &self.cache
    }

    pub fn compile(&self, selector: &str) -> Result<Arc<PathQuery>, CompileError> {
        self.cache.get_or_compute(selector, &compile_uncached)
    }

    pub fn xpath_for(&self, selector: &str) -> Result<String, CompileError> {
        Ok(self.compile(selector)?.to_xpath_with_prefix(&self.prefix))
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("prefix", &self.prefix)
            .field("cache_enabled", &self.cache.is_enabled())
            .field("cache_entries", &self.cache.len())
            .finish()
    }
}

/// Parses and translates a selector without touching any cache.
pub fn compile_uncached(selector: &str) -> Result<PathQuery, CompileError> {
    trace!(selector, "compiling selector");
    let list = parse(selector)?;
    Ok(translate(&list)?)
}

// --- Process-wide shortcuts ---

pub fn compile(selector: &str) -> Result<Arc<PathQuery>, CompileError> {
    Compiler::new().compile(selector)
}

pub fn xpath_for(selector: &str) -> Result<String, CompileError> {
    Compiler::new().xpath_for(selector)
}

pub fn set_cache_enabled(enabled: bool) {
    SelectorCache::global().set_enabled(enabled);
}

pub fn cache_enabled() -> bool {
    SelectorCache::global().is_enabled()
}

pub fn clear_cache() {
    SelectorCache::global().clear();
}
