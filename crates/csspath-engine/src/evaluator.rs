//! Caller-supplied behaviour for custom pseudo-functions such as `:awesome()`.

use crate::document::{Document, NodeId};
use csspath_core::Argument;
use std::collections::HashMap;
use std::fmt;

/// Filters a candidate node set for a named pseudo-function.
pub trait PseudoEvaluator {
    /// Returns the accepted subset of `candidates`, or `None` when `name` is
    /// not a function this evaluator knows.
    fn filter(
        &self,
        doc: &Document,
        name: &str,
        args: &[Argument],
        candidates: &[NodeId],
    ) -> Option<Vec<NodeId>>;
}

type FilterFn = dyn Fn(&Document, &[Argument], &[NodeId]) -> Vec<NodeId> + Send + Sync;

/// Registry of closures keyed by function name.
#[derive(Default)]
pub struct Functions {
    handlers: HashMap<String, Box<FilterFn>>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&Document, &[Argument], &[NodeId]) -> Vec<NodeId> + Send + Sync + 'static,
    {
        self.register(name, filter);
        self
    }

    pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Document, &[Argument], &[NodeId]) -> Vec<NodeId> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(filter));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functions")
            .field("names", &self.names())
            .finish()
    }
}

impl PseudoEvaluator for Functions {
    fn filter(
        &self,
        doc: &Document,
        name: &str,
        args: &[Argument],
        candidates: &[NodeId],
    ) -> Option<Vec<NodeId>> {
        self.handlers
            .get(name)
            .map(|handler| handler(doc, args, candidates))
    }
}
