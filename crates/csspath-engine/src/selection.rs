use crate::document::{Document, NodeId};
use crate::evaluator::PseudoEvaluator;
use crate::executor::{QueryError, QueryExecutor};
use csspath_core::Compiler;

/// Selector queries against one document.
///
/// Compiles through the process-wide cache unless another [`Compiler`] is
/// supplied.
pub struct Selection<'a> {
    doc: &'a Document,
    compiler: Compiler,
    evaluator: Option<&'a dyn PseudoEvaluator>,
}

impl<'a> Selection<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            compiler: Compiler::new(),
            evaluator: None,
        }
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_evaluator(mut self, evaluator: &'a dyn PseudoEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Matches anywhere in the document.
    pub fn css(&self, selector: &str) -> Result<Vec<NodeId>, QueryError> {
        self.css_from(self.doc.root(), selector)
    }

    /// Matches among the descendants of `node`.
    pub fn css_from(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>, QueryError> {
        let query = self.compiler.compile(selector)?;
        let mut executor = QueryExecutor::new(self.doc);
        if let Some(evaluator) = self.evaluator {
            executor = executor.with_evaluator(evaluator);
        }
        executor.execute(&query, node)
    }

    /// Matches of any selector, merged in document order.
    pub fn search(&self, selectors: &[&str]) -> Result<Vec<NodeId>, QueryError> {
        let mut matches = Vec::new();
        for selector in selectors {
            matches.extend(self.css(selector)?);
        }
        matches.sort_unstable();
        matches.dedup();
        Ok(matches)
    }
}

impl Document {
    pub fn select(&self) -> Selection<'_> {
        Selection::new(self)
    }

    pub fn css(&self, selector: &str) -> Result<Vec<NodeId>, QueryError> {
        self.select().css(selector)
    }

    pub fn css_from(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>, QueryError> {
        self.select().css_from(node, selector)
    }
}
