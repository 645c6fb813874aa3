use crate::document::{Document, NodeId};
use crate::evaluator::PseudoEvaluator;
use csspath_core::path::{Axis, LocationPath, PathStep, PositionTest, Predicate};
use csspath_core::{Argument, CompileError, PathQuery};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("Unsupported pseudo-function :{0}(): no evaluator handles it")]
    Unsupported(String),
    #[error("Node {0:?} does not belong to this document")]
    UnknownNode(NodeId),
}

/// Runs compiled path queries against a [`Document`].
///
/// Each step maps every context node to groups of candidates (one group per
/// parent for descendant steps), filters each group through the step's
/// predicates in order, and merges the survivors in document order.
pub struct QueryExecutor<'a> {
    doc: &'a Document,
    evaluator: Option<&'a dyn PseudoEvaluator>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            evaluator: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: &'a dyn PseudoEvaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Matches of every branch of `query`, de-duplicated, in document order.
    pub fn execute(&self, query: &PathQuery, context: NodeId) -> Result<Vec<NodeId>, QueryError> {
        if !self.doc.contains(context) {
            return Err(QueryError::UnknownNode(context));
        }
        let mut matches = BTreeSet::new();
        for path in &query.paths {
            matches.extend(self.execute_path(path, context)?);
        }
        trace!(matches = matches.len(), "query executed");
        Ok(matches.into_iter().collect())
    }

    fn execute_path(&self, path: &LocationPath, context: NodeId) -> Result<Vec<NodeId>, QueryError> {
        let mut current = vec![context];
        for step in &path.steps {
            let mut next = BTreeSet::new();
            for &node in &current {
                for group in self.candidate_groups(step, node) {
                    next.extend(self.apply_predicates(step, group)?);
                }
            }
            if next.is_empty() {
                return Ok(Vec::new());
            }
            current = next.into_iter().collect();
        }
        Ok(current)
    }

    fn candidate_groups(&self, step: &PathStep, node: NodeId) -> Vec<Vec<NodeId>> {
        let doc = self.doc;
        let passes = |id: &NodeId| doc.name(*id).is_some_and(|name| step.test.matches(name));

        match step.axis {
            Axis::Child => vec![doc.element_children(node).filter(passes).collect()],
            Axis::Descendant => std::iter::once(node)
                .chain(doc.descendants(node))
                .map(|scope| doc.element_children(scope).filter(passes).collect::<Vec<_>>())
                .filter(|group| !group.is_empty())
                .collect(),
            Axis::FollowingSibling => vec![
                doc.following_element_siblings(node)
                    .into_iter()
                    .filter(passes)
                    .collect(),
            ],
            Axis::NextSibling => vec![doc.next_element_sibling(node).into_iter().filter(passes).collect()],
        }
    }

    fn apply_predicates(&self, step: &PathStep, mut nodes: Vec<NodeId>) -> Result<Vec<NodeId>, QueryError> {
        for predicate in &step.predicates {
            if nodes.is_empty() {
                break;
            }
            nodes = self.filter(predicate, nodes)?;
        }
        Ok(nodes)
    }

    fn filter(&self, predicate: &Predicate, nodes: Vec<NodeId>) -> Result<Vec<NodeId>, QueryError> {
        if let Predicate::Custom { name, args } = predicate {
            return self.custom(name, args, &nodes);
        }

        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            if self.matches(predicate, node, i + 1, size)? {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    fn custom(&self, name: &str, args: &[Argument], candidates: &[NodeId]) -> Result<Vec<NodeId>, QueryError> {
        let unsupported = || QueryError::Unsupported(name.to_string());
        let evaluator = self.evaluator.ok_or_else(unsupported)?;
        let accepted = evaluator
            .filter(self.doc, name, args, candidates)
            .ok_or_else(unsupported)?;
        Ok(candidates
            .iter()
            .copied()
            .filter(|node| accepted.contains(node))
            .collect())
    }

    /// Tests one node; `position` is 1-based within a group of `size` nodes.
    fn matches(&self, predicate: &Predicate, node: NodeId, position: usize, size: usize) -> Result<bool, QueryError> {
        let doc = self.doc;
        let matched = match predicate {
            Predicate::Attribute { name, test } => test.matches(doc.attribute(node, name)),
            Predicate::Class(class) => doc
                .attribute(node, "class")
                .is_some_and(|value| value.split_whitespace().any(|word| word == class)),
            Predicate::Position(test) => self.position_matches(test, node, position, size),
            Predicate::Empty => doc.children(node).is_empty(),
            Predicate::HasChildren => !doc.children(node).is_empty(),
            Predicate::ContainsText(text) => doc.text(node).contains(text.as_str()),
            Predicate::Not { test, predicates } => {
                let mut all = doc.name(node).is_some_and(|name| test.matches(name));
                for inner in predicates {
                    if !all {
                        break;
                    }
                    all = self.matches(inner, node, position, size)?;
                }
                !all
            }
            Predicate::Custom { name, args } => !self.custom(name, args, &[node])?.is_empty(),
        };
        Ok(matched)
    }

    fn position_matches(&self, test: &PositionTest, node: NodeId, position: usize, size: usize) -> bool {
        let doc = self.doc;
        match *test {
            PositionTest::FirstChild => doc.preceding_element_count(node) == 0,
            PositionTest::LastChild => doc.following_element_count(node) == 0,
            PositionTest::OnlyChild => {
                doc.preceding_element_count(node) == 0 && doc.following_element_count(node) == 0
            }
            PositionTest::Index(n) => position == n,
            PositionTest::Last => position == size,
            PositionTest::OnlyOfType => {
                doc.preceding_same_name_count(node) == 0 && doc.following_same_name_count(node) == 0
            }
            PositionTest::GreaterThan(n) => position > n,
            PositionTest::LessThan(n) => position < n,
            PositionTest::Nth {
                formula,
                from_end,
                of_type,
            } => {
                let index = match (of_type, from_end) {
                    (false, false) => doc.preceding_element_count(node) + 1,
                    (false, true) => doc.following_element_count(node) + 1,
                    (true, false) => doc.preceding_same_name_count(node) + 1,
                    (true, true) => doc.following_same_name_count(node) + 1,
                };
                formula.matches(index as i64)
            }
        }
    }
}
