//! In-memory markup tree.
//!
//! Nodes live in an arena and are numbered in document order, so sorting
//! [`NodeId`]s sorts nodes by their position in the source.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed markup: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Unclosed element <{0}>")]
    Unclosed(String),
    #[error("Unexpected closing tag </{0}>")]
    UnexpectedClose(String),
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    fn empty() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parses well-formed XML or XHTML. Whitespace-only text is dropped;
    /// comments, declarations and processing instructions are skipped.
    pub fn parse_str(markup: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(true);

        let mut doc = Document::empty();
        let mut open = vec![doc.root()];

        loop {
            let current = open[open.len() - 1];
            match reader.read_event()? {
                Event::Start(e) => {
                    let id = doc.append(current, element_kind(&e)?);
                    open.push(id);
                }
                Event::Empty(e) => {
                    doc.append(current, element_kind(&e)?);
                }
                Event::End(e) => {
                    if open.len() == 1 {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        return Err(DocumentError::UnexpectedClose(name));
                    }
                    open.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    if !text.is_empty() {
                        doc.append(current, NodeKind::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    doc.append(current, NodeKind::Text(text));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if open.len() > 1 {
            let unclosed = open[open.len() - 1];
            let name = doc.name(unclosed).unwrap_or_default().to_string();
            return Err(DocumentError::Unclosed(name));
        }

        Ok(doc)
    }

    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    /// The document node, parent of the root element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.element_children(self.root()).next()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root()).children.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Element name; `None` for text and the document node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
    }

    /// All descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of the node and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        if let NodeKind::Text(text) = &self.node(id).kind {
            return text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| match &self.node(node).kind {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self.element_children(parent).collect(),
            None => Vec::new(),
        }
    }

    pub fn preceding_element_count(&self, id: NodeId) -> usize {
        self.element_siblings(id)
            .iter()
            .take_while(|sibling| **sibling != id)
            .count()
    }

    pub fn following_element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.element_siblings(id)
            .into_iter()
            .skip_while(|sibling| *sibling != id)
            .skip(1)
            .collect()
    }

    pub fn following_element_count(&self, id: NodeId) -> usize {
        self.following_element_siblings(id).len()
    }

    /// Element siblings before `id` with the same name.
    pub fn preceding_same_name_count(&self, id: NodeId) -> usize {
        let name = self.name(id);
        self.element_siblings(id)
            .into_iter()
            .take_while(|sibling| *sibling != id)
            .filter(|sibling| self.name(*sibling) == name)
            .count()
    }

    pub fn following_same_name_count(&self, id: NodeId) -> usize {
        let name = self.name(id);
        self.following_element_siblings(id)
            .into_iter()
            .filter(|sibling| self.name(*sibling) == name)
            .count()
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.following_element_siblings(id).into_iter().next()
    }
}

fn element_kind(start: &BytesStart<'_>) -> Result<NodeKind, DocumentError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(NodeKind::Element { name, attributes })
}
