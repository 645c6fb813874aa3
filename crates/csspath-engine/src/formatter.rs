use crate::document::{Document, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Xpath,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "xpath" => Ok(OutputFormat::Xpath),
            other => Err(format!("unknown output format '{}' (expected text, json or xpath)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Xpath => "xpath",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub node: usize,
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

pub fn summarize(doc: &Document, nodes: &[NodeId]) -> Vec<MatchSummary> {
    nodes
        .iter()
        .map(|&node| MatchSummary {
            node: node.index(),
            name: doc.name(node).unwrap_or_default().to_string(),
            attributes: doc.attributes(node).iter().cloned().collect(),
            text: doc.text(node).trim().to_string(),
        })
        .collect()
}

/// Renders matches; `Xpath` output is produced by the caller and never reaches here.
pub fn format_matches(
    doc: &Document,
    nodes: &[NodeId],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    let summaries = summarize(doc, nodes);
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&summaries),
        OutputFormat::Text | OutputFormat::Xpath => Ok(format_text(&summaries)),
    }
}

fn format_text(summaries: &[MatchSummary]) -> String {
    if summaries.is_empty() {
        return "(no matches)".to_string();
    }
    summaries
        .iter()
        .map(|m| {
            let attrs: String = m
                .attributes
                .iter()
                .map(|(k, v)| format!(" {}=\"{}\"", k, v))
                .collect();
            if m.text.is_empty() {
                format!("<{}{}>", m.name, attrs)
            } else {
                format!("<{}{}>: {}", m.name, attrs, m.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
